// Library interface for ridelens
// The binary and the integration tests both go through these modules

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod models;

// Re-export commonly used types for convenience
pub use analysis::{analyze_fit_bytes, analyze_fit_file, perform_comprehensive_analysis, RideAnalyzer};
pub use error::{FitError, Result, RideLensError};
pub use import::{DecodeConfig, FitDecoder};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
