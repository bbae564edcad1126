use crate::error::{FitError, Result};
use crate::models::FitData;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod fit;
pub mod parallel;

pub use fit::{DecodeConfig, FitDecoder, LengthUnit, SpeedUnit, TemperatureUnit};

/// Trait for turning raw activity files into a decoded activity tree
pub trait ActivityDecoder: Send + Sync {
    /// Check if this decoder can handle the given file
    fn can_decode(&self, file_path: &Path) -> bool;

    /// Decode an in-memory file
    fn decode_bytes(&self, bytes: &[u8]) -> Result<FitData>;

    /// Get the format name for this decoder
    fn format_name(&self) -> &'static str;

    /// Read and decode a file from disk
    fn decode_path(&self, file_path: &Path) -> Result<FitData> {
        if !self.can_decode(file_path) {
            return Err(FitError::UnsupportedFile { path: file_path.to_path_buf() }.into());
        }
        if !file_path.exists() {
            return Err(FitError::FileNotFound { path: file_path.to_path_buf() }.into());
        }

        debug!(path = %file_path.display(), format = self.format_name(), "Decoding file");
        let bytes = std::fs::read(file_path)?;
        self.decode_bytes(&bytes)
    }
}

/// Collect all files in a directory that the decoder accepts, sorted by path
pub fn collect_decodable_files(
    decoder: &dyn ActivityDecoder,
    dir_path: &Path,
) -> Result<Vec<PathBuf>> {
    if !dir_path.is_dir() {
        return Err(FitError::FileNotFound { path: dir_path.to_path_buf() }.into());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir_path)? {
        let path = entry?.path();
        if path.is_file() && decoder.can_decode(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
