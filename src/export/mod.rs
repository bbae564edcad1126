use crate::import::DecodeConfig;
use crate::models::ComprehensiveAnalysis;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub mod json;
pub mod text;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Text,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Result<Self, ExportError> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }

    /// Guess the format from an output file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| Self::from_str(ext).ok())
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Render an analysis in the given format
///
/// Units only label the text report; values are already converted by the decoder.
pub fn render_analysis(
    analysis: &ComprehensiveAnalysis,
    format: ExportFormat,
    units: &DecodeConfig,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => json::to_json_string(analysis),
        ExportFormat::Text => Ok(text::render_ride_report(analysis, units)),
    }
}

/// Write an analysis to a file in the given format
pub fn export_analysis<P: AsRef<Path>>(
    analysis: &ComprehensiveAnalysis,
    format: ExportFormat,
    units: &DecodeConfig,
    output_path: P,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Json => json::export_analysis(analysis, output_path),
        ExportFormat::Text => text::export_ride_report(analysis, units, output_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_export_format_from_str() {
        assert_eq!(ExportFormat::from_str("json").unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::from_str("TXT").unwrap(), ExportFormat::Text);
        assert!(matches!(
            ExportFormat::from_str("pdf"),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_export_format_from_path() {
        assert_eq!(ExportFormat::from_path(&PathBuf::from("ride.json")), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_path(&PathBuf::from("ride.txt")), Some(ExportFormat::Text));
        assert_eq!(ExportFormat::from_path(&PathBuf::from("ride")), None);
    }

    #[test]
    fn test_render_empty_analysis() {
        let analysis = ComprehensiveAnalysis::default();
        let json = render_analysis(&analysis, ExportFormat::Json, &DecodeConfig::default()).unwrap();
        assert!(json.contains("\"heartRate\": null"));

        let text = render_analysis(&analysis, ExportFormat::Text, &DecodeConfig::default()).unwrap();
        assert!(text.contains("No heart rate data"));
    }
}
