use super::ExportError;
use crate::models::ComprehensiveAnalysis;
use std::io::Write;
use std::path::Path;

/// Pretty-printed JSON for an analysis
pub fn to_json_string(analysis: &ComprehensiveAnalysis) -> Result<String, ExportError> {
    serde_json::to_string_pretty(analysis).map_err(|e| ExportError::SerializationError(e.to_string()))
}

/// Export an analysis to JSON format
pub fn export_analysis<P: AsRef<Path>>(
    analysis: &ComprehensiveAnalysis,
    output_path: P,
) -> Result<(), ExportError> {
    let json_data = to_json_string(analysis)?;

    let mut file = std::fs::File::create(output_path)?;
    file.write_all(json_data.as_bytes())?;

    Ok(())
}
