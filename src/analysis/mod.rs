//! Ride analysis engine
//!
//! Pure functions over a decoded [`FitData`] tree. The only fallible step is
//! decoding, which happens before any of this runs.

use std::path::Path;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::import::{DecodeConfig, FitDecoder};
use crate::models::{ComprehensiveAnalysis, FitData};

pub mod flatten;
pub mod heart_rate;
pub mod metadata;
pub mod summary;

pub use flatten::{flatten, FlattenedActivity};
pub use heart_rate::{analyze_heart_rate, zone_for, DriftLevel, MIN_QUALIFYING_HEART_RATE};
pub use metadata::extract_file_info;
pub use summary::{LapsSummary, SessionSummary};

/// Analyze a decoded activity
///
/// Never fails: missing device info, sessions, laps or heart rate samples map
/// to `None` or empty collections in the result.
#[instrument(skip(data))]
pub fn perform_comprehensive_analysis(data: &FitData) -> ComprehensiveAnalysis {
    let flat = flatten(data);

    let analysis = ComprehensiveAnalysis {
        file_info: extract_file_info(flat.device_infos),
        session: flat.session.cloned(),
        laps: flat.laps.iter().map(|lap| (*lap).clone()).collect(),
        heart_rate: analyze_heart_rate(flat.records.iter().copied()),
    };

    debug!(
        laps = analysis.laps.len(),
        records = flat.records.len(),
        has_heart_rate = analysis.heart_rate.is_some(),
        "Activity analyzed"
    );

    analysis
}

/// Decodes and analyzes FIT files with a fixed decoder configuration
#[derive(Debug, Clone, Default)]
pub struct RideAnalyzer {
    decoder: FitDecoder,
}

impl RideAnalyzer {
    pub fn new(config: DecodeConfig) -> Self {
        Self {
            decoder: FitDecoder::with_config(config),
        }
    }

    pub fn config(&self) -> &DecodeConfig {
        self.decoder.config()
    }

    /// Decode then analyze in-memory FIT bytes
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<ComprehensiveAnalysis> {
        let data = self.decoder.decode(bytes)?;
        Ok(perform_comprehensive_analysis(&data))
    }

    /// Read, decode and analyze a FIT file
    #[instrument(skip(self), fields(path = %file_path.display()))]
    pub fn analyze_file(&self, file_path: &Path) -> Result<ComprehensiveAnalysis> {
        let data = self.decoder.decode_file(file_path)?;
        Ok(perform_comprehensive_analysis(&data))
    }
}

/// Decode then analyze in-memory FIT bytes
pub fn analyze_fit_bytes(bytes: &[u8], config: &DecodeConfig) -> Result<ComprehensiveAnalysis> {
    RideAnalyzer::new(*config).analyze_bytes(bytes)
}

/// Read, decode and analyze a FIT file
pub fn analyze_fit_file(file_path: &Path, config: &DecodeConfig) -> Result<ComprehensiveAnalysis> {
    RideAnalyzer::new(*config).analyze_file(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, DeviceInfo, Lap, Record, Session};

    fn hr_lap(values: &[u16]) -> Lap {
        Lap {
            records: values
                .iter()
                .map(|hr| Record {
                    heart_rate: Some(*hr),
                    ..Record::default()
                })
                .collect(),
            ..Lap::default()
        }
    }

    #[test]
    fn test_empty_input() {
        let analysis = perform_comprehensive_analysis(&FitData::default());
        assert_eq!(analysis, ComprehensiveAnalysis::default());
        assert!(analysis.file_info.is_none());
        assert!(analysis.session.is_none());
        assert!(analysis.laps.is_empty());
        assert!(analysis.heart_rate.is_none());
    }

    #[test]
    fn test_records_from_every_session_feed_heart_rate() {
        let data = FitData {
            activity: Some(Activity {
                device_infos: vec![DeviceInfo::default()],
                sessions: vec![
                    Session {
                        laps: vec![hr_lap(&[120, 130])],
                        ..Session::default()
                    },
                    Session {
                        laps: vec![hr_lap(&[140, 0])],
                        ..Session::default()
                    },
                ],
                ..Activity::default()
            }),
        };

        let analysis = perform_comprehensive_analysis(&data);
        let hr = analysis.heart_rate.unwrap();
        assert_eq!(hr.data_points, 3);
        assert_eq!(hr.max, 140);
        assert_eq!(analysis.laps.len(), 2);
        assert_eq!(analysis.session.unwrap().laps.len(), 1);
        assert_eq!(analysis.file_info.unwrap().product, "Unknown");
    }

    #[test]
    fn test_decode_failure_is_not_an_empty_analysis() {
        let result = analyze_fit_bytes(b"garbage", &DecodeConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_analyzer_keeps_config() {
        let config = DecodeConfig {
            force: false,
            ..DecodeConfig::default()
        };
        let analyzer = RideAnalyzer::new(config);
        assert!(!analyzer.config().force);
    }
}
