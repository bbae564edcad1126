use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decoded FIT file in cascade shape: activity → sessions → laps → records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitData {
    /// Activity root, absent when nothing was decoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<Activity>,
}

/// Top-level activity container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity message timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Device info messages in file order
    #[serde(default)]
    pub device_infos: Vec<DeviceInfo>,

    /// Sessions in file order
    #[serde(default)]
    pub sessions: Vec<Session>,
}

/// Recording device metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Manufacturer name (or numeric id rendered as text when unknown to the profile)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    /// Product name or id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,

    /// Device serial number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<u32>,

    /// When the device created the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,

    /// Firmware version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_version: Option<f64>,

    /// Cumulative operating time in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cum_operating_time: Option<u32>,
}

/// Single timestamped sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Heart rate in beats per minute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u16>,

    /// Power in watts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<u16>,

    /// Cadence in rpm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<u16>,

    /// Speed in the configured speed unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    /// Cumulative distance in the configured length unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,

    /// Altitude in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    /// Temperature in the configured temperature unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Latitude in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_lat: Option<f64>,

    /// Longitude in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_long: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_speed: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_altitude: Option<f64>,

    /// Seconds since the first timestamped record of the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,
}

/// Aggregated metrics over a contiguous part of the activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// Elapsed time in seconds, including pauses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elapsed_time: Option<f64>,

    /// Timer time in seconds, excluding pauses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_timer_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_distance: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_speed: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heart_rate: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_power: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_power: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_power: Option<u16>,

    /// Ascent in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_ascent: Option<f64>,

    /// Descent in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_descent: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_cadence: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cadence: Option<u16>,

    /// Records claimed by this lap, in recording order
    #[serde(default)]
    pub records: Vec<Record>,
}

/// Aggregated metrics over the whole activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elapsed_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_timer_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_distance: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_speed: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heart_rate: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_power: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_power: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_power: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_stress_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_factor: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_ascent: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_descent: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_cadence: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cadence: Option<u16>,

    /// Laps claimed by this session, in recording order
    #[serde(default)]
    pub laps: Vec<Lap>,
}

/// Display metadata derived from the first device info
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub manufacturer: String,
    pub product: String,
    pub serial_number: String,
    pub time_created: String,
}

/// Sample counts per relative heart rate band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateZones {
    pub zone1: usize,
    pub zone2: usize,
    pub zone3: usize,
    pub zone4: usize,
    pub zone5: usize,
}

impl HeartRateZones {
    /// Counts as an array indexed by zone - 1
    pub fn as_array(&self) -> [usize; 5] {
        [self.zone1, self.zone2, self.zone3, self.zone4, self.zone5]
    }

    /// Samples that landed in any zone
    pub fn total(&self) -> usize {
        self.as_array().iter().sum()
    }
}

/// Heart rate statistics for one activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateAnalysis {
    /// Mean heart rate, rounded to the nearest bpm
    pub avg: u16,
    pub max: u16,
    pub min: u16,
    pub zones: HeartRateZones,
    /// Second-half vs first-half change in percent, one decimal
    pub drift: String,
    /// Number of qualifying samples
    pub data_points: usize,
}

/// Result of analyzing one decoded FIT file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveAnalysis {
    /// Device metadata, `{}` when the file has no device info
    #[serde(with = "empty_object")]
    pub file_info: Option<FileInfo>,

    /// First session, `{}` when the file has none
    #[serde(with = "empty_object")]
    pub session: Option<Session>,

    /// All laps across all sessions
    pub laps: Vec<Lap>,

    /// `null` when no record has a qualifying heart rate
    pub heart_rate: Option<HeartRateAnalysis>,
}

/// Serializes `None` as `{}` rather than `null`
mod empty_object {
    use serde::de::{DeserializeOwned, Error as _};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: DeserializeOwned,
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match &value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Object(map) if map.is_empty() => Ok(None),
            _ => serde_json::from_value(value).map(Some).map_err(D::Error::custom),
        }
    }
}
