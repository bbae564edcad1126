//! FIT decoder adapter
//!
//! `fitparser` yields a flat stream of FIT messages. This module folds that
//! stream into the nested [`FitData`] tree (activity → sessions → laps →
//! records) and applies the unit preferences carried by [`DecodeConfig`].

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use fitparser::de::{from_bytes_with_options, DecodeOption};
use fitparser::profile::MesgNum;
use fitparser::Value;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{FitError, Result};
use crate::import::ActivityDecoder;
use crate::models::{Activity, DeviceInfo, FitData, Lap, Record, Session};

const SEMICIRCLES_TO_DEGREES: f64 = 180.0 / 2_147_483_648.0;

/// Unit used for speed fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedUnit {
    #[serde(rename = "m/s")]
    MetersPerSecond,
    #[serde(rename = "km/h")]
    KilometersPerHour,
    #[serde(rename = "mph")]
    MilesPerHour,
}

impl SpeedUnit {
    /// Convert from meters per second
    pub fn convert(&self, meters_per_second: f64) -> f64 {
        match self {
            SpeedUnit::MetersPerSecond => meters_per_second,
            SpeedUnit::KilometersPerHour => meters_per_second * 3.6,
            SpeedUnit::MilesPerHour => meters_per_second * 3.6 / 1.609344,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpeedUnit::MetersPerSecond => "m/s",
            SpeedUnit::KilometersPerHour => "km/h",
            SpeedUnit::MilesPerHour => "mph",
        }
    }
}

impl FromStr for SpeedUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "m/s" | "mps" => Ok(SpeedUnit::MetersPerSecond),
            "km/h" | "kph" | "kmh" => Ok(SpeedUnit::KilometersPerHour),
            "mph" | "mi/h" => Ok(SpeedUnit::MilesPerHour),
            _ => Err(format!("Invalid speed unit: {}", s)),
        }
    }
}

impl fmt::Display for SpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unit used for distance fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "km")]
    Kilometers,
    #[serde(rename = "mi")]
    Miles,
}

impl LengthUnit {
    /// Convert from meters
    pub fn convert(&self, meters: f64) -> f64 {
        match self {
            LengthUnit::Meters => meters,
            LengthUnit::Kilometers => meters / 1000.0,
            LengthUnit::Miles => meters / 1609.344,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LengthUnit::Meters => "m",
            LengthUnit::Kilometers => "km",
            LengthUnit::Miles => "mi",
        }
    }
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "m" | "meters" => Ok(LengthUnit::Meters),
            "km" | "kilometers" => Ok(LengthUnit::Kilometers),
            "mi" | "miles" => Ok(LengthUnit::Miles),
            _ => Err(format!("Invalid length unit: {}", s)),
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unit used for temperature fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    /// Convert from degrees celsius
    pub fn convert(&self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
            TemperatureUnit::Kelvin => celsius + 273.15,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
            TemperatureUnit::Kelvin => "kelvin",
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            "kelvin" | "k" => Ok(TemperatureUnit::Kelvin),
            _ => Err(format!("Invalid temperature unit: {}", s)),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decoder settings, passed explicitly to every decode call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    pub speed_unit: SpeedUnit,
    pub length_unit: LengthUnit,
    pub temperature_unit: TemperatureUnit,

    /// Decode even when header or data CRCs do not match
    pub force: bool,

    /// Fill `Record::elapsed_time` relative to the first timestamped record
    pub elapsed_record_field: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            speed_unit: SpeedUnit::KilometersPerHour,
            length_unit: LengthUnit::Kilometers,
            temperature_unit: TemperatureUnit::Celsius,
            force: true,
            elapsed_record_field: true,
        }
    }
}

impl DecodeConfig {
    fn decode_options(&self) -> HashSet<DecodeOption> {
        let mut options = HashSet::new();
        if self.force {
            options.insert(DecodeOption::SkipHeaderCrcValidation);
            options.insert(DecodeOption::SkipDataCrcValidation);
        }
        options
    }
}

/// FIT decoder producing the cascade tree
#[derive(Debug, Clone, Default)]
pub struct FitDecoder {
    config: DecodeConfig,
}

impl FitDecoder {
    pub fn new() -> Self {
        Self::with_config(DecodeConfig::default())
    }

    pub fn with_config(config: DecodeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Decode raw FIT bytes
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn decode(&self, bytes: &[u8]) -> Result<FitData> {
        let messages = from_bytes_with_options(bytes, &self.config.decode_options())
            .map_err(|e| FitError::Decode { reason: e.to_string() })?;

        debug!(messages = messages.len(), "FIT messages decoded");

        let mut builder = CascadeBuilder::new(self.config);
        for message in &messages {
            builder.push_message(
                message.kind(),
                message.fields().iter().map(|field| (field.name(), field.value())),
            );
        }

        Ok(builder.finish())
    }

    /// Read and decode a FIT file from disk
    ///
    /// Paths without a `.fit` extension are rejected before any read.
    pub fn decode_file(&self, file_path: &Path) -> Result<FitData> {
        self.decode_path(file_path)
    }

    /// Whether the path carries a `.fit` extension
    pub fn can_decode_path(file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("fit"))
            .unwrap_or(false)
    }
}

impl ActivityDecoder for FitDecoder {
    fn can_decode(&self, file_path: &Path) -> bool {
        Self::can_decode_path(file_path)
    }

    fn decode_bytes(&self, bytes: &[u8]) -> Result<FitData> {
        self.decode(bytes)
    }

    fn format_name(&self) -> &'static str {
        "FIT"
    }
}

/// Folds flat FIT messages into the activity tree
///
/// Records wait for the next lap message, laps wait for the next session
/// message. Anything still pending when the stream ends is dropped.
#[derive(Debug)]
pub struct CascadeBuilder {
    config: DecodeConfig,
    device_infos: Vec<DeviceInfo>,
    sessions: Vec<Session>,
    pending_laps: Vec<Lap>,
    pending_records: Vec<Record>,
    activity_timestamp: Option<DateTime<Utc>>,
    file_time_created: Option<DateTime<Utc>>,
    first_record_time: Option<DateTime<Utc>>,
}

impl CascadeBuilder {
    pub fn new(config: DecodeConfig) -> Self {
        Self {
            config,
            device_infos: Vec::new(),
            sessions: Vec::new(),
            pending_laps: Vec::new(),
            pending_records: Vec::new(),
            activity_timestamp: None,
            file_time_created: None,
            first_record_time: None,
        }
    }

    /// Feed one decoded message
    pub fn push_message<'a, I>(&mut self, kind: MesgNum, fields: I)
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        match kind {
            MesgNum::FileId => {
                for (name, value) in fields {
                    if name == "time_created" {
                        self.file_time_created = timestamp_value(value);
                    }
                }
            }
            MesgNum::DeviceInfo => {
                let device = self.device_info(fields);
                self.device_infos.push(device);
            }
            MesgNum::Record => {
                let record = self.record(fields);
                self.pending_records.push(record);
            }
            MesgNum::Lap => {
                let records = std::mem::take(&mut self.pending_records);
                let lap = self.summary_fields(fields).into_lap(records);
                self.pending_laps.push(lap);
            }
            MesgNum::Session => {
                let laps = std::mem::take(&mut self.pending_laps);
                let session = self.summary_fields(fields).into_session(laps);
                self.sessions.push(session);
            }
            MesgNum::Activity => {
                for (name, value) in fields {
                    if name == "timestamp" {
                        self.activity_timestamp = timestamp_value(value);
                    }
                }
            }
            _ => {}
        }
    }

    /// Finish assembly and produce the tree
    ///
    /// FIT `device_info` messages carry no creation time, so every device
    /// takes `time_created` from the `file_id` message.
    pub fn finish(self) -> FitData {
        if !self.pending_records.is_empty() {
            debug!(count = self.pending_records.len(), "Dropping records not closed by a lap");
        }
        if !self.pending_laps.is_empty() {
            debug!(count = self.pending_laps.len(), "Dropping laps not closed by a session");
        }

        let file_time_created = self.file_time_created;
        let device_infos = self
            .device_infos
            .into_iter()
            .map(|device| DeviceInfo {
                time_created: file_time_created,
                ..device
            })
            .collect();

        FitData {
            activity: Some(Activity {
                timestamp: self.activity_timestamp,
                device_infos,
                sessions: self.sessions,
            }),
        }
    }

    fn device_info<'a, I>(&self, fields: I) -> DeviceInfo
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        let mut device = DeviceInfo::default();
        for (name, value) in fields {
            match name {
                "manufacturer" => device.manufacturer = text_value(value),
                "product" | "garmin_product" | "favero_product" => {
                    device.product = text_value(value)
                }
                "serial_number" => device.serial_number = number_value(value).and_then(to_u32),
                "software_version" => device.software_version = number_value(value),
                "cum_operating_time" => {
                    device.cum_operating_time = number_value(value).and_then(to_u32)
                }
                _ => {}
            }
        }
        device
    }

    fn record<'a, I>(&mut self, fields: I) -> Record
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        let units = self.config;
        let mut record = Record::default();
        for (name, value) in fields {
            match name {
                "heart_rate" => record.heart_rate = number_value(value).and_then(to_u16),
                "power" => record.power = number_value(value).and_then(to_u16),
                "cadence" => record.cadence = number_value(value).and_then(to_u16),
                "speed" => record.speed = number_value(value).map(|v| units.speed_unit.convert(v)),
                "enhanced_speed" => {
                    record.enhanced_speed = number_value(value).map(|v| units.speed_unit.convert(v))
                }
                "distance" => {
                    record.distance = number_value(value).map(|v| units.length_unit.convert(v))
                }
                "altitude" => record.altitude = number_value(value),
                "enhanced_altitude" => record.enhanced_altitude = number_value(value),
                "temperature" => {
                    record.temperature =
                        number_value(value).map(|v| units.temperature_unit.convert(v))
                }
                "timestamp" => record.timestamp = timestamp_value(value),
                "position_lat" => {
                    record.position_lat = number_value(value).map(|v| v * SEMICIRCLES_TO_DEGREES)
                }
                "position_long" => {
                    record.position_long = number_value(value).map(|v| v * SEMICIRCLES_TO_DEGREES)
                }
                _ => {}
            }
        }

        if self.config.elapsed_record_field {
            if let Some(ts) = record.timestamp {
                let start = *self.first_record_time.get_or_insert(ts);
                record.elapsed_time = Some((ts - start).num_milliseconds() as f64 / 1000.0);
            }
        }

        record
    }

    fn summary_fields<'a, I>(&self, fields: I) -> SummaryFields
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        let units = self.config;
        let mut summary = SummaryFields::default();
        for (name, value) in fields {
            match name {
                "start_time" => summary.start_time = timestamp_value(value),
                "total_elapsed_time" => summary.total_elapsed_time = number_value(value),
                "total_timer_time" => summary.total_timer_time = number_value(value),
                "total_distance" => {
                    summary.total_distance =
                        number_value(value).map(|v| units.length_unit.convert(v))
                }
                "avg_speed" | "enhanced_avg_speed" => {
                    summary.avg_speed = number_value(value).map(|v| units.speed_unit.convert(v))
                }
                "max_speed" | "enhanced_max_speed" => {
                    summary.max_speed = number_value(value).map(|v| units.speed_unit.convert(v))
                }
                "avg_heart_rate" => summary.avg_heart_rate = number_value(value).and_then(to_u16),
                "max_heart_rate" => summary.max_heart_rate = number_value(value).and_then(to_u16),
                "avg_power" => summary.avg_power = number_value(value).and_then(to_u16),
                "max_power" => summary.max_power = number_value(value).and_then(to_u16),
                "normalized_power" => {
                    summary.normalized_power = number_value(value).and_then(to_u16)
                }
                "training_stress_score" => summary.training_stress_score = number_value(value),
                "intensity_factor" => summary.intensity_factor = number_value(value),
                "total_ascent" => summary.total_ascent = number_value(value),
                "total_descent" => summary.total_descent = number_value(value),
                "avg_cadence" => summary.avg_cadence = number_value(value).and_then(to_u16),
                "max_cadence" => summary.max_cadence = number_value(value).and_then(to_u16),
                _ => {}
            }
        }
        summary
    }
}

/// Fields shared by lap and session messages
#[derive(Debug, Default)]
struct SummaryFields {
    start_time: Option<DateTime<Utc>>,
    total_elapsed_time: Option<f64>,
    total_timer_time: Option<f64>,
    total_distance: Option<f64>,
    avg_speed: Option<f64>,
    max_speed: Option<f64>,
    avg_heart_rate: Option<u16>,
    max_heart_rate: Option<u16>,
    avg_power: Option<u16>,
    max_power: Option<u16>,
    normalized_power: Option<u16>,
    training_stress_score: Option<f64>,
    intensity_factor: Option<f64>,
    total_ascent: Option<f64>,
    total_descent: Option<f64>,
    avg_cadence: Option<u16>,
    max_cadence: Option<u16>,
}

impl SummaryFields {
    fn into_lap(self, records: Vec<Record>) -> Lap {
        Lap {
            start_time: self.start_time,
            total_elapsed_time: self.total_elapsed_time,
            total_timer_time: self.total_timer_time,
            total_distance: self.total_distance,
            avg_speed: self.avg_speed,
            max_speed: self.max_speed,
            avg_heart_rate: self.avg_heart_rate,
            max_heart_rate: self.max_heart_rate,
            avg_power: self.avg_power,
            max_power: self.max_power,
            normalized_power: self.normalized_power,
            total_ascent: self.total_ascent,
            total_descent: self.total_descent,
            avg_cadence: self.avg_cadence,
            max_cadence: self.max_cadence,
            records,
        }
    }

    fn into_session(self, laps: Vec<Lap>) -> Session {
        Session {
            start_time: self.start_time,
            total_elapsed_time: self.total_elapsed_time,
            total_timer_time: self.total_timer_time,
            total_distance: self.total_distance,
            avg_speed: self.avg_speed,
            max_speed: self.max_speed,
            avg_heart_rate: self.avg_heart_rate,
            max_heart_rate: self.max_heart_rate,
            avg_power: self.avg_power,
            max_power: self.max_power,
            normalized_power: self.normalized_power,
            training_stress_score: self.training_stress_score,
            intensity_factor: self.intensity_factor,
            total_ascent: self.total_ascent,
            total_descent: self.total_descent,
            avg_cadence: self.avg_cadence,
            max_cadence: self.max_cadence,
            laps,
        }
    }
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Float32(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v),
        Value::SInt8(v) => Some(*v as f64),
        Value::SInt16(v) => Some(*v as f64),
        Value::SInt32(v) => Some(*v as f64),
        Value::SInt64(v) => Some(*v as f64),
        Value::UInt8(v) => Some(*v as f64),
        Value::UInt16(v) => Some(*v as f64),
        Value::UInt32(v) => Some(*v as f64),
        Value::UInt64(v) => Some(*v as f64),
        Value::UInt8z(v) => Some(*v as f64),
        Value::UInt16z(v) => Some(*v as f64),
        Value::UInt32z(v) => Some(*v as f64),
        Value::UInt64z(v) => Some(*v as f64),
        Value::Byte(v) => Some(*v as f64),
        Value::Enum(v) => Some(*v as f64),
        Value::Array(values) => values.iter().find_map(number_value),
        _ => None,
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        other => number_value(other).map(|v| format!("{}", v.round() as i64)),
    }
}

fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Timestamp(ts) => Some(ts.with_timezone(&Utc)),
        _ => None,
    }
}

fn to_u16(v: f64) -> Option<u16> {
    (v >= 0.0 && v <= u16::MAX as f64).then(|| v.round() as u16)
}

fn to_u32(v: f64) -> Option<u32> {
    (v >= 0.0 && v <= u32::MAX as f64).then(|| v.round() as u32)
}
