use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

use crate::models::{DeviceInfo, FileInfo};

/// Placeholder for missing manufacturer or product
pub const UNKNOWN: &str = "Unknown";

/// Placeholder for missing serial number or creation time
pub const NOT_AVAILABLE: &str = "N/A";

/// Build display metadata from the first device, formatting times in the local zone
pub fn extract_file_info(device_infos: &[DeviceInfo]) -> Option<FileInfo> {
    extract_file_info_in(device_infos, &Local)
}

/// Same as [`extract_file_info`] with an explicit display time zone
///
/// Returns `None` when there are no devices. Only the first device is used;
/// later entries are sensors paired during the ride.
pub fn extract_file_info_in<Tz>(device_infos: &[DeviceInfo], tz: &Tz) -> Option<FileInfo>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let device = device_infos.first()?;

    Some(FileInfo {
        manufacturer: device
            .manufacturer
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string()),
        product: device.product.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        serial_number: device
            .serial_number
            .map(|serial| serial.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        time_created: device
            .time_created
            .map(|created| format_time_created(&created, tz))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    })
}

/// Locale style date-time, e.g. `3/5/2024, 2:07:09 PM`
pub fn format_time_created<Tz>(created: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    created
        .with_timezone(tz)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}
