use super::ExportError;
use crate::analysis::summary::{
    format_duration, format_lap_time, format_one_decimal, LapsSummary, SessionSummary,
};
use crate::import::DecodeConfig;
use crate::models::{ComprehensiveAnalysis, Lap};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct LapRow {
    #[tabled(rename = "Lap")]
    index: usize,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Avg Speed")]
    avg_speed: String,
    #[tabled(rename = "Avg HR")]
    avg_heart_rate: String,
    #[tabled(rename = "Avg Power")]
    avg_power: String,
}

impl LapRow {
    fn new(index: usize, lap: &Lap) -> Self {
        Self {
            index,
            time: format_lap_time(lap.total_elapsed_time),
            distance: format_one_decimal(lap.total_distance),
            avg_speed: format_one_decimal(lap.avg_speed),
            avg_heart_rate: optional(lap.avg_heart_rate),
            avg_power: optional(lap.avg_power),
        }
    }
}

fn optional(value: Option<u16>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Render a human-readable ride report
pub fn render_ride_report(analysis: &ComprehensiveAnalysis, units: &DecodeConfig) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, analysis, units);
    out
}

fn write_report(
    out: &mut String,
    analysis: &ComprehensiveAnalysis,
    units: &DecodeConfig,
) -> std::fmt::Result {
    let length = units.length_unit.label();
    let speed = units.speed_unit.label();

    writeln!(out, "=")?;
    writeln!(out, "RIDE REPORT")?;
    writeln!(out, "=")?;
    writeln!(out)?;

    writeln!(out, "DEVICE")?;
    writeln!(out, "-")?;
    match &analysis.file_info {
        Some(info) => {
            writeln!(out, "Manufacturer: {}", info.manufacturer)?;
            writeln!(out, "Product: {}", info.product)?;
            writeln!(out, "Serial Number: {}", info.serial_number)?;
            writeln!(out, "Created: {}", info.time_created)?;
        }
        None => writeln!(out, "No device information")?,
    }
    writeln!(out)?;

    writeln!(out, "SESSION")?;
    writeln!(out, "-")?;
    let summary = analysis.session.as_ref().map(SessionSummary::from_session);
    match summary.filter(|s| s.has_data()) {
        Some(summary) => {
            writeln!(out, "Distance: {} {}", format_one_decimal(summary.distance), length)?;
            writeln!(out, "Duration: {}", format_duration(summary.elapsed_time))?;
            writeln!(out, "Avg Speed: {} {}", format_one_decimal(summary.avg_speed), speed)?;
            writeln!(out, "Max Speed: {} {}", format_one_decimal(summary.max_speed), speed)?;
            if let Some((ascent, descent)) = summary.elevation() {
                writeln!(out, "Elevation: +{} m / -{} m", ascent, descent)?;
            }
        }
        None => writeln!(out, "No session data")?,
    }
    writeln!(out)?;

    writeln!(out, "HEART RATE")?;
    writeln!(out, "-")?;
    match &analysis.heart_rate {
        Some(hr) => {
            writeln!(out, "Average: {} bpm", hr.avg)?;
            writeln!(out, "Max: {} bpm", hr.max)?;
            writeln!(out, "Min: {} bpm", hr.min)?;
            writeln!(out, "Drift: {}% ({})", hr.drift, hr.drift_level().label())?;
            writeln!(out, "Samples: {}", hr.data_points)?;
            writeln!(out)?;
            writeln!(out, "Zone Distribution:")?;
            let total = hr.zones.total().max(1) as f64;
            for (i, count) in hr.zones.as_array().iter().enumerate() {
                writeln!(
                    out,
                    "  Zone {}: {} ({:.1}%)",
                    i + 1,
                    count,
                    *count as f64 / total * 100.0
                )?;
            }
        }
        None => writeln!(out, "No heart rate data")?,
    }
    writeln!(out)?;

    writeln!(out, "LAPS")?;
    writeln!(out, "-")?;
    if analysis.laps.is_empty() {
        writeln!(out, "No laps recorded")?;
    } else {
        let laps_summary = LapsSummary::from_laps(&analysis.laps);
        writeln!(out, "Lap Count: {}", laps_summary.lap_count)?;
        writeln!(
            out,
            "Total Distance: {} {}",
            format_one_decimal(Some(laps_summary.total_distance)),
            length
        )?;
        writeln!(out, "Avg Lap Time: {}", format_lap_time(laps_summary.avg_lap_time))?;
        writeln!(out)?;

        let rows: Vec<LapRow> = LapsSummary::displayed(&analysis.laps)
            .iter()
            .enumerate()
            .map(|(i, lap)| LapRow::new(i + 1, lap))
            .collect();
        writeln!(out, "{}", Table::new(rows).with(Style::modern()))?;
        if laps_summary.remaining > 0 {
            writeln!(out, "+{} more laps", laps_summary.remaining)?;
        }
    }

    Ok(())
}

/// Export a ride report to a text file
pub fn export_ride_report<P: AsRef<Path>>(
    analysis: &ComprehensiveAnalysis,
    units: &DecodeConfig,
    output_path: P,
) -> Result<(), ExportError> {
    let report = render_ride_report(analysis, units);
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(report.as_bytes())?;
    Ok(())
}
