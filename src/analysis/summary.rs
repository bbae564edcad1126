use serde::{Deserialize, Serialize};

use crate::models::{Lap, Session};

/// Laps shown individually in compact displays
pub const COMPACT_LAP_COUNT: usize = 3;

/// Headline numbers of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub distance: Option<f64>,
    pub elapsed_time: Option<f64>,
    pub avg_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub total_ascent: Option<f64>,
    pub total_descent: Option<f64>,
}

impl SessionSummary {
    pub fn from_session(session: &Session) -> Self {
        Self {
            distance: session.total_distance,
            elapsed_time: session.total_elapsed_time,
            avg_speed: session.avg_speed,
            max_speed: session.max_speed,
            total_ascent: session.total_ascent,
            total_descent: session.total_descent,
        }
    }

    /// False when neither distance nor elapsed time carries a value
    pub fn has_data(&self) -> bool {
        is_positive(self.distance) || is_positive(self.elapsed_time)
    }

    /// Rounded ascent and descent in meters, when either is recorded
    pub fn elevation(&self) -> Option<(i64, i64)> {
        if !is_positive(self.total_ascent) && !is_positive(self.total_descent) {
            return None;
        }
        Some((
            self.total_ascent.unwrap_or(0.0).round() as i64,
            self.total_descent.unwrap_or(0.0).round() as i64,
        ))
    }
}

/// Aggregates over all laps of an activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapsSummary {
    pub lap_count: usize,

    /// Sum of recorded lap distances
    pub total_distance: f64,

    /// Sum of recorded lap times divided by the number of laps
    pub avg_lap_time: Option<f64>,

    /// Laps beyond the compact display
    pub remaining: usize,
}

impl LapsSummary {
    pub fn from_laps(laps: &[Lap]) -> Self {
        let total_distance = laps.iter().filter_map(|lap| lap.total_distance).sum();
        let total_time: f64 = laps.iter().filter_map(|lap| lap.total_elapsed_time).sum();

        Self {
            lap_count: laps.len(),
            total_distance,
            avg_lap_time: (!laps.is_empty()).then(|| total_time / laps.len() as f64),
            remaining: laps.len().saturating_sub(COMPACT_LAP_COUNT),
        }
    }

    /// The laps shown individually
    pub fn displayed(laps: &[Lap]) -> &[Lap] {
        &laps[..laps.len().min(COMPACT_LAP_COUNT)]
    }
}

/// `h:mm` for an hour or more, `m:ss` otherwise
pub fn format_duration(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| *s > 0.0) else {
        return "0:00".to_string();
    };

    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;

    if hours > 0 {
        format!("{}:{:02}", hours, minutes)
    } else {
        format!("{}:{:02}", minutes, total % 60)
    }
}

/// Always `m:ss`, minutes uncapped
pub fn format_lap_time(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| *s > 0.0) else {
        return "0:00".to_string();
    };

    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// One decimal, `0.0` when missing
pub fn format_one_decimal(value: Option<f64>) -> String {
    match value.filter(|v| *v != 0.0) {
        Some(v) => format!("{:.1}", v),
        None => "0.0".to_string(),
    }
}

fn is_positive(value: Option<f64>) -> bool {
    value.map(|v| v > 0.0).unwrap_or(false)
}
