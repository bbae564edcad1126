//! Heart rate statistics over the flattened record stream
//!
//! Zones are relative to the activity's own maximum heart rate, not to an
//! athlete profile:
//! - Z1: 50-60% of max
//! - Z2: 60-70% of max
//! - Z3: 70-80% of max
//! - Z4: 80-90% of max
//! - Z5: 90%+ of max
//!
//! Lower bounds are inclusive, upper bounds exclusive. Samples under 50% of
//! max are counted in no zone.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{HeartRateAnalysis, HeartRateZones, Record};

/// Samples at or below this value are treated as dropouts
///
/// This also discards genuine readings under 51 bpm (resting values of
/// trained athletes); the analysis targets ride effort, not rest.
pub const MIN_QUALIFYING_HEART_RATE: u16 = 50;

/// Drift reported when it cannot be computed
pub const ZERO_DRIFT: &str = "0.0";

/// Heart rate values that pass the dropout filter, in record order
pub fn qualifying_heart_rates<'a, I>(records: I) -> Vec<u16>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter_map(|record| record.heart_rate)
        .filter(|hr| *hr > MIN_QUALIFYING_HEART_RATE)
        .collect()
}

/// Analyze heart rate over records, `None` when no sample qualifies
pub fn analyze_heart_rate<'a, I>(records: I) -> Option<HeartRateAnalysis>
where
    I: IntoIterator<Item = &'a Record>,
{
    let heart_rates = qualifying_heart_rates(records);
    analyze_heart_rate_values(&heart_rates)
}

/// Analyze already qualified heart rate values
pub fn analyze_heart_rate_values(heart_rates: &[u16]) -> Option<HeartRateAnalysis> {
    let max = *heart_rates.iter().max()?;
    let min = *heart_rates.iter().min()?;
    let avg = mean(heart_rates)?.round() as u16;

    let zones = zone_counts(heart_rates, max);
    let drift = format_drift(drift_percent(heart_rates));

    debug!(
        data_points = heart_rates.len(),
        avg,
        max,
        min,
        drift = %drift,
        "Heart rate analyzed"
    );

    Some(HeartRateAnalysis {
        avg,
        max,
        min,
        zones,
        drift,
        data_points: heart_rates.len(),
    })
}

/// Zone (1-5) of a heart rate relative to `max`, `None` below 50% of max
pub fn zone_for(heart_rate: u16, max: u16) -> Option<u8> {
    // hr >= (z + 4) / 10 * max, kept in integers so band edges are exact
    let scaled = u32::from(heart_rate) * 10;
    let max = u32::from(max);
    (1..=5u8).rev().find(|zone| scaled >= (u32::from(*zone) + 4) * max)
}

/// Count samples per zone
pub fn zone_counts(heart_rates: &[u16], max: u16) -> HeartRateZones {
    let mut zones = HeartRateZones::default();
    for hr in heart_rates {
        match zone_for(*hr, max) {
            Some(1) => zones.zone1 += 1,
            Some(2) => zones.zone2 += 1,
            Some(3) => zones.zone3 += 1,
            Some(4) => zones.zone4 += 1,
            Some(5) => zones.zone5 += 1,
            _ => {}
        }
    }
    zones
}

/// Percentage change of the second-half mean over the first-half mean
///
/// The first half is `[0, n/2)`; for odd `n` the middle sample belongs to the
/// second half. `None` when a half is empty or the first mean is zero.
pub fn drift_percent(heart_rates: &[u16]) -> Option<f64> {
    let (first_half, second_half) = heart_rates.split_at(heart_rates.len() / 2);
    let first_avg = mean(first_half)?;
    let second_avg = mean(second_half)?;

    if first_avg == 0.0 {
        return None;
    }

    Some((second_avg - first_avg) / first_avg * 100.0)
}

/// Format drift with one fractional digit; undefined drift becomes `"0.0"`
pub fn format_drift(drift: Option<f64>) -> String {
    let Some(rounded) = drift.filter(|d| d.is_finite()).map(round_one_decimal) else {
        return ZERO_DRIFT.to_string();
    };

    if rounded.is_zero() {
        ZERO_DRIFT.to_string()
    } else {
        format!("{:.1}", rounded)
    }
}

/// Round to one decimal, ties away from zero
pub fn round_one_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .unwrap_or_default()
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

fn mean(values: &[u16]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: u64 = values.iter().map(|v| u64::from(*v)).sum();
    Some(sum as f64 / values.len() as f64)
}

/// Fatigue indication derived from drift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftLevel {
    /// Drift of 2% or less
    Low,
    /// Drift above 2% up to 5%
    Moderate,
    /// Drift above 5%
    High,
}

impl DriftLevel {
    pub fn from_percent(drift: f64) -> Self {
        if drift > 5.0 {
            DriftLevel::High
        } else if drift > 2.0 {
            DriftLevel::Moderate
        } else {
            DriftLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DriftLevel::Low => "Low drift",
            DriftLevel::Moderate => "Moderate drift",
            DriftLevel::High => "High drift",
        }
    }
}

impl HeartRateAnalysis {
    /// Drift as a number, 0.0 if the string does not parse
    pub fn drift_value(&self) -> f64 {
        self.drift.parse().unwrap_or(0.0)
    }

    pub fn drift_level(&self) -> DriftLevel {
        DriftLevel::from_percent(self.drift_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn records(values: &[Option<u16>]) -> Vec<Record> {
        values
            .iter()
            .map(|hr| Record {
                heart_rate: *hr,
                ..Record::default()
            })
            .collect()
    }

    #[test]
    fn test_filter_excludes_dropouts_and_low_values() {
        let recs = records(&[Some(0), Some(50), None, Some(51), Some(120)]);
        assert_eq!(qualifying_heart_rates(&recs), vec![51, 120]);
    }

    #[test]
    fn test_no_qualifying_samples_is_none() {
        let recs = records(&[Some(0), Some(45), Some(50), None]);
        assert_eq!(analyze_heart_rate(&recs), None);
        assert_eq!(analyze_heart_rate(Vec::<Record>::new().iter()), None);
    }

    #[test]
    fn test_basic_statistics() {
        let recs = records(&[Some(51), Some(60), Some(70), Some(80), Some(90), Some(100)]);
        let analysis = analyze_heart_rate(&recs).unwrap();

        assert_eq!(analysis.max, 100);
        assert_eq!(analysis.min, 51);
        // mean 75.1666..
        assert_eq!(analysis.avg, 75);
        assert_eq!(analysis.data_points, 6);

        // 51 lands in zone1, 60 opens zone2, 90 and 100 are zone5
        assert_eq!(
            analysis.zones,
            HeartRateZones { zone1: 1, zone2: 1, zone3: 1, zone4: 1, zone5: 2 }
        );
    }

    #[test]
    fn test_average_rounds_half_up() {
        let analysis = analyze_heart_rate_values(&[100, 101]).unwrap();
        assert_eq!(analysis.avg, 101);
    }

    #[test]
    fn test_zone_boundaries_are_half_open() {
        assert_eq!(zone_for(90, 100), Some(5));
        assert_eq!(zone_for(89, 100), Some(4));
        assert_eq!(zone_for(100, 100), Some(5));
        assert_eq!(zone_for(50, 100), Some(1));
        assert_eq!(zone_for(49, 100), None);
        assert_eq!(zone_for(60, 100), Some(2));
        assert_eq!(zone_for(80, 100), Some(4));
    }

    #[test]
    fn test_zone_boundaries_with_fractional_thresholds() {
        // max 185: zone floors at 92.5, 111, 129.5, 148, 166.5
        assert_eq!(zone_for(92, 185), None);
        assert_eq!(zone_for(93, 185), Some(1));
        assert_eq!(zone_for(111, 185), Some(2));
        assert_eq!(zone_for(129, 185), Some(2));
        assert_eq!(zone_for(130, 185), Some(3));
        assert_eq!(zone_for(166, 185), Some(4));
        assert_eq!(zone_for(167, 185), Some(5));
    }

    #[test]
    fn test_samples_below_half_max_are_in_no_zone() {
        let analysis = analyze_heart_rate_values(&[60, 180, 180]).unwrap();
        assert_eq!(analysis.zones.total(), 2);
        assert_eq!(analysis.data_points, 3);
    }

    #[test]
    fn test_drift_sign() {
        let rising = analyze_heart_rate_values(&[120, 125, 130, 135, 140, 145]).unwrap();
        assert!(rising.drift_value() > 0.0);
        assert!(!rising.drift.starts_with('-'));

        let falling = analyze_heart_rate_values(&[145, 140, 135, 130, 125, 120]).unwrap();
        assert!(falling.drift.starts_with('-'));

        let steady = analyze_heart_rate_values(&[140, 140, 140, 140]).unwrap();
        assert_eq!(steady.drift, "0.0");
    }

    #[test]
    fn test_drift_value_and_format() {
        // first half mean 100, second half mean 110
        let drift = drift_percent(&[100, 100, 110, 110]).unwrap();
        assert!((drift - 10.0).abs() < 1e-9);
        assert_eq!(format_drift(Some(10.0)), "10.0");
        assert_eq!(format_drift(Some(3.2156)), "3.2");
        assert_eq!(format_drift(Some(-1.0)), "-1.0");
    }

    #[test]
    fn test_drift_odd_length_puts_middle_in_second_half() {
        // first half [100], second half [100, 130] => mean 115
        let drift = drift_percent(&[100, 100, 130]).unwrap();
        assert!((drift - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_sample_drift_is_zero() {
        assert_eq!(drift_percent(&[150]), None);
        let analysis = analyze_heart_rate_values(&[150]).unwrap();
        assert_eq!(analysis.drift, "0.0");
        assert_eq!(analysis.avg, 150);
    }

    #[test]
    fn test_tiny_negative_drift_is_not_negative_zero() {
        assert_eq!(format_drift(Some(-0.04)), "0.0");
        assert_eq!(format_drift(Some(f64::NAN)), "0.0");
        assert_eq!(format_drift(None), "0.0");
    }

    #[test]
    fn test_round_one_decimal_ties_away_from_zero() {
        assert_eq!(round_one_decimal(0.25), dec!(0.3));
        assert_eq!(round_one_decimal(-0.25), dec!(-0.3));
        assert_eq!(round_one_decimal(3.14), dec!(3.1));
    }

    #[test]
    fn test_drift_levels() {
        assert_eq!(DriftLevel::from_percent(5.1), DriftLevel::High);
        assert_eq!(DriftLevel::from_percent(5.0), DriftLevel::Moderate);
        assert_eq!(DriftLevel::from_percent(2.0), DriftLevel::Low);
        assert_eq!(DriftLevel::from_percent(-8.0), DriftLevel::Low);
        assert_eq!(DriftLevel::High.label(), "High drift");
    }

    proptest! {
        #[test]
        fn test_zone_counts_never_exceed_samples(
            values in proptest::collection::vec(51u16..220u16, 1..300)
        ) {
            let analysis = analyze_heart_rate_values(&values).unwrap();

            prop_assert!(analysis.zones.total() <= analysis.data_points);
            prop_assert_eq!(analysis.data_points, values.len());
            prop_assert!(analysis.min <= analysis.avg && analysis.avg <= analysis.max);
            // the max sample always lands in zone5
            prop_assert!(analysis.zones.zone5 >= 1);
        }

        #[test]
        fn test_analysis_is_deterministic(
            values in proptest::collection::vec(0u16..220u16, 0..200)
        ) {
            let recs: Vec<Record> = values
                .iter()
                .map(|hr| Record { heart_rate: Some(*hr), ..Record::default() })
                .collect();

            let first = analyze_heart_rate(&recs);
            let second = analyze_heart_rate(&recs);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.is_none(), values.iter().all(|hr| *hr <= MIN_QUALIFYING_HEART_RATE));
        }
    }
}
