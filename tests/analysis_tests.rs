//! Integration tests for the ride analysis engine over in-memory activities

use proptest::prelude::*;
use ridelens::analysis::{perform_comprehensive_analysis, zone_for};
use ridelens::{Activity, ComprehensiveAnalysis, DeviceInfo, FitData, Lap, Record, Session};
use serde_json::json;

fn hr_record(heart_rate: Option<u16>) -> Record {
    Record {
        heart_rate,
        ..Record::default()
    }
}

fn lap_with(values: &[Option<u16>], distance: f64) -> Lap {
    Lap {
        total_distance: Some(distance),
        records: values.iter().copied().map(hr_record).collect(),
        ..Lap::default()
    }
}

fn ride(sessions: Vec<Session>, device_infos: Vec<DeviceInfo>) -> FitData {
    FitData {
        activity: Some(Activity {
            device_infos,
            sessions,
            ..Activity::default()
        }),
    }
}

fn single_lap_ride(values: &[u16]) -> FitData {
    let values: Vec<Option<u16>> = values.iter().copied().map(Some).collect();
    ride(
        vec![Session {
            laps: vec![lap_with(&values, 1.0)],
            ..Session::default()
        }],
        Vec::new(),
    )
}

#[test]
fn test_empty_input_serializes_to_empty_shapes() {
    for data in [FitData::default(), ride(Vec::new(), Vec::new())] {
        let analysis = perform_comprehensive_analysis(&data);
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(
            value,
            json!({
                "fileInfo": {},
                "session": {},
                "laps": [],
                "heartRate": null,
            })
        );
    }
}

#[test]
fn test_metadata_defaults() {
    let device = DeviceInfo {
        manufacturer: Some("garmin".to_string()),
        ..DeviceInfo::default()
    };
    let analysis = perform_comprehensive_analysis(&ride(Vec::new(), vec![device]));
    let info = analysis.file_info.unwrap();

    assert_eq!(info.manufacturer, "garmin");
    assert_eq!(info.product, "Unknown");
    assert_eq!(info.serial_number, "N/A");
    assert_eq!(info.time_created, "N/A");
}

#[test]
fn test_metadata_uses_first_device_only() {
    let first = DeviceInfo {
        serial_number: Some(1234),
        ..DeviceInfo::default()
    };
    let second = DeviceInfo {
        manufacturer: Some("garmin".to_string()),
        serial_number: Some(5678),
        ..DeviceInfo::default()
    };
    let info = perform_comprehensive_analysis(&ride(Vec::new(), vec![first, second]))
        .file_info
        .unwrap();

    assert_eq!(info.manufacturer, "Unknown");
    assert_eq!(info.serial_number, "1234");
}

#[test]
fn test_lap_order_preserved_across_sessions() {
    let data = ride(
        vec![
            Session {
                total_distance: Some(30.0),
                laps: vec![lap_with(&[], 1.0), lap_with(&[], 2.0)],
                ..Session::default()
            },
            Session {
                laps: vec![lap_with(&[], 3.0)],
                ..Session::default()
            },
        ],
        Vec::new(),
    );

    let analysis = perform_comprehensive_analysis(&data);
    let distances: Vec<_> = analysis.laps.iter().map(|lap| lap.total_distance).collect();
    assert_eq!(distances, vec![Some(1.0), Some(2.0), Some(3.0)]);
    assert_eq!(analysis.session.unwrap().total_distance, Some(30.0));
}

#[test]
fn test_heart_rate_filter() {
    let data = ride(
        vec![Session {
            laps: vec![lap_with(&[Some(0), Some(50), None, Some(51), Some(120)], 1.0)],
            ..Session::default()
        }],
        Vec::new(),
    );

    let hr = perform_comprehensive_analysis(&data).heart_rate.unwrap();
    assert_eq!(hr.data_points, 2);
    assert_eq!(hr.min, 51);
    assert_eq!(hr.max, 120);
}

#[test]
fn test_only_dropouts_yield_null_heart_rate() {
    let data = ride(
        vec![Session {
            laps: vec![lap_with(&[Some(0), Some(50), None], 1.0)],
            ..Session::default()
        }],
        Vec::new(),
    );

    let analysis = perform_comprehensive_analysis(&data);
    assert!(analysis.heart_rate.is_none());
    assert_eq!(serde_json::to_value(&analysis).unwrap()["heartRate"], json!(null));
}

#[test]
fn test_zone_boundaries_are_exact() {
    assert_eq!(zone_for(90, 100), Some(5));
    assert_eq!(zone_for(89, 100), Some(4));
    assert_eq!(zone_for(80, 100), Some(4));
    assert_eq!(zone_for(70, 100), Some(3));
    assert_eq!(zone_for(60, 100), Some(2));
    assert_eq!(zone_for(50, 100), Some(1));
    assert_eq!(zone_for(49, 100), None);

    let hr = perform_comprehensive_analysis(&single_lap_ride(&[90, 100, 60, 55]))
        .heart_rate
        .unwrap();
    assert_eq!(hr.zones.as_array(), [1, 1, 0, 0, 2]);
}

#[test]
fn test_drift_sign() {
    let increasing = perform_comprehensive_analysis(&single_lap_ride(&[100, 100, 110, 110]));
    assert_eq!(increasing.heart_rate.unwrap().drift, "10.0");

    let decreasing = perform_comprehensive_analysis(&single_lap_ride(&[120, 120, 102, 102]));
    assert_eq!(decreasing.heart_rate.unwrap().drift, "-15.0");

    let constant = perform_comprehensive_analysis(&single_lap_ride(&[140, 140, 140]));
    assert_eq!(constant.heart_rate.unwrap().drift, "0.0");

    let single = perform_comprehensive_analysis(&single_lap_ride(&[140]));
    assert_eq!(single.heart_rate.unwrap().drift, "0.0");
}

#[test]
fn test_analysis_round_trips_through_json() {
    let analysis = perform_comprehensive_analysis(&single_lap_ride(&[120, 130, 140]));
    let json = serde_json::to_string(&analysis).unwrap();
    let parsed: ComprehensiveAnalysis = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, analysis);
}

fn arbitrary_ride() -> impl Strategy<Value = FitData> {
    let lap = prop::collection::vec(prop::option::of(0u16..=220), 0..20)
        .prop_map(|values| lap_with(&values, 1.0));
    let session = prop::collection::vec(lap, 0..4).prop_map(|laps| Session {
        laps,
        ..Session::default()
    });
    prop::collection::vec(session, 0..3).prop_map(|sessions| ride(sessions, Vec::new()))
}

proptest! {
    #[test]
    fn prop_analysis_is_idempotent(data in arbitrary_ride()) {
        prop_assert_eq!(
            perform_comprehensive_analysis(&data),
            perform_comprehensive_analysis(&data)
        );
    }

    #[test]
    fn prop_heart_rate_present_iff_qualifying_sample(data in arbitrary_ride()) {
        let analysis = perform_comprehensive_analysis(&data);
        let qualifying = analysis
            .laps
            .iter()
            .flat_map(|lap| lap.records.iter())
            .filter(|record| record.heart_rate.map(|hr| hr > 50).unwrap_or(false))
            .count();

        prop_assert_eq!(analysis.heart_rate.is_some(), qualifying > 0);
        if let Some(hr) = analysis.heart_rate {
            prop_assert_eq!(hr.data_points, qualifying);
            prop_assert!(hr.zones.total() <= hr.data_points);
            prop_assert!(hr.min <= hr.avg && hr.avg <= hr.max);
        }
    }

    #[test]
    fn prop_lap_count_matches_sessions(data in arbitrary_ride()) {
        let expected: usize = data
            .activity
            .as_ref()
            .map(|a| a.sessions.iter().map(|s| s.laps.len()).sum())
            .unwrap_or(0);
        prop_assert_eq!(perform_comprehensive_analysis(&data).laps.len(), expected);
    }
}
