use crate::models::{DeviceInfo, FitData, Lap, Record, Session};

/// Borrowed flat views over a decoded activity tree
#[derive(Debug, Clone, Default)]
pub struct FlattenedActivity<'a> {
    /// First session of the activity
    pub session: Option<&'a Session>,

    /// Every lap of every session, session order then lap order
    pub laps: Vec<&'a Lap>,

    /// Every record of every lap, lap order then record order
    pub records: Vec<&'a Record>,

    pub device_infos: &'a [DeviceInfo],
}

/// Flatten the activity tree without filtering or transforming any value
///
/// A missing activity degrades to empty collections.
pub fn flatten(data: &FitData) -> FlattenedActivity<'_> {
    let Some(activity) = data.activity.as_ref() else {
        return FlattenedActivity::default();
    };

    let laps: Vec<&Lap> = activity
        .sessions
        .iter()
        .flat_map(|session| session.laps.iter())
        .collect();

    let records = laps.iter().copied().flat_map(|lap| lap.records.iter()).collect();

    FlattenedActivity {
        session: activity.sessions.first(),
        laps,
        records,
        device_infos: &activity.device_infos,
    }
}
