//! Statistics engine: four independent stat groups over a (filtered) dataset.
//!
//! Every group returns a [`StatResult`] so an empty filter result surfaces as
//! [`StatsError::EmptyDataset`] instead of a panic, and is wrapped in
//! [`Timed`] to carry its own wall-clock cost.
//!
//! [`StatsError::EmptyDataset`]: crate::error::StatsError::EmptyDataset

pub mod frequency;
pub mod groups;

use std::time::{Duration, Instant};

use log::debug;
use serde::{Serialize, Serializer};

pub use frequency::{mode, value_counts, Modal};
pub use groups::{
    duration_stats, station_stats, time_stats, user_stats, BirthYearStats, CategoryCount,
    DurationStats, StationPair, StationStats, TimeStats, UserStats,
};

use crate::data::model::Dataset;
use crate::error::StatResult;

/// A computed value and how long it took.
#[derive(Debug, Clone, Serialize)]
pub struct Timed<T> {
    pub value: T,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Run `f` and record its wall-clock time.
pub fn timed<T>(label: &str, f: impl FnOnce() -> T) -> Timed<T> {
    let start = Instant::now();
    let value = f();
    let elapsed = start.elapsed();
    debug!("{label} took {elapsed:?}");
    Timed { value, elapsed }
}

/// All four stat groups for one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub trips: usize,
    pub time: Timed<StatResult<TimeStats>>,
    pub station: Timed<StatResult<StationStats>>,
    pub duration: Timed<StatResult<DurationStats>>,
    pub user: Timed<StatResult<UserStats>>,
}

impl StatsReport {
    pub fn compute(dataset: &Dataset) -> Self {
        StatsReport {
            trips: dataset.len(),
            time: timed("time stats", || time_stats(dataset)),
            station: timed("station stats", || station_stats(dataset)),
            duration: timed("duration stats", || duration_stats(dataset)),
            user: timed("user stats", || user_stats(dataset)),
        }
    }
}
