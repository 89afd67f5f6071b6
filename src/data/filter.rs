use std::fmt;
use std::str::FromStr;

use log::{debug, warn};

use super::model::{Dataset, OptionalColumn, TripRecord, DAY_NAMES, MONTH_NAMES};
use crate::config::{normalize_city, CityTable};
use crate::error::DataError;

// ---------------------------------------------------------------------------
// Selection – "all" or one lowercase value
// ---------------------------------------------------------------------------

/// A single-valued filter. `All` means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// Trim and lowercase free text; empty input and `"all"` mean no filter.
    pub fn parse(input: &str) -> Self {
        let value = input.trim().to_lowercase();
        if value.is_empty() || value == "all" {
            Selection::All
        } else {
            Selection::Only(value)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// Case-insensitive match. `All` accepts everything.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value.to_lowercase() == *wanted,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("all"),
            Selection::Only(v) => f.write_str(v),
        }
    }
}

// ---------------------------------------------------------------------------
// TimeBucket – fixed half-open hour ranges covering the day
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeBucket {
    /// [6, 12)
    Morning,
    /// [12, 18)
    Afternoon,
    /// [18, 24)
    Evening,
    /// [0, 6)
    Night,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 4] = [
        TimeBucket::Morning,
        TimeBucket::Afternoon,
        TimeBucket::Evening,
        TimeBucket::Night,
    ];

    /// Half-open `[start, end)` hour range.
    pub fn hours(self) -> (u32, u32) {
        match self {
            TimeBucket::Morning => (6, 12),
            TimeBucket::Afternoon => (12, 18),
            TimeBucket::Evening => (18, 24),
            TimeBucket::Night => (0, 6),
        }
    }

    pub fn contains(self, hour: u32) -> bool {
        let (start, end) = self.hours();
        (start..end).contains(&hour)
    }

    /// The bucket an hour of day falls into; `None` only for hours ≥ 24.
    pub fn for_hour(hour: u32) -> Option<TimeBucket> {
        Self::ALL.into_iter().find(|b| b.contains(hour))
    }

    pub fn name(self) -> &'static str {
        match self {
            TimeBucket::Morning => "morning",
            TimeBucket::Afternoon => "afternoon",
            TimeBucket::Evening => "evening",
            TimeBucket::Night => "night",
        }
    }
}

impl FromStr for TimeBucket {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|b| b.name() == wanted)
            .ok_or_else(|| DataError::UnknownTimeBucket(s.trim().to_string()))
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// FilterSpec
// ---------------------------------------------------------------------------

/// The user's filter choices for one session iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub city: String,
    pub month: Selection,
    pub day: Selection,
    /// `None` means all hours.
    pub time_bucket: Option<TimeBucket>,
    pub bike_type: Selection,
}

impl FilterSpec {
    /// A spec with every filter set to "all". The city must be in `table`.
    pub fn new(city: &str, table: &CityTable) -> Result<Self, DataError> {
        if !table.contains(city) {
            return Err(DataError::UnknownCity(city.trim().to_string()));
        }
        Ok(FilterSpec {
            city: normalize_city(city),
            month: Selection::All,
            day: Selection::All,
            time_bucket: None,
            bike_type: Selection::All,
        })
    }

    pub fn month(mut self, input: &str) -> Self {
        self.month = Selection::parse(input);
        if let Selection::Only(m) = &self.month {
            if !MONTH_NAMES.contains(&m.as_str()) {
                warn!("'{m}' is not a month name; the month filter will match nothing");
            }
        }
        self
    }

    pub fn day(mut self, input: &str) -> Self {
        self.day = Selection::parse(input);
        if let Selection::Only(d) = &self.day {
            if !DAY_NAMES.contains(&d.as_str()) {
                warn!("'{d}' is not a day name; the day filter will match nothing");
            }
        }
        self
    }

    /// `"all"` (or empty) clears the bucket; anything else must name one.
    pub fn time_of_day(mut self, input: &str) -> Result<Self, DataError> {
        self.time_bucket = match Selection::parse(input) {
            Selection::All => None,
            Selection::Only(name) => Some(name.parse()?),
        };
        Ok(self)
    }

    pub fn bike_type(mut self, input: &str) -> Self {
        self.bike_type = Selection::parse(input);
        self
    }

    /// True when no predicate is active.
    pub fn is_unfiltered(&self) -> bool {
        self.month.is_all()
            && self.day.is_all()
            && self.time_bucket.is_none()
            && self.bike_type.is_all()
    }
}

// ---------------------------------------------------------------------------
// Applying a spec
// ---------------------------------------------------------------------------

/// Return indices of trips that pass every active filter, in source order.
///
/// Predicates are ANDed in the order month → day → time bucket → bike type.
/// The bike-type predicate is skipped entirely when the dataset has no
/// bike-type column.
pub fn filtered_indices(dataset: &Dataset, spec: &FilterSpec) -> Vec<usize> {
    let bike_filter_active =
        !spec.bike_type.is_all() && dataset.has_column(OptionalColumn::BikeType);
    if !spec.bike_type.is_all() && !bike_filter_active {
        debug!(
            "{} has no bike type column; ignoring bike type '{}'",
            dataset.city, spec.bike_type
        );
    }

    dataset
        .trips
        .iter()
        .enumerate()
        .filter(|(_, trip)| passes(trip, spec, bike_filter_active))
        .map(|(i, _)| i)
        .collect()
}

fn passes(trip: &TripRecord, spec: &FilterSpec, bike_filter_active: bool) -> bool {
    if !spec.month.matches(trip.month_name()) {
        return false;
    }
    if !spec.day.matches(trip.day_name()) {
        return false;
    }
    if let Some(bucket) = spec.time_bucket {
        if !bucket.contains(trip.hour()) {
            return false;
        }
    }
    if bike_filter_active {
        // A trip with no recorded bike type never matches a specific type.
        match &trip.bike_type {
            Some(bike) => spec.bike_type.matches(bike),
            None => false,
        }
    } else {
        true
    }
}

/// Produce the filtered view as a new dataset. `dataset` is left untouched.
pub fn apply(dataset: &Dataset, spec: &FilterSpec) -> Dataset {
    let indices = filtered_indices(dataset, spec);
    debug!(
        "Filter {:?} kept {} of {} trips",
        spec,
        indices.len(),
        dataset.len()
    );
    dataset.subset(&indices)
}
