use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Lowercase month names, indexed by `month0()`.
pub const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Lowercase weekday names, indexed by `num_days_from_monday()`.
pub const DAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

// ---------------------------------------------------------------------------
// OptionalColumn / ColumnSet – which city-dependent columns exist
// ---------------------------------------------------------------------------

/// Columns that only some city datasets carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionalColumn {
    Gender,
    BirthYear,
    BikeType,
}

impl OptionalColumn {
    pub const ALL: [OptionalColumn; 3] = [
        OptionalColumn::Gender,
        OptionalColumn::BirthYear,
        OptionalColumn::BikeType,
    ];

    /// Header text as it appears in the source files.
    pub fn header(self) -> &'static str {
        match self {
            OptionalColumn::Gender => "Gender",
            OptionalColumn::BirthYear => "Birth Year",
            OptionalColumn::BikeType => "Bike Type",
        }
    }
}

impl fmt::Display for OptionalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Capability set describing the optional columns of one dataset.
/// Detected at load time from the file header, never from row contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnSet {
    gender: bool,
    birth_year: bool,
    bike_type: bool,
}

impl ColumnSet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            gender: true,
            birth_year: true,
            bike_type: true,
        }
    }

    pub fn with(mut self, column: OptionalColumn) -> Self {
        self.insert(column);
        self
    }

    pub fn insert(&mut self, column: OptionalColumn) {
        *self.slot(column) = true;
    }

    pub fn has(&self, column: OptionalColumn) -> bool {
        match column {
            OptionalColumn::Gender => self.gender,
            OptionalColumn::BirthYear => self.birth_year,
            OptionalColumn::BikeType => self.bike_type,
        }
    }

    /// Present columns in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = OptionalColumn> + '_ {
        OptionalColumn::ALL
            .into_iter()
            .filter(move |c| self.has(*c))
    }

    fn slot(&mut self, column: OptionalColumn) -> &mut bool {
        match column {
            OptionalColumn::Gender => &mut self.gender,
            OptionalColumn::BirthYear => &mut self.birth_year,
            OptionalColumn::BikeType => &mut self.bike_type,
        }
    }
}

// ---------------------------------------------------------------------------
// TripRecord – one row of a city dataset
// ---------------------------------------------------------------------------

/// A single bike trip.
///
/// Calendar fields are derived from `start_time` once, in [`TripRecord::new`],
/// and are only exposed read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub start_time: NaiveDateTime,
    /// `None` when the source cell was blank.
    pub start_station: Option<String>,
    pub end_station: Option<String>,
    /// Seconds, never negative.
    pub trip_duration: f64,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    pub bike_type: Option<String>,
    month_name: &'static str,
    day_name: &'static str,
    hour: u32,
}

impl TripRecord {
    pub fn new(
        start_time: NaiveDateTime,
        start_station: impl Into<String>,
        end_station: impl Into<String>,
        trip_duration: f64,
    ) -> Self {
        Self {
            month_name: MONTH_NAMES[start_time.month0() as usize],
            day_name: DAY_NAMES[start_time.weekday().num_days_from_monday() as usize],
            hour: start_time.hour(),
            start_time,
            start_station: non_blank(start_station.into()),
            end_station: non_blank(end_station.into()),
            trip_duration,
            user_type: None,
            gender: None,
            birth_year: None,
            bike_type: None,
        }
    }

    pub fn with_user_type(mut self, user_type: impl Into<String>) -> Self {
        self.user_type = Some(user_type.into());
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_birth_year(mut self, year: i32) -> Self {
        self.birth_year = Some(year);
        self
    }

    pub fn with_bike_type(mut self, bike_type: impl Into<String>) -> Self {
        self.bike_type = Some(bike_type.into());
        self
    }

    /// Lowercase month name, e.g. `"june"`.
    pub fn month_name(&self) -> &'static str {
        self.month_name
    }

    /// Lowercase weekday name, e.g. `"monday"`.
    pub fn day_name(&self) -> &'static str {
        self.day_name
    }

    /// Hour of the start time, 0–23.
    pub fn hour(&self) -> u32 {
        self.hour
    }
}

fn non_blank(name: String) -> Option<String> {
    Some(name).filter(|n| !n.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Dataset – the trips of one city
// ---------------------------------------------------------------------------

/// An ordered set of trips sharing one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub city: String,
    pub columns: ColumnSet,
    pub trips: Vec<TripRecord>,
}

impl Dataset {
    pub fn new(city: impl Into<String>, columns: ColumnSet, trips: Vec<TripRecord>) -> Self {
        Dataset {
            city: city.into(),
            columns,
            trips,
        }
    }

    /// Copy the rows at `indices` (in the given order) into a new dataset
    /// with the same schema.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            city: self.city.clone(),
            columns: self.columns,
            trips: indices.iter().map(|&i| self.trips[i].clone()).collect(),
        }
    }

    pub fn has_column(&self, column: OptionalColumn) -> bool {
        self.columns.has(column)
    }

    /// Number of trips.
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 15, 0)
            .unwrap()
    }

    #[test]
    fn derives_calendar_fields() {
        // 2017-06-23 was a Friday.
        let trip = TripRecord::new(at(2017, 6, 23, 15), "A", "B", 321.0);
        assert_eq!(trip.month_name(), "june");
        assert_eq!(trip.day_name(), "friday");
        assert_eq!(trip.hour(), 15);
    }

    #[test]
    fn derives_midnight_and_sunday() {
        // 2017-01-01 was a Sunday.
        let trip = TripRecord::new(at(2017, 1, 1, 0), "A", "B", 1.0);
        assert_eq!(trip.month_name(), "january");
        assert_eq!(trip.day_name(), "sunday");
        assert_eq!(trip.hour(), 0);
    }

    #[test]
    fn blank_station_names_are_missing() {
        let trip = TripRecord::new(at(2017, 1, 1, 0), "", " ", 1.0);
        assert_eq!(trip.start_station, None);
        assert_eq!(trip.end_station, None);
    }

    #[test]
    fn column_set_reports_presence() {
        let cols = ColumnSet::none().with(OptionalColumn::BikeType);
        assert!(cols.has(OptionalColumn::BikeType));
        assert!(!cols.has(OptionalColumn::Gender));
        assert_eq!(cols.iter().collect::<Vec<_>>(), vec![OptionalColumn::BikeType]);
        assert_eq!(ColumnSet::all().iter().count(), 3);
    }

    #[test]
    fn subset_keeps_schema_and_order() {
        let trips = vec![
            TripRecord::new(at(2017, 1, 1, 1), "A", "B", 1.0),
            TripRecord::new(at(2017, 1, 2, 2), "C", "D", 2.0),
            TripRecord::new(at(2017, 1, 3, 3), "E", "F", 3.0),
        ];
        let ds = Dataset::new("chicago", ColumnSet::all(), trips);
        let sub = ds.subset(&[2, 0]);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.columns, ds.columns);
        assert_eq!(sub.trips[0].start_station.as_deref(), Some("E"));
        assert_eq!(sub.trips[1].start_station.as_deref(), Some("A"));
        assert_eq!(ds.len(), 3);
    }
}
