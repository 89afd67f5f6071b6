use log::debug;
use serde::Serialize;

use super::frequency::{mode, value_counts, Modal};
use crate::data::model::{Dataset, OptionalColumn};
use crate::error::{StatResult, StatsError};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Most frequent times of travel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStats {
    pub month: Modal<String>,
    pub day_of_week: Modal<String>,
    pub start_hour: Modal<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StationPair {
    pub start: String,
    pub end: String,
}

/// Most popular stations and trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    pub start_station: Modal<String>,
    pub end_station: Modal<String>,
    pub trip: Modal<StationPair>,
}

/// Total and average trip duration, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub trips: usize,
    pub total_secs: f64,
    pub mean_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub most_recent: i32,
    pub most_common: i32,
}

/// Rider breakdown. Optional parts are `None` when the city lacks the
/// column; `birth_year` is also `None` when the column has no values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_types: Vec<CategoryCount>,
    pub gender: Option<Vec<CategoryCount>>,
    pub birth_year: Option<BirthYearStats>,
}

// ---------------------------------------------------------------------------
// Computations
// ---------------------------------------------------------------------------

fn non_empty(dataset: &Dataset) -> StatResult<()> {
    if dataset.is_empty() {
        Err(StatsError::EmptyDataset)
    } else {
        Ok(())
    }
}

pub fn time_stats(dataset: &Dataset) -> StatResult<TimeStats> {
    non_empty(dataset)?;
    let trips = &dataset.trips;
    Ok(TimeStats {
        month: mode(trips.iter().map(|t| t.month_name()))?.map(str::to_string),
        day_of_week: mode(trips.iter().map(|t| t.day_name()))?.map(str::to_string),
        start_hour: mode(trips.iter().map(|t| t.hour()))?,
    })
}

/// Blank station cells are skipped; a trip counts towards the pair only when
/// both of its stations are known.
pub fn station_stats(dataset: &Dataset) -> StatResult<StationStats> {
    non_empty(dataset)?;
    let trips = &dataset.trips;
    let trip = mode(
        trips
            .iter()
            .filter_map(|t| Some((t.start_station.as_deref()?, t.end_station.as_deref()?))),
    )?
    .map(|(start, end)| StationPair {
        start: start.to_string(),
        end: end.to_string(),
    });

    Ok(StationStats {
        start_station: mode(trips.iter().filter_map(|t| t.start_station.as_deref()))?
            .map(str::to_string),
        end_station: mode(trips.iter().filter_map(|t| t.end_station.as_deref()))?
            .map(str::to_string),
        trip,
    })
}

pub fn duration_stats(dataset: &Dataset) -> StatResult<DurationStats> {
    non_empty(dataset)?;
    let total_secs: f64 = dataset.trips.iter().map(|t| t.trip_duration).sum();
    Ok(DurationStats {
        trips: dataset.len(),
        total_secs,
        mean_secs: total_secs / dataset.len() as f64,
    })
}

pub fn user_stats(dataset: &Dataset) -> StatResult<UserStats> {
    non_empty(dataset)?;
    let trips = &dataset.trips;

    let counts = |values: Vec<&str>| -> Vec<CategoryCount> {
        value_counts(values)
            .into_iter()
            .map(|(value, count)| CategoryCount {
                value: value.to_string(),
                count,
            })
            .collect()
    };

    let user_types = counts(trips.iter().filter_map(|t| t.user_type.as_deref()).collect());

    let gender = dataset
        .has_column(OptionalColumn::Gender)
        .then(|| counts(trips.iter().filter_map(|t| t.gender.as_deref()).collect()));

    let birth_year = if dataset.has_column(OptionalColumn::BirthYear) {
        let years: Vec<i32> = trips.iter().filter_map(|t| t.birth_year).collect();
        let stats = birth_year_stats(&years);
        if stats.is_none() {
            debug!("{} has a birth year column but no values", dataset.city);
        }
        stats
    } else {
        None
    };

    Ok(UserStats {
        user_types,
        gender,
        birth_year,
    })
}

fn birth_year_stats(years: &[i32]) -> Option<BirthYearStats> {
    Some(BirthYearStats {
        earliest: *years.iter().min()?,
        most_recent: *years.iter().max()?,
        most_common: mode(years.iter().copied()).ok()?.value,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::{ColumnSet, TripRecord};

    fn trip(month: u32, day: u32, hour: u32, from: &str, to: &str, secs: f64) -> TripRecord {
        let start = NaiveDate::from_ymd_opt(2017, month, day)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap();
        TripRecord::new(start, from, to, secs)
    }

    fn dataset(columns: ColumnSet, trips: Vec<TripRecord>) -> Dataset {
        Dataset::new("chicago", columns, trips)
    }

    #[test]
    fn duration_sum_and_mean() {
        let ds = dataset(
            ColumnSet::none(),
            vec![
                trip(1, 2, 8, "A", "B", 100.0),
                trip(1, 3, 9, "A", "B", 200.0),
                trip(1, 4, 10, "A", "B", 300.0),
            ],
        );
        let stats = duration_stats(&ds).unwrap();
        assert_eq!(stats.trips, 3);
        assert_eq!(stats.total_secs, 600.0);
        assert_eq!(stats.mean_secs, 200.0);
    }

    #[test]
    fn most_frequent_station_pair() {
        let ds = dataset(
            ColumnSet::none(),
            vec![
                trip(1, 2, 8, "A", "B", 1.0),
                trip(1, 2, 8, "A", "B", 1.0),
                trip(1, 2, 8, "A", "C", 1.0),
            ],
        );
        let stats = station_stats(&ds).unwrap();
        assert_eq!(
            stats.trip,
            Modal {
                value: StationPair {
                    start: "A".to_string(),
                    end: "B".to_string()
                },
                count: 2
            }
        );
        assert_eq!(stats.start_station.value, "A");
        assert_eq!(stats.start_station.count, 3);
        assert_eq!(stats.end_station.value, "B");
    }

    #[test]
    fn blank_stations_are_left_out_of_station_modes() {
        let ds = dataset(
            ColumnSet::none(),
            vec![
                trip(1, 2, 8, "", "", 1.0),
                trip(1, 2, 8, "", "", 1.0),
                trip(1, 2, 8, "A", "", 1.0),
                trip(1, 2, 8, "A", "C", 1.0),
            ],
        );
        let stats = station_stats(&ds).unwrap();
        assert_eq!(stats.start_station, Modal { value: "A".to_string(), count: 2 });
        assert_eq!(stats.end_station, Modal { value: "C".to_string(), count: 1 });
        assert_eq!(stats.trip.value.start, "A");
        assert_eq!(stats.trip.value.end, "C");
        assert_eq!(stats.trip.count, 1);
    }

    #[test]
    fn pair_ties_go_to_first_group_seen() {
        let ds = dataset(
            ColumnSet::none(),
            vec![
                trip(1, 2, 8, "Z", "Y", 1.0),
                trip(1, 2, 8, "A", "B", 1.0),
                trip(1, 2, 8, "A", "B", 1.0),
                trip(1, 2, 8, "Z", "Y", 1.0),
            ],
        );
        let pair = station_stats(&ds).unwrap().trip.value;
        assert_eq!(pair.start, "Z");
        assert_eq!(pair.end, "Y");
    }

    #[test]
    fn time_modes() {
        // 2017-01-02 and 2017-01-09 are Mondays, 2017-02-01 a Wednesday.
        let ds = dataset(
            ColumnSet::none(),
            vec![
                trip(1, 2, 17, "A", "B", 1.0),
                trip(1, 9, 17, "A", "B", 1.0),
                trip(2, 1, 8, "A", "B", 1.0),
            ],
        );
        let stats = time_stats(&ds).unwrap();
        assert_eq!(stats.month.value, "january");
        assert_eq!(stats.day_of_week.value, "monday");
        assert_eq!(stats.start_hour, Modal { value: 17, count: 2 });
    }

    #[test]
    fn empty_dataset_is_reported_not_panicked() {
        let ds = dataset(ColumnSet::all(), Vec::new());
        assert_eq!(time_stats(&ds), Err(StatsError::EmptyDataset));
        assert_eq!(station_stats(&ds), Err(StatsError::EmptyDataset));
        assert_eq!(duration_stats(&ds), Err(StatsError::EmptyDataset));
        assert_eq!(user_stats(&ds), Err(StatsError::EmptyDataset));
    }

    #[test]
    fn user_stats_follow_column_presence() {
        let trips = vec![
            trip(1, 2, 8, "A", "B", 1.0)
                .with_user_type("Subscriber")
                .with_gender("Female")
                .with_birth_year(1990),
            trip(1, 2, 8, "A", "B", 1.0)
                .with_user_type("Customer")
                .with_birth_year(1975),
            trip(1, 2, 8, "A", "B", 1.0)
                .with_user_type("Subscriber")
                .with_gender("Male")
                .with_birth_year(1990),
            trip(1, 2, 8, "A", "B", 1.0).with_gender("Male"),
        ];

        let full = user_stats(&dataset(ColumnSet::all(), trips.clone())).unwrap();
        assert_eq!(
            full.user_types,
            vec![
                CategoryCount { value: "Subscriber".to_string(), count: 2 },
                CategoryCount { value: "Customer".to_string(), count: 1 },
            ]
        );
        assert_eq!(
            full.gender,
            Some(vec![
                CategoryCount { value: "Male".to_string(), count: 2 },
                CategoryCount { value: "Female".to_string(), count: 1 },
            ])
        );
        assert_eq!(
            full.birth_year,
            Some(BirthYearStats {
                earliest: 1975,
                most_recent: 1990,
                most_common: 1990
            })
        );

        let bare = user_stats(&dataset(ColumnSet::none(), trips)).unwrap();
        assert_eq!(bare.user_types.len(), 2);
        assert_eq!(bare.gender, None);
        assert_eq!(bare.birth_year, None);
    }

    #[test]
    fn birth_year_column_without_values() {
        let ds = dataset(
            ColumnSet::none().with(OptionalColumn::BirthYear),
            vec![trip(1, 2, 8, "A", "B", 1.0).with_user_type("Customer")],
        );
        assert_eq!(user_stats(&ds).unwrap().birth_year, None);
    }
}
