use std::path::Path;

use bikeshare::config::{AppConfig, CityTable};
use bikeshare::data::filter::{apply, FilterSpec};
use bikeshare::data::loader::{load_city, LoadOptions};
use bikeshare::data::model::OptionalColumn;
use bikeshare::error::{DataError, StatsError};
use bikeshare::session::{spec_from_config, Session};
use clap::Parser;

const CHICAGO: &str = "\
Start Time,End Time,Trip Duration,Start Station,End Station,User Type,Gender,Birth Year,Bike Type
2017-01-02 08:05:00,2017-01-02 08:10:00,100,Canal St,Clark St,Subscriber,Male,1980.0,Standard
2017-01-02 08:20:00,2017-01-02 08:30:00,200,Canal St,Clark St,Subscriber,Female,1990.0,Electric
2017-01-03 19:00:00,2017-01-03 19:05:00,300,Canal St,Lake St,Customer,,,Standard
2017-01-04 02:00:00,2017-01-04 02:10:00,400,Lake St,Canal St,Subscriber,Male,1980.0,Standard
not-a-date,2017-01-04 02:10:00,500,Lake St,Canal St,Subscriber,Male,1980.0,Standard
";

const WASHINGTON: &str = "\
Start Time,End Time,Trip Duration,Start Station,End Station,User Type
2017-01-05 07:00:00,2017-01-05 07:10:00,100,Lincoln Memorial,Union Station,Subscriber
2017-01-05 13:00:00,2017-01-05 13:10:00,200,Lincoln Memorial,Union Station,Customer
2017-01-06 13:00:00,2017-01-06 13:10:00,300,Union Station,Lincoln Memorial,Subscriber
";

fn fixture_table(dir: &Path) -> CityTable {
    std::fs::write(dir.join("chicago.csv"), CHICAGO).unwrap();
    std::fs::write(dir.join("washington.csv"), WASHINGTON).unwrap();
    CityTable::default().with_data_dir(dir)
}

#[test]
fn test_full_pipeline_over_unfiltered_city() {
    let dir = tempfile::tempdir().unwrap();
    let table = fixture_table(dir.path());
    let session = Session::new(&table, LoadOptions::default());

    let spec = FilterSpec::new("chicago", &table).unwrap();
    let analysis = session.evaluate(&spec).unwrap();

    assert_eq!(analysis.skipped_rows, 1);
    assert_eq!(analysis.filtered.len(), 4);

    let time = analysis.report.time.value.as_ref().unwrap();
    assert_eq!(time.month.value, "january");
    assert_eq!(time.day_of_week.value, "monday");
    assert_eq!(time.start_hour.value, 8);

    let station = analysis.report.station.value.as_ref().unwrap();
    assert_eq!(station.start_station.value, "Canal St");
    assert_eq!(station.trip.value.start, "Canal St");
    assert_eq!(station.trip.value.end, "Clark St");
    assert_eq!(station.trip.count, 2);

    let duration = analysis.report.duration.value.as_ref().unwrap();
    assert_eq!(duration.total_secs, 1000.0);
    assert_eq!(duration.mean_secs, 250.0);

    let users = analysis.report.user.value.as_ref().unwrap();
    assert_eq!(users.user_types[0].value, "Subscriber");
    assert_eq!(users.user_types[0].count, 3);
    let years = users.birth_year.as_ref().unwrap();
    assert_eq!((years.earliest, years.most_recent, years.most_common), (1980, 1990, 1980));
}

#[test]
fn test_filtered_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let table = fixture_table(dir.path());
    let session = Session::new(&table, LoadOptions::default());

    let spec = FilterSpec::new("Chicago", &table)
        .unwrap()
        .day("Monday")
        .time_of_day("morning")
        .unwrap()
        .bike_type("electric");
    let analysis = session.evaluate(&spec).unwrap();

    assert_eq!(analysis.filtered.len(), 1);
    let duration = analysis.report.duration.value.as_ref().unwrap();
    assert_eq!(duration.total_secs, 200.0);
}

#[test]
fn test_empty_filter_result_reports_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let table = fixture_table(dir.path());
    let session = Session::new(&table, LoadOptions::default());

    let spec = FilterSpec::new("chicago", &table).unwrap().month("february");
    let analysis = session.evaluate(&spec).unwrap();

    assert!(analysis.filtered.is_empty());
    assert_eq!(analysis.report.time.value, Err(StatsError::EmptyDataset));
    assert_eq!(analysis.report.station.value, Err(StatsError::EmptyDataset));
    assert_eq!(analysis.report.duration.value, Err(StatsError::EmptyDataset));
}

#[test]
fn test_bike_type_ignored_for_city_without_column() {
    let dir = tempfile::tempdir().unwrap();
    let table = fixture_table(dir.path());

    let loaded = load_city(&table, "washington", LoadOptions::default()).unwrap();
    assert!(!loaded.dataset.has_column(OptionalColumn::BikeType));
    assert!(!loaded.dataset.has_column(OptionalColumn::Gender));

    let spec = FilterSpec::new("washington", &table)
        .unwrap()
        .bike_type("electric");
    assert_eq!(apply(&loaded.dataset, &spec), loaded.dataset);

    let users = Session::new(&table, LoadOptions::default())
        .evaluate(&spec)
        .unwrap()
        .report
        .user
        .value
        .unwrap();
    assert_eq!(users.gender, None);
    assert_eq!(users.birth_year, None);
}

#[test]
fn test_strict_load_fails_on_malformed_row() {
    let dir = tempfile::tempdir().unwrap();
    let table = fixture_table(dir.path());

    let err = load_city(&table, "chicago", LoadOptions { strict: true }).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DataError>(),
        Some(DataError::MalformedRecord { row: 4, .. })
    ));
}

#[test]
fn test_missing_city_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let table = fixture_table(dir.path());
    let session = Session::new(&table, LoadOptions::default());

    let spec = FilterSpec::new("new york city", &table).unwrap();
    assert!(session.evaluate(&spec).is_err());
}

#[test]
fn test_spec_from_cli_flags() {
    let table = CityTable::default();
    let config = AppConfig::try_parse_from([
        "bikeshare-explorer",
        "--city",
        "Washington",
        "--month",
        "MARCH",
        "--time-of-day",
        "Evening",
    ])
    .unwrap();

    let spec = spec_from_config(&config, &table).unwrap();
    assert_eq!(spec.city, "washington");
    assert_eq!(spec.month.to_string(), "march");
    assert_eq!(spec.time_bucket.map(|b| b.name()), Some("evening"));
    assert!(spec.bike_type.is_all());

    let bad = AppConfig::try_parse_from([
        "bikeshare-explorer",
        "--city",
        "washington",
        "--time-of-day",
        "dusk",
    ])
    .unwrap();
    assert!(spec_from_config(&bad, &table).is_err());
}
