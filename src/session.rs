use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Select};
use log::warn;
use serde_json::json;

use crate::config::{AppConfig, CityTable};
use crate::data::filter::{apply, FilterSpec, TimeBucket};
use crate::data::loader::{load_city, LoadOptions};
use crate::data::model::{Dataset, DAY_NAMES, MONTH_NAMES};
use crate::pager::{render_page, RawPager};
use crate::report::{render_filters, render_report};
use crate::stats::StatsReport;

// ---------------------------------------------------------------------------
// Session – one load → filter → stats pass per iteration
// ---------------------------------------------------------------------------

/// Output of one session iteration.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub filtered: Dataset,
    pub report: StatsReport,
    /// Rows dropped by the loader as malformed.
    pub skipped_rows: usize,
}

/// Shared, read-only context for every iteration.
pub struct Session<'a> {
    table: &'a CityTable,
    options: LoadOptions,
}

impl<'a> Session<'a> {
    pub fn new(table: &'a CityTable, options: LoadOptions) -> Self {
        Session { table, options }
    }

    /// Load the spec's city, filter it, and compute every stat group.
    /// The unfiltered dataset is dropped before returning.
    pub fn evaluate(&self, spec: &FilterSpec) -> Result<Analysis> {
        let loaded = load_city(self.table, &spec.city, self.options)?;
        let filtered = apply(&loaded.dataset, spec);
        let report = StatsReport::compute(&filtered);
        Ok(Analysis {
            filtered,
            report,
            skipped_rows: loaded.malformed.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Non-interactive mode
// ---------------------------------------------------------------------------

/// Build a spec from command-line flags.
pub fn spec_from_config(config: &AppConfig, table: &CityTable) -> Result<FilterSpec> {
    let city = config.city.as_deref().context("no --city given")?;
    let spec = FilterSpec::new(city, table)?
        .month(&config.month)
        .day(&config.day)
        .time_of_day(&config.time_of_day)?
        .bike_type(&config.bike_type);
    Ok(spec)
}

/// Single pass driven by flags; prints the report and `raw_pages` pages.
pub fn run_once(config: &AppConfig, table: &CityTable) -> Result<()> {
    let spec = spec_from_config(config, table)?;
    let session = Session::new(table, LoadOptions { strict: config.strict });
    let analysis = session.evaluate(&spec)?;

    if config.json {
        let doc = json!({
            "filters": {
                "city": spec.city,
                "month": spec.month.to_string(),
                "day": spec.day.to_string(),
                "time_of_day": spec.time_bucket.map_or("all", |b| b.name()),
                "bike_type": spec.bike_type.to_string(),
            },
            "skipped_rows": analysis.skipped_rows,
            "stats": analysis.report,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        print_analysis(&spec, &analysis);
    }

    let mut pager = RawPager::default();
    for _ in 0..config.raw_pages {
        if !print_next_page(&mut pager, &analysis.filtered)? {
            break;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Interactive mode
// ---------------------------------------------------------------------------

/// Prompt for filters, report, offer raw rows, and repeat until the user
/// declines to restart.
pub fn run_interactive(table: &CityTable, options: LoadOptions) -> Result<()> {
    println!("Hello! Let's explore some US bikeshare data!");
    let session = Session::new(table, options);

    loop {
        let spec = prompt_filters(table)?;
        println!("{}", "-".repeat(40));

        match session.evaluate(&spec) {
            Ok(analysis) => {
                print_analysis(&spec, &analysis);
                page_interactively(&analysis.filtered)?;
            }
            Err(err) => eprintln!("Could not analyse {}: {err:#}", spec.city),
        }

        let restart = Confirm::new()
            .with_prompt("Would you like to restart?")
            .default(false)
            .interact()?;
        if !restart {
            break;
        }
    }
    Ok(())
}

fn prompt_filters(table: &CityTable) -> Result<FilterSpec> {
    let cities: Vec<&str> = table.cities().collect();
    let city_idx = Select::new()
        .with_prompt("Which city would you like to explore?")
        .items(&cities)
        .default(0)
        .interact()?;

    let month = select_with_all("Month", &MONTH_NAMES)?;
    let day = select_with_all("Day of week", &DAY_NAMES)?;
    let buckets = TimeBucket::ALL.map(TimeBucket::name);
    let time_of_day = select_with_all("Time of day", &buckets)?;

    let bike_type: String = Input::new()
        .with_prompt("Bike type (all, standard, electric)")
        .default("all".to_string())
        .interact_text()?;

    let spec = FilterSpec::new(cities[city_idx], table)?
        .month(month)
        .day(day)
        .time_of_day(time_of_day)?
        .bike_type(&bike_type);
    Ok(spec)
}

/// A `Select` whose first entry is "all".
fn select_with_all<'a>(prompt: &str, values: &[&'a str]) -> Result<&'a str> {
    let items: Vec<&str> = std::iter::once("all").chain(values.iter().copied()).collect();
    let idx = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact()?;
    Ok(items[idx])
}

fn page_interactively(dataset: &Dataset) -> Result<()> {
    let mut pager = RawPager::default();
    loop {
        let more = Confirm::new()
            .with_prompt("Do you want to see 5 lines of raw data?")
            .default(false)
            .interact()?;
        if !more || !print_next_page(&mut pager, dataset)? {
            return Ok(());
        }
    }
}

/// Print the next page; `false` when there is nothing left.
fn print_next_page(pager: &mut RawPager, dataset: &Dataset) -> Result<bool> {
    let first_row = pager.offset();
    match pager.next_page(dataset) {
        Some(rows) => {
            println!("{}", render_page(rows, first_row, dataset.columns)?);
            Ok(true)
        }
        None => {
            println!("No more rows to display.");
            Ok(false)
        }
    }
}

fn print_analysis(spec: &FilterSpec, analysis: &Analysis) {
    if analysis.skipped_rows > 0 {
        warn!(
            "{} malformed rows were skipped while loading {}",
            analysis.skipped_rows, spec.city
        );
    }
    println!("{}", render_filters(spec));
    println!("Trips matching filters: {}", analysis.filtered.len());
    print!("{}", render_report(&analysis.report, analysis.filtered.columns));
}
