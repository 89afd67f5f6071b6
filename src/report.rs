//! Plain-text rendering of a [`StatsReport`], one section per stat group.

use std::fmt::{self, Write};

use crate::data::filter::FilterSpec;
use crate::data::model::{ColumnSet, OptionalColumn};
use crate::error::StatResult;
use crate::stats::{
    CategoryCount, DurationStats, StationStats, StatsReport, TimeStats, Timed, UserStats,
};

const RULE: &str = "----------------------------------------";

pub fn render_filters(spec: &FilterSpec) -> String {
    let bucket = spec.time_bucket.map_or("all", |b| b.name());
    format!(
        "City: {} | Month: {} | Day: {} | Time of day: {} | Bike type: {}",
        spec.city, spec.month, spec.day, bucket, spec.bike_type
    )
}

/// Every stat group as text; `columns` decides whether a missing gender or
/// birth year section is reported as "no data" or left out.
pub struct ReportView<'a> {
    report: &'a StatsReport,
    columns: ColumnSet,
}

pub fn render_report(report: &StatsReport, columns: ColumnSet) -> ReportView<'_> {
    ReportView { report, columns }
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        section(
            f,
            "Calculating The Most Frequent Times of Travel...",
            &report.time,
            render_time,
        )?;
        section(
            f,
            "Calculating The Most Popular Stations and Trip...",
            &report.station,
            render_station,
        )?;
        section(
            f,
            "Calculating Trip Duration...",
            &report.duration,
            render_duration,
        )?;
        section(f, "Calculating User Stats...", &report.user, |out, stats| {
            render_user(out, stats, self.columns)
        })
    }
}

fn section<W: Write, T>(
    out: &mut W,
    title: &str,
    group: &Timed<StatResult<T>>,
    body: impl FnOnce(&mut W, &T) -> fmt::Result,
) -> fmt::Result {
    writeln!(out, "\n{title}\n")?;
    match &group.value {
        Ok(stats) => body(out, stats)?,
        Err(err) => writeln!(out, "{err}.")?,
    }
    writeln!(out, "\nThis took {:.6} seconds.", group.elapsed.as_secs_f64())?;
    writeln!(out, "{RULE}")
}

fn render_time<W: Write>(out: &mut W, stats: &TimeStats) -> fmt::Result {
    writeln!(out, "Most Common Month: {}", stats.month.value)?;
    writeln!(out, "Most Common Day of Week: {}", stats.day_of_week.value)?;
    writeln!(out, "Most Common Start Hour: {}", stats.start_hour.value)
}

fn render_station<W: Write>(out: &mut W, stats: &StationStats) -> fmt::Result {
    writeln!(
        out,
        "Most Commonly Used Start Station: {}",
        stats.start_station.value
    )?;
    writeln!(
        out,
        "Most Commonly Used End Station: {}",
        stats.end_station.value
    )?;
    writeln!(
        out,
        "Most Frequent Combination of Start Station and End Station Trip: {} -> {} ({} trips)",
        stats.trip.value.start, stats.trip.value.end, stats.trip.count
    )
}

fn render_duration<W: Write>(out: &mut W, stats: &DurationStats) -> fmt::Result {
    writeln!(out, "Total Travel Time: {} seconds", stats.total_secs)?;
    writeln!(out, "Mean Travel Time: {:.2} seconds", stats.mean_secs)
}

fn render_user<W: Write>(out: &mut W, stats: &UserStats, columns: ColumnSet) -> fmt::Result {
    writeln!(out, "Counts of User Types:")?;
    render_counts(out, &stats.user_types)?;

    if let Some(gender) = &stats.gender {
        writeln!(out, "\nCounts of Gender:")?;
        render_counts(out, gender)?;
    }

    match &stats.birth_year {
        Some(years) => {
            writeln!(out, "\nEarliest Year of Birth: {}", years.earliest)?;
            writeln!(out, "Most Recent Year of Birth: {}", years.most_recent)?;
            writeln!(out, "Most Common Year of Birth: {}", years.most_common)?;
        }
        None if columns.has(OptionalColumn::BirthYear) => {
            writeln!(out, "\nNo birth year data for these filters.")?;
        }
        None => {}
    }
    Ok(())
}

fn render_counts<W: Write>(out: &mut W, counts: &[CategoryCount]) -> fmt::Result {
    if counts.is_empty() {
        return writeln!(out, "  (none)");
    }
    let width = counts.iter().map(|c| c.value.len()).max().unwrap_or(0);
    for c in counts {
        writeln!(out, "  {:<width$}  {}", c.value, c.count)?;
    }
    Ok(())
}
