use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{Array, AsArray, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use chrono::{DateTime, NaiveDateTime};
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{ColumnSet, Dataset, OptionalColumn, TripRecord};
use crate::config::{normalize_city, CityTable};
use crate::error::DataError;

/// Timestamp layouts seen in the published bikeshare exports.
const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Layouts carrying a UTC offset after a space; the wall-clock time is kept.
const OFFSET_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%:z"];

/// How the loader reacts to rows it cannot interpret.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Fail the whole load on the first malformed row.
    pub strict: bool,
}

/// A loaded dataset plus the rows that were skipped on the way.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub dataset: Dataset,
    /// One `DataError::MalformedRecord` per skipped row.
    pub malformed: Vec<DataError>,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the dataset registered for `city` in `table`.
pub fn load_city(table: &CityTable, city: &str, options: LoadOptions) -> Result<LoadReport> {
    let path = table.resolve(city)?;
    let mut report = load_file(path, options)
        .with_context(|| format!("loading {} data from {}", city.trim(), path.display()))?;
    report.dataset.city = normalize_city(city);
    info!(
        "Loaded {} trips for {} ({} malformed rows skipped)",
        report.dataset.len(),
        report.dataset.city,
        report.malformed.len()
    );
    Ok(report)
}

/// Load a trip dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the usual bikeshare column names
/// * `.json`    – `[{ "Start Time": "...", "Start Station": "...", ... }, ...]`
/// * `.parquet` – any column types castable to text (native timestamps work)
pub fn load_file(path: &Path, options: LoadOptions) -> Result<LoadReport> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let city = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .replace('_', " ");

    match ext.as_str() {
        "csv" => load_csv(path, &city, options),
        "json" => load_json(path, &city, options),
        "parquet" | "pq" => load_parquet(path, &city, options),
        other => Err(DataError::UnsupportedFormat(other.to_string()).into()),
    }
}

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

/// Positions of the known columns within one file's header.
#[derive(Debug, Clone)]
struct Layout {
    start_time: usize,
    start_station: usize,
    end_station: usize,
    trip_duration: usize,
    user_type: usize,
    gender: Option<usize>,
    birth_year: Option<usize>,
    bike_type: Option<usize>,
}

impl Layout {
    fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Layout, DataError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.as_ref().trim().eq_ignore_ascii_case(name))
        };
        let require =
            |name: &'static str| find(name).ok_or(DataError::MissingColumn(name));

        Ok(Layout {
            start_time: require("Start Time")?,
            start_station: require("Start Station")?,
            end_station: require("End Station")?,
            trip_duration: require("Trip Duration")?,
            user_type: require("User Type")?,
            gender: find(OptionalColumn::Gender.header()),
            birth_year: find(OptionalColumn::BirthYear.header()),
            bike_type: find(OptionalColumn::BikeType.header()),
        })
    }

    fn columns(&self) -> ColumnSet {
        let mut cols = ColumnSet::none();
        if self.gender.is_some() {
            cols.insert(OptionalColumn::Gender);
        }
        if self.birth_year.is_some() {
            cols.insert(OptionalColumn::BirthYear);
        }
        if self.bike_type.is_some() {
            cols.insert(OptionalColumn::BikeType);
        }
        cols
    }

    /// Every column index this layout reads.
    fn indices(&self) -> Vec<usize> {
        let mut out = vec![
            self.start_time,
            self.start_station,
            self.end_station,
            self.trip_duration,
            self.user_type,
        ];
        out.extend(
            [self.gender, self.birth_year, self.bike_type]
                .into_iter()
                .flatten(),
        );
        out
    }

    /// Build one trip from the cells of a row. `cell(i)` returns the text of
    /// column `i`, or `None` for a missing value.
    fn build<'a>(
        &self,
        row: usize,
        cell: impl Fn(usize) -> Option<&'a str>,
    ) -> Result<TripRecord, DataError> {
        let text = |idx: usize| cell(idx).map(str::trim).filter(|s| !s.is_empty());
        let malformed = |reason: String| DataError::MalformedRecord { row, reason };

        let raw_start = text(self.start_time).unwrap_or("");
        let start_time = parse_timestamp(raw_start)
            .ok_or_else(|| malformed(format!("unparsable start time '{raw_start}'")))?;

        let raw_duration = text(self.trip_duration).unwrap_or("");
        let trip_duration = raw_duration
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| malformed(format!("invalid trip duration '{raw_duration}'")))?;

        let mut trip = TripRecord::new(
            start_time,
            text(self.start_station).unwrap_or(""),
            text(self.end_station).unwrap_or(""),
            trip_duration,
        );
        let optional = |idx: Option<usize>| idx.and_then(|i| text(i)).map(str::to_string);
        trip.user_type = optional(Some(self.user_type));
        trip.gender = optional(self.gender);
        trip.bike_type = optional(self.bike_type);
        trip.birth_year = self
            .birth_year
            .and_then(|i| text(i))
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|y| y.is_finite())
            .map(|y| y.trunc() as i32);
        Ok(trip)
    }
}

/// Parse a start-time cell in any of the accepted layouts.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            OFFSET_TIMESTAMP_FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
                .or_else(|| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.naive_local())
        })
}

// ---------------------------------------------------------------------------
// Row collection shared by all formats
// ---------------------------------------------------------------------------

struct Collector {
    layout: Layout,
    options: LoadOptions,
    trips: Vec<TripRecord>,
    malformed: Vec<DataError>,
}

impl Collector {
    fn new(layout: Layout, options: LoadOptions) -> Self {
        Collector {
            layout,
            options,
            trips: Vec::new(),
            malformed: Vec::new(),
        }
    }

    fn push<'a>(&mut self, row: usize, cell: impl Fn(usize) -> Option<&'a str>) -> Result<()> {
        let built = self.layout.build(row, cell);
        self.accept(built)
    }

    /// Keep a built trip, or record (or, in strict mode, raise) its error.
    fn accept(&mut self, built: Result<TripRecord, DataError>) -> Result<()> {
        match built {
            Ok(trip) => self.trips.push(trip),
            Err(err) if self.options.strict => return Err(err.into()),
            Err(err) => {
                warn!("Skipping row: {err}");
                self.malformed.push(err);
            }
        }
        Ok(())
    }

    fn finish(self, city: &str) -> LoadReport {
        LoadReport {
            dataset: Dataset::new(city, self.layout.columns(), self.trips),
            malformed: self.malformed,
        }
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, city: &str, options: LoadOptions) -> Result<LoadReport> {
    // Flexible: short or long rows reach the row builder instead of failing
    // the whole file.
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut collector = Collector::new(Layout::from_headers(&headers)?, options);

    for (row_no, result) in reader.records().enumerate() {
        match result {
            Ok(record) => collector.push(row_no, |i| record.get(i))?,
            Err(err) if err.is_io_error() => {
                return Err(err).with_context(|| format!("CSV row {row_no}"));
            }
            Err(err) => collector.accept(Err(DataError::MalformedRecord {
                row: row_no,
                reason: err.to_string(),
            }))?,
        }
    }

    Ok(collector.finish(city))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
/// The header is the union of keys, in first-seen order.
fn load_json(path: &Path, city: &str, options: LoadOptions) -> Result<LoadReport> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let mut collector = Collector::new(Layout::from_headers(&headers)?, options);

    for (row_no, obj) in objects.into_iter().enumerate() {
        let cells: Vec<Option<String>> = headers
            .iter()
            .map(|h| obj.get(h).and_then(json_to_cell))
            .collect();
        collector.push(row_no, |i| cells.get(i).and_then(|c| c.as_deref()))?;
    }

    Ok(collector.finish(city))
}

fn json_to_cell(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Every column the layout reads is cast to text with `arrow::compute::cast`
/// and then goes through the same row builder as CSV.
fn load_parquet(path: &Path, city: &str, options: LoadOptions) -> Result<LoadReport> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let layout = Layout::from_headers(&headers)?;
    let wanted = layout.indices();
    let mut collector = Collector::new(layout, options);
    let mut row_offset = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let mut text_columns: Vec<Option<StringArray>> = vec![None; batch.num_columns()];
        for &idx in &wanted {
            let casted = cast(batch.column(idx), &DataType::Utf8)
                .with_context(|| format!("column '{}' is not readable as text", headers[idx]))?;
            text_columns[idx] = Some(casted.as_string::<i32>().clone());
        }

        for row in 0..batch.num_rows() {
            collector.push(row_offset + row, |i| {
                let col = text_columns.get(i)?.as_ref()?;
                if col.is_null(row) {
                    None
                } else {
                    Some(col.value(row))
                }
            })?;
        }
        row_offset += batch.num_rows();
    }

    Ok(collector.finish(city))
}
