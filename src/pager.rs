use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::data::model::{ColumnSet, Dataset, OptionalColumn, TripRecord};

pub const PAGE_SIZE: usize = 5;

/// Walks a dataset in fixed-size pages of raw rows.
#[derive(Debug, Clone)]
pub struct RawPager {
    offset: usize,
    page_size: usize,
}

impl Default for RawPager {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl RawPager {
    pub fn new(page_size: usize) -> Self {
        RawPager {
            offset: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The next page, or `None` once every row has been shown.
    pub fn next_page<'a>(&mut self, dataset: &'a Dataset) -> Option<&'a [TripRecord]> {
        if self.offset >= dataset.len() {
            return None;
        }
        let end = (self.offset + self.page_size).min(dataset.len());
        let page = &dataset.trips[self.offset..end];
        self.offset = end;
        Some(page)
    }
}

/// Render rows as a text table. `first_row` numbers the left-hand index
/// column; `columns` picks which optional columns are shown.
pub fn render_page(rows: &[TripRecord], first_row: usize, columns: ColumnSet) -> Result<String> {
    let batch = page_batch(rows, first_row, columns)?;
    let table = pretty_format_batches(&[batch]).context("formatting raw rows")?;
    Ok(table.to_string())
}

fn page_batch(rows: &[TripRecord], first_row: usize, columns: ColumnSet) -> Result<RecordBatch> {
    let text = |f: &dyn Fn(&TripRecord) -> Option<String>| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let mut fields = vec![
        Field::new("#", DataType::Int64, false),
        Field::new("Start Time", DataType::Utf8, false),
        Field::new("Start Station", DataType::Utf8, false),
        Field::new("End Station", DataType::Utf8, false),
        Field::new("Trip Duration", DataType::Float64, false),
        Field::new("User Type", DataType::Utf8, true),
    ];
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(
            (first_row..first_row + rows.len()).map(|i| i as i64),
        )),
        text(&|t: &TripRecord| Some(t.start_time.format("%Y-%m-%d %H:%M:%S").to_string())),
        text(&|t: &TripRecord| t.start_station.clone()),
        text(&|t: &TripRecord| t.end_station.clone()),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|t| t.trip_duration))),
        text(&|t: &TripRecord| t.user_type.clone()),
    ];

    for column in columns.iter() {
        match column {
            OptionalColumn::Gender => {
                fields.push(Field::new(column.header(), DataType::Utf8, true));
                arrays.push(text(&|t: &TripRecord| t.gender.clone()));
            }
            OptionalColumn::BirthYear => {
                fields.push(Field::new(column.header(), DataType::Int64, true));
                arrays.push(Arc::new(Int64Array::from(
                    rows.iter()
                        .map(|t| t.birth_year.map(i64::from))
                        .collect::<Vec<_>>(),
                )));
            }
            OptionalColumn::BikeType => {
                fields.push(Field::new(column.header(), DataType::Utf8, true));
                arrays.push(text(&|t: &TripRecord| t.bike_type.clone()));
            }
        }
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("building raw row batch")
}
