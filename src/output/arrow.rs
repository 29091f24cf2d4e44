// src/output/arrow.rs

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use crate::table::LongTable;

/// Arrow layout of the long table, in `LongTable::COLUMNS` order.
///
/// - countrycode, countryname, indicator, variable → Utf8
/// - year                                          → Int32
/// - value                                         → Float64 (nullable)
pub fn long_schema() -> Arc<ArrowSchema> {
    Arc::new(ArrowSchema::new(vec![
        Field::new("countrycode", DataType::Utf8, false),
        Field::new("countryname", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("indicator", DataType::Utf8, false),
        Field::new("variable", DataType::Utf8, false),
        Field::new("value", DataType::Float64, true),
    ]))
}

/// Build one RecordBatch holding the whole table.
pub fn to_record_batch(table: &LongTable) -> Result<RecordBatch> {
    let recs = table.records();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            recs.iter().map(|r| r.country_code.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            recs.iter().map(|r| r.country_name.as_str()),
        )),
        Arc::new(Int32Array::from_iter_values(recs.iter().map(|r| r.year))),
        Arc::new(StringArray::from_iter_values(
            recs.iter().map(|r| r.indicator.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            recs.iter().map(|r| r.variable.as_str()),
        )),
        Arc::new(recs.iter().map(|r| r.value).collect::<Float64Array>()),
    ];
    RecordBatch::try_new(long_schema(), columns).context("building long table record batch")
}
