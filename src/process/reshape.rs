// src/process/reshape.rs

use tracing::{debug, instrument};

use crate::catalog::Variable;
use crate::error::WgiError;
use crate::process::header::{CompositeHeader, DataColumn, HEADER_ROWS};
use crate::process::raw_table::{Cell, RawSheet};
use crate::process::utils::clean_str;
use crate::table::LongRecord;

/// A data column with its year and variable already parsed.
struct TypedColumn {
    index: usize,
    year: i32,
    variable: Variable,
}

fn parse_year(col: &DataColumn) -> Result<i32, WgiError> {
    let token = col.year.as_str();
    if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WgiError::InvalidYear {
            column: col.name(),
            token: token.to_string(),
        });
    }
    token.parse::<i32>().map_err(|_| WgiError::InvalidYear {
        column: col.name(),
        token: token.to_string(),
    })
}

fn type_columns(
    sheet: &RawSheet,
    header: &CompositeHeader,
    variables: &[Variable],
) -> Result<Vec<TypedColumn>, WgiError> {
    let mut out = Vec::with_capacity(header.data_columns.len());
    for col in &header.data_columns {
        let year = parse_year(col)?;
        let variable = col.variable.parse::<Variable>().map_err(|e| {
            WgiError::malformed(&sheet.name, format!("column {}: {}", col.name(), e))
        })?;
        if variables.contains(&variable) {
            out.push(TypedColumn {
                index: col.index,
                year,
                variable,
            });
        }
    }
    Ok(out)
}

fn identity_cell(row: &[Cell], col: usize) -> String {
    row.get(col)
        .map(|c| clean_str(&c.to_text()))
        .unwrap_or_default()
}

/// Pivot the wide sheet into long records for one indicator.
///
/// Emits `(rows - HEADER_ROWS) * selected columns` records, row by row.
/// Cells that do not hold a number become `None`; rows shorter than the
/// header read their missing cells as empty.
#[instrument(level = "debug", skip(sheet, header, variables), fields(sheet = %sheet.name))]
pub fn reshape(
    sheet: &RawSheet,
    header: &CompositeHeader,
    indicator: &str,
    variables: &[Variable],
) -> Result<Vec<LongRecord>, WgiError> {
    let columns = type_columns(sheet, header, variables)?;
    let body = sheet.rows.get(HEADER_ROWS..).unwrap_or(&[]);

    let mut records = Vec::with_capacity(body.len() * columns.len());
    for row in body {
        let country_name = identity_cell(row, 0);
        let country_code = identity_cell(row, 1);
        for col in &columns {
            let value = row.get(col.index).and_then(Cell::to_f64);
            records.push(LongRecord {
                country_code: country_code.clone(),
                country_name: country_name.clone(),
                year: col.year,
                indicator: indicator.to_string(),
                variable: col.variable,
                value,
            });
        }
    }

    debug!(
        indicator,
        rows = body.len(),
        columns = columns.len(),
        records = records.len(),
        "reshaped sheet"
    );
    Ok(records)
}
