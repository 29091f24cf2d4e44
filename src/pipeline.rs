// src/pipeline.rs

use rayon::prelude::*;
use std::time::Instant;
use tracing::{info, instrument};

use crate::catalog::{IndicatorCatalog, Variable};
use crate::config::Config;
use crate::error::WgiError;
use crate::process::{aggregate, filter, header, reshape, schema, FilterOptions};
use crate::source::{RawTableSource, SheetRef};
use crate::table::{LongRecord, LongTable};

/// How indicator sheets are read and which variables they must carry.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Title rows above the two-row header.
    pub skip_rows: usize,
    pub variables: Vec<Variable>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            skip_rows: 0,
            variables: Variable::ALL.to_vec(),
        }
    }
}

impl From<&Config> for LoadOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            skip_rows: cfg.skip_rows,
            variables: cfg.variables.clone(),
        }
    }
}

/// Read, validate and reshape the sheet of one indicator.
#[instrument(level = "info", skip(source, catalog, opts))]
pub fn load_indicator(
    source: &dyn RawTableSource,
    catalog: &IndicatorCatalog,
    code: &str,
    opts: &LoadOptions,
) -> Result<Vec<LongRecord>, WgiError> {
    let indicator = catalog.get(code).ok_or_else(|| WgiError::SheetRead {
        path: Default::default(),
        sheet: code.to_string(),
        reason: format!(
            "unknown indicator code; expected one of {}",
            catalog.codes().collect::<Vec<_>>().join(", ")
        ),
    })?;

    // 1) raw cells
    let sheet = source.read_sheet(&SheetRef::from(indicator.sheet), opts.skip_rows)?;

    // 2) two-row header → canonical names
    let header = header::normalize_header(&sheet)?;

    // 3) wide-format schema gate
    schema::validate_wide(&header, &opts.variables)?;

    // 4) wide → long
    let records = reshape::reshape(&sheet, &header, indicator.code, &opts.variables)?;
    info!(indicator = indicator.code, records = records.len(), "loaded indicator");
    Ok(records)
}

/// Load every catalog indicator, combine them and apply `filter`.
///
/// Sheets are reshaped in parallel; the first failure aborts the whole load.
#[instrument(level = "info", skip_all)]
pub fn load_all(
    source: &dyn RawTableSource,
    catalog: &IndicatorCatalog,
    opts: &LoadOptions,
    filter_opts: &FilterOptions,
) -> Result<LongTable, WgiError> {
    let start = Instant::now();

    let parts: Vec<Vec<LongRecord>> = catalog
        .iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|ind| load_indicator(source, catalog, ind.code, opts))
        .collect::<Result<_, _>>()?;

    let combined = aggregate::combine(parts);
    schema::check_long(combined.observed_columns().as_slice());

    let table = filter::apply(&combined, filter_opts, catalog);
    info!(
        combined = combined.len(),
        returned = table.len(),
        years = ?combined.year_range(),
        elapsed = ?start.elapsed(),
        "load complete"
    );
    Ok(table)
}
