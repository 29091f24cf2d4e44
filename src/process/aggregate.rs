use tracing::debug;

use crate::table::{LongRecord, LongTable};

/// Concatenate per-indicator tables in the order given.
///
/// Keys repeated across parts are kept as-is; feeding the same indicator
/// twice is a caller error.
pub fn combine<I>(parts: I) -> LongTable
where
    I: IntoIterator<Item = Vec<LongRecord>>,
{
    let parts: Vec<Vec<LongRecord>> = parts.into_iter().collect();
    let total = parts.iter().map(Vec::len).sum();

    let mut records = Vec::with_capacity(total);
    for part in parts {
        records.extend(part);
    }

    let table = LongTable::new(records);
    debug!(rows = table.len(), years = ?table.year_range(), "combined tables");
    table
}
