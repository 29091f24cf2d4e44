// src/source.rs

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::error::WgiError;
use crate::process::raw_table::{Cell, RawSheet};

/// Which worksheet to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetRef {
    Name(String),
    Index(usize),
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetRef::Name(n) => write!(f, "`{}`", n),
            SheetRef::Index(i) => write!(f, "#{}", i),
        }
    }
}

impl From<&str> for SheetRef {
    fn from(name: &str) -> Self {
        SheetRef::Name(name.to_string())
    }
}

/// Anything that can hand out raw sheets.
///
/// Implementations must be shareable across threads: indicator sheets are
/// read in parallel from one source.
pub trait RawTableSource: Send + Sync {
    /// Read `sheet`, dropping the first `skip_rows` rows.
    fn read_sheet(&self, sheet: &SheetRef, skip_rows: usize) -> Result<RawSheet, WgiError>;
}

/// A workbook file on disk (xlsx, xlsm, xlsb, xls or ods).
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sheet_error(&self, sheet: &SheetRef, reason: impl ToString) -> WgiError {
        WgiError::SheetRead {
            path: self.path.clone(),
            sheet: sheet.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn to_cell(d: &Data) -> Cell {
    match d {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        // errors (#N/A, #VALUE!), booleans and dates keep their display text
        other => Cell::Text(other.to_string()),
    }
}

/// Convert a calamine range into absolute sheet rows.
///
/// calamine trims a range to its used area, so the range's top-left offset
/// is re-applied: blank leading rows are restored (and count against
/// `skip_rows`) and leading columns are padded with empty cells. Row `i` of
/// the result is always sheet row `skip_rows + i`.
fn range_to_rows(range: &Range<Data>, skip_rows: usize) -> Vec<Vec<Cell>> {
    let (start_row, start_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));
    let skip = skip_rows.saturating_sub(start_row);
    let blank_lead = start_row.saturating_sub(skip_rows);

    let used = range.rows().skip(skip).map(|row| {
        let mut cells = vec![Cell::Empty; start_col];
        cells.extend(row.iter().map(to_cell));
        // trailing empties carry no data and would widen the header
        while matches!(cells.last(), Some(Cell::Empty)) {
            cells.pop();
        }
        cells
    });
    std::iter::repeat_with(Vec::new)
        .take(blank_lead)
        .chain(used)
        .collect()
}

impl RawTableSource for WorkbookSource {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn read_sheet(&self, sheet: &SheetRef, skip_rows: usize) -> Result<RawSheet, WgiError> {
        let mut workbook =
            open_workbook_auto(&self.path).map_err(|e| self.sheet_error(sheet, e))?;

        let (name, range) = match sheet {
            SheetRef::Name(name) => {
                let range = workbook
                    .worksheet_range(name)
                    .map_err(|e| self.sheet_error(sheet, e))?;
                (name.clone(), range)
            }
            SheetRef::Index(idx) => {
                let name = workbook
                    .sheet_names()
                    .get(*idx)
                    .cloned()
                    .ok_or_else(|| self.sheet_error(sheet, "no sheet at this index"))?;
                let range = workbook
                    .worksheet_range_at(*idx)
                    .ok_or_else(|| self.sheet_error(sheet, "no sheet at this index"))?
                    .map_err(|e| self.sheet_error(sheet, e))?;
                (name, range)
            }
        };

        let rows = range_to_rows(&range, skip_rows);
        debug!(sheet = %name, rows = rows.len(), "read sheet");
        Ok(RawSheet::new(name, rows))
    }
}

/// Sheets held in memory, keyed by name. Useful for tests and for callers
/// that already parsed a workbook elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: Vec<RawSheet>,
    by_name: HashMap<String, usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet: RawSheet) -> Self {
        self.insert(sheet);
        self
    }

    pub fn insert(&mut self, sheet: RawSheet) {
        match self.by_name.get(&sheet.name) {
            Some(&idx) => self.sheets[idx] = sheet,
            None => {
                self.by_name.insert(sheet.name.clone(), self.sheets.len());
                self.sheets.push(sheet);
            }
        }
    }
}

impl RawTableSource for MemorySource {
    fn read_sheet(&self, sheet: &SheetRef, skip_rows: usize) -> Result<RawSheet, WgiError> {
        let found = match sheet {
            SheetRef::Name(name) => self.by_name.get(name).map(|&i| &self.sheets[i]),
            SheetRef::Index(idx) => self.sheets.get(*idx),
        };
        let raw = found.ok_or_else(|| WgiError::SheetRead {
            path: PathBuf::from("<memory>"),
            sheet: sheet.to_string(),
            reason: "sheet not found".into(),
        })?;
        Ok(RawSheet::new(
            raw.name.clone(),
            raw.rows.iter().skip(skip_rows).cloned().collect(),
        ))
    }
}
