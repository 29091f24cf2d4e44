// src/process/raw_table.rs

use std::fmt;

/// A single spreadsheet cell as handed over by the workbook reader.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Header-friendly rendering: integral numbers lose their `.0`
    /// so a year stored as `2020.0` reads back as `2020`.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }

    /// Numeric coercion used for data cells. Anything that is not a finite
    /// number (blank, `#N/A`, `..`, free text) becomes `None`.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Number(_) => None,
            Cell::Text(s) => super::utils::clean_str(s)
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    /// Worksheet name, kept for error messages.
    pub name: String,
    /// Header rows first, then one row per country.
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Build a sheet from string literals; empty strings become `Cell::Empty`.
    pub fn from_strings<R, S>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(|c| Cell::from(c.as_ref())).collect())
            .collect();
        Self::new(name, rows)
    }
}
