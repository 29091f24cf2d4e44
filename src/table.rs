// src/table.rs

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::catalog::Variable;

/// One (indicator, country, year, variable) observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    #[serde(rename = "countrycode")]
    pub country_code: String,
    #[serde(rename = "countryname")]
    pub country_name: String,
    pub year: i32,
    pub indicator: String,
    pub variable: Variable,
    pub value: Option<f64>,
}

impl LongRecord {
    /// Uniqueness key within a combined table.
    pub fn key(&self) -> (&str, &str, i32, Variable) {
        (
            self.country_code.as_str(),
            self.indicator.as_str(),
            self.year,
            self.variable,
        )
    }

    /// Output ordering: country name, indicator, year, variable name.
    /// Plain `str` comparison is byte order, so this never depends on locale.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.country_name
            .cmp(&other.country_name)
            .then_with(|| self.indicator.cmp(&other.indicator))
            .then_with(|| self.year.cmp(&other.year))
            .then_with(|| self.variable.as_str().cmp(other.variable.as_str()))
    }
}

/// The long-format table returned by the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LongTable {
    records: Vec<LongRecord>,
}

impl LongTable {
    pub const COLUMNS: [&'static str; 6] = [
        "countrycode",
        "countryname",
        "year",
        "indicator",
        "variable",
        "value",
    ];

    pub fn new(records: Vec<LongRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[LongRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LongRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column names as the records actually serialize, read off the first
    /// record. Empty for an empty table.
    pub fn observed_columns(&self) -> Vec<String> {
        match self.records.first().map(serde_json::to_value) {
            Some(Ok(serde_json::Value::Object(fields))) => fields.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// `[min(year), max(year)]`, or `None` for an empty table.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        self.records.iter().fold(None, |acc, r| match acc {
            None => Some((r.year, r.year)),
            Some((lo, hi)) => Some((lo.min(r.year), hi.max(r.year))),
        })
    }
}

impl<'a> IntoIterator for &'a LongTable {
    type Item = &'a LongRecord;
    type IntoIter = std::slice::Iter<'a, LongRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<LongRecord> for LongTable {
    fn from_iter<T: IntoIterator<Item = LongRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32) -> LongRecord {
        LongRecord {
            country_code: "CHL".into(),
            country_name: "Chile".into(),
            year,
            indicator: "rq".into(),
            variable: Variable::NSource,
            value: None,
        }
    }

    #[test]
    fn observed_columns_follow_serialized_names() {
        let table: LongTable = vec![record(2001), record(1998)].into_iter().collect();
        let mut observed = table.observed_columns();
        observed.sort();
        let mut expected = LongTable::COLUMNS.to_vec();
        expected.sort();
        assert_eq!(observed, expected);
        assert_eq!(table.year_range(), Some((1998, 2001)));
    }

    #[test]
    fn empty_table_has_no_columns_or_years() {
        let table = LongTable::default();
        assert!(table.observed_columns().is_empty());
        assert_eq!(table.year_range(), None);
    }
}
