// src/process/header.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::catalog::Variable;
use crate::error::WgiError;
use crate::process::raw_table::{Cell, RawSheet};
use crate::process::utils::normalize_token;

pub const COUNTRY_NAME: &str = "countryname";
pub const COUNTRY_CODE: &str = "countrycode";

/// Rows 0 and 1 of a sheet together form the column names.
pub const HEADER_ROWS: usize = 2;
/// Columns 0 and 1 hold the country name and code.
pub const IDENTITY_COLUMNS: usize = 2;

static DATA_COLUMN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}_[a-zA-Z]+$").expect("column name regex should compile"));

fn is_year_token(tok: &str) -> bool {
    tok.len() == 4 && tok.bytes().all(|b| b.is_ascii_digit())
}

/// A non-identity column and the (year, variable) pair it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataColumn {
    /// Position in the raw sheet.
    pub index: usize,
    pub year: String,
    pub variable: String,
}

impl DataColumn {
    pub fn name(&self) -> String {
        format!("{}_{}", self.year, self.variable)
    }
}

/// Canonical column layout of one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeHeader {
    /// Names of the two identity columns, in position order.
    pub identity: [String; IDENTITY_COLUMNS],
    pub data_columns: Vec<DataColumn>,
}

impl CompositeHeader {
    /// Every canonical column name, identity columns first.
    pub fn names(&self) -> Vec<String> {
        self.identity
            .iter()
            .cloned()
            .chain(self.data_columns.iter().map(DataColumn::name))
            .collect()
    }

    /// Column vocabulary of the wide table before years are attached:
    /// identity names plus each distinct variable token, in first-seen order.
    pub fn vocabulary(&self) -> Vec<String> {
        let mut out: Vec<String> = self.identity.to_vec();
        for col in &self.data_columns {
            if !out.contains(&col.variable) {
                out.push(col.variable.clone());
            }
        }
        out
    }
}

fn token_at(row: &[Cell], col: usize) -> String {
    row.get(col)
        .map(|c| normalize_token(&c.to_text()))
        .unwrap_or_default()
}

fn canonical_identity(position: usize, token: &str) -> String {
    match (position, token) {
        (0, "" | "countryname" | "country" | "country_name" | "country_territory" | "economy") => {
            COUNTRY_NAME.to_string()
        }
        (1, "" | "countrycode" | "code" | "country_code" | "wbcode" | "iso3") => {
            COUNTRY_CODE.to_string()
        }
        (_, other) => other.to_string(),
    }
}

/// Derive canonical column names from the two header rows of `sheet`.
///
/// The year row may leave cells blank where the spreadsheet merged one year
/// across its variable columns; such cells inherit the year to their left.
/// A year written above an identity column seeds that inheritance, so a
/// merged year cell may start over the country code.
/// Columns blank in both header rows are not data columns and are skipped.
pub fn normalize_header(sheet: &RawSheet) -> Result<CompositeHeader, WgiError> {
    if sheet.rows.len() < HEADER_ROWS {
        return Err(WgiError::malformed(
            &sheet.name,
            format!(
                "expected at least {} header rows, found {}",
                HEADER_ROWS,
                sheet.rows.len()
            ),
        ));
    }

    let year_row = &sheet.rows[0];
    let var_row = &sheet.rows[1];
    let width = year_row.len().max(var_row.len());
    if width < IDENTITY_COLUMNS {
        return Err(WgiError::malformed(
            &sheet.name,
            format!("expected at least {} columns, found {}", IDENTITY_COLUMNS, width),
        ));
    }

    // pass 1: identity columns
    let identity = [
        canonical_identity(0, &token_at(var_row, 0)),
        canonical_identity(1, &token_at(var_row, 1)),
    ];

    // pass 2: year/variable columns
    let mut data_columns = Vec::with_capacity(width - IDENTITY_COLUMNS);
    let mut last_year: Option<String> = (0..IDENTITY_COLUMNS)
        .rev()
        .map(|i| token_at(year_row, i))
        .find(|tok| is_year_token(tok));
    for index in IDENTITY_COLUMNS..width {
        let year_tok = token_at(year_row, index);
        let var_tok = token_at(var_row, index);

        if year_tok.is_empty() && var_tok.is_empty() {
            trace!(sheet = %sheet.name, index, "skipping blank header column");
            continue;
        }
        if !year_tok.is_empty() {
            last_year = Some(year_tok);
        }

        let year = last_year.clone().unwrap_or_default();
        let variable = Variable::canonical_token(&var_tok).to_string();
        let col = DataColumn {
            index,
            year,
            variable,
        };

        let name = col.name();
        if !DATA_COLUMN_NAME.is_match(&name) {
            return Err(WgiError::malformed(
                &sheet.name,
                format!(
                    "column {} derives name `{}`, expected <year>_<variable>",
                    index, name
                ),
            ));
        }
        data_columns.push(col);
    }

    debug!(
        sheet = %sheet.name,
        data_columns = data_columns.len(),
        "normalized header"
    );

    Ok(CompositeHeader {
        identity,
        data_columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: Vec<Vec<&str>>) -> RawSheet {
        RawSheet::from_strings("test", rows)
    }

    #[test]
    fn two_row_header_becomes_year_variable_names() {
        let s = sheet(vec![
            vec!["", "", "2020", "2020", "2021"],
            vec!["countryname", "countrycode", "estimate", "stddev", "estimate"],
        ]);
        let header = normalize_header(&s).unwrap();
        assert_eq!(
            header.names(),
            vec![
                "countryname",
                "countrycode",
                "2020_estimate",
                "2020_stddev",
                "2021_estimate"
            ]
        );
        assert_eq!(header.data_columns[1].index, 3);
    }

    #[test]
    fn year_above_identity_column_carries_into_data_columns() {
        let s = sheet(vec![
            vec!["", "2020"],
            vec!["countryname", "countrycode", "estimate", "stddev"],
            vec!["Afghanistan", "AFG", "-1.49", "0.2"],
        ]);
        let header = normalize_header(&s).unwrap();
        assert_eq!(header.identity, [COUNTRY_NAME.to_string(), COUNTRY_CODE.to_string()]);
        assert_eq!(header.names()[2..], ["2020_estimate", "2020_stddev"]);
        assert_eq!(header.data_columns[0].index, 2);
    }

    #[test]
    fn identity_title_text_does_not_seed_year() {
        let s = sheet(vec![
            vec!["Country", "Code"],
            vec!["countryname", "countrycode", "estimate"],
        ]);
        assert!(matches!(
            normalize_header(&s),
            Err(WgiError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn merged_year_cells_and_spreadsheet_labels() {
        let s = sheet(vec![
            vec!["", "", "1996", "", "", "", "", ""],
            vec![
                "Country/Territory",
                "Code",
                "Estimate",
                "StdErr",
                "NumSrc",
                "Rank",
                "Lower",
                "Upper",
            ],
        ]);
        let header = normalize_header(&s).unwrap();
        assert_eq!(header.identity, [COUNTRY_NAME.to_string(), COUNTRY_CODE.to_string()]);
        let names = header.names();
        assert_eq!(
            &names[2..],
            &[
                "1996_estimate",
                "1996_stddev",
                "1996_nsource",
                "1996_pctrank",
                "1996_pctranklower",
                "1996_pctrankupper"
            ]
        );
    }

    #[test]
    fn numeric_year_cells_and_index_artifacts() {
        let mut s = sheet(vec![
            vec!["column 1", "column 2", "", ""],
            vec!["", "", "column 3estimate", "...4"],
        ]);
        s.rows[0][2] = 2019.0.into();
        s.rows[1][3] = "Unnamed: 4 Rank".into();
        let header = normalize_header(&s).unwrap();
        assert_eq!(header.names()[2..], ["2019_estimate", "2019_pctrank"]);
    }

    #[test]
    fn every_data_name_matches_pattern() {
        let s = sheet(vec![
            vec!["", "", "2000", "", "2002", ""],
            vec!["a", "b", "estimate", "nsource", "estimate", "nsource"],
        ]);
        let header = normalize_header(&s).unwrap();
        for col in &header.data_columns {
            assert!(DATA_COLUMN_NAME.is_match(&col.name()), "{}", col.name());
        }
    }

    #[test]
    fn too_few_rows_is_malformed() {
        let s = sheet(vec![vec!["", "", "2020"]]);
        let err = normalize_header(&s).unwrap_err();
        assert!(matches!(err, WgiError::MalformedHeader { .. }));
    }

    #[test]
    fn missing_year_is_malformed() {
        let s = sheet(vec![
            vec!["", "", "", ""],
            vec!["countryname", "countrycode", "estimate", "stddev"],
        ]);
        let err = normalize_header(&s).unwrap_err();
        assert!(err.to_string().contains("_estimate"), "{}", err);
    }

    #[test]
    fn non_alphabetic_variable_is_malformed() {
        let s = sheet(vec![
            vec!["", "", "2020"],
            vec!["countryname", "countrycode", "est 2"],
        ]);
        assert!(matches!(
            normalize_header(&s),
            Err(WgiError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn vocabulary_lists_distinct_variables() {
        let s = sheet(vec![
            vec!["", "", "2020", "", "2021", ""],
            vec!["countryname", "countrycode", "estimate", "stddev", "estimate", "stddev"],
        ]);
        let header = normalize_header(&s).unwrap();
        assert_eq!(
            header.vocabulary(),
            vec!["countryname", "countrycode", "estimate", "stddev"]
        );
    }
}
