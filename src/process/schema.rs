use tracing::warn;

use crate::catalog::Variable;
use crate::error::WgiError;
use crate::process::header::{CompositeHeader, COUNTRY_CODE, COUNTRY_NAME};
use crate::table::LongTable;

/// Check that every `required` column is present in `available`, ignoring case.
///
/// On failure the error carries both the missing names and the whole
/// available set, so a changed upstream layout can be diagnosed from the
/// message alone.
pub fn validate_columns<S: AsRef<str>>(available: &[S], required: &[&str]) -> Result<(), WgiError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|req| {
            !available
                .iter()
                .any(|have| have.as_ref().eq_ignore_ascii_case(req))
        })
        .map(|req| req.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(WgiError::SchemaValidation {
            missing,
            available: available.iter().map(|s| s.as_ref().to_string()).collect(),
        })
    }
}

/// Columns a wide sheet must offer before it can be reshaped.
pub fn required_wide_columns(variables: &[Variable]) -> Vec<&'static str> {
    let mut req = vec![COUNTRY_NAME, COUNTRY_CODE];
    req.extend(variables.iter().map(Variable::as_str));
    req
}

/// Pre-reshape check against the header's column vocabulary.
pub fn validate_wide(header: &CompositeHeader, variables: &[Variable]) -> Result<(), WgiError> {
    validate_columns(header.vocabulary().as_slice(), &required_wide_columns(variables))
}

/// Post-reshape check. Advisory: a failure is logged, never returned.
pub fn check_long<S: AsRef<str>>(columns: &[S]) -> bool {
    match validate_columns(columns, &LongTable::COLUMNS) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "long table schema check failed");
            false
        }
    }
}
