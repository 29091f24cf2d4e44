use std::collections::BTreeSet;

use serde::Deserialize;
use tracing::debug;

use crate::catalog::{IndicatorCatalog, Variable};
use crate::table::{LongRecord, LongTable};

/// Row predicates applied to the combined table. Unset fields do not filter,
/// except `indicators`, which falls back to every catalog code.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    /// Country names; an ISO3 code also matches.
    pub countries: Option<Vec<String>>,
    pub indicators: Option<Vec<String>>,
    pub variables: Option<Vec<Variable>>,
    pub drop_nulls: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            start_year: None,
            end_year: None,
            countries: None,
            indicators: None,
            variables: None,
            drop_nulls: true,
        }
    }
}

/// Predicates resolved against a concrete table and catalog.
struct Predicate<'a> {
    start: i32,
    end: i32,
    countries: Option<BTreeSet<&'a str>>,
    indicators: BTreeSet<&'static str>,
    variables: Option<BTreeSet<Variable>>,
    drop_nulls: bool,
}

impl<'a> Predicate<'a> {
    fn resolve(
        opts: &'a FilterOptions,
        catalog: &IndicatorCatalog,
        bounds: (i32, i32),
    ) -> Self {
        let indicators = match &opts.indicators {
            // unknown codes drop out here rather than erroring
            Some(codes) => codes
                .iter()
                .filter_map(|c| catalog.get(c))
                .map(|i| i.code)
                .collect(),
            None => catalog.codes().collect(),
        };

        Predicate {
            start: opts.start_year.unwrap_or(bounds.0),
            end: opts.end_year.unwrap_or(bounds.1),
            countries: opts
                .countries
                .as_ref()
                .map(|cs| cs.iter().map(|c| c.trim()).collect()),
            indicators,
            variables: opts.variables.as_ref().map(|vs| vs.iter().copied().collect()),
            drop_nulls: opts.drop_nulls,
        }
    }

    fn matches(&self, r: &LongRecord) -> bool {
        (self.start..=self.end).contains(&r.year)
            && self.countries.as_ref().map_or(true, |cs| {
                cs.contains(r.country_name.as_str()) || cs.contains(r.country_code.as_str())
            })
            && self.indicators.contains(r.indicator.as_str())
            && self
                .variables
                .as_ref()
                .map_or(true, |vs| vs.contains(&r.variable))
            && (!self.drop_nulls || r.value.is_some())
    }
}

/// Sort by (country name, indicator, year, variable name). Stable.
pub fn sort_records(records: &mut [LongRecord]) {
    records.sort_by(LongRecord::sort_cmp);
}

/// Build a new table holding the rows of `table` that satisfy `opts`,
/// in output order. `table` itself is left untouched.
pub fn apply(table: &LongTable, opts: &FilterOptions, catalog: &IndicatorCatalog) -> LongTable {
    let Some(bounds) = table.year_range() else {
        return LongTable::default();
    };
    let pred = Predicate::resolve(opts, catalog, bounds);

    let mut kept: Vec<LongRecord> = table
        .iter()
        .filter(|r| pred.matches(r))
        .cloned()
        .collect();
    sort_records(&mut kept);

    debug!(
        start = pred.start,
        end = pred.end,
        before = table.len(),
        after = kept.len(),
        "filtered table"
    );
    LongTable::new(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(country: &str, indicator: &str, year: i32, variable: Variable, value: Option<f64>) -> LongRecord {
        LongRecord {
            country_code: country[..3].to_uppercase(),
            country_name: country.into(),
            year,
            indicator: indicator.into(),
            variable,
            value,
        }
    }

    fn table() -> LongTable {
        LongTable::new(vec![
            rec("Zambia", "va", 2001, Variable::Estimate, Some(0.1)),
            rec("Albania", "pv", 1996, Variable::StdDev, Some(0.2)),
            rec("Albania", "va", 1996, Variable::StdDev, None),
            rec("Albania", "va", 1996, Variable::Estimate, Some(-0.3)),
            rec("Zambia", "cc", 2001, Variable::PctRank, Some(40.0)),
            rec("Åland", "va", 1998, Variable::Estimate, Some(1.0)),
        ])
    }

    #[test]
    fn defaults_drop_nulls_and_sort() {
        let catalog = IndicatorCatalog::wgi();
        let out = apply(&table(), &FilterOptions::default(), &catalog);
        let keys: Vec<_> = out
            .iter()
            .map(|r| (r.country_name.as_str(), r.indicator.as_str(), r.year, r.variable))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Albania", "pv", 1996, Variable::StdDev),
                ("Albania", "va", 1996, Variable::Estimate),
                ("Zambia", "cc", 2001, Variable::PctRank),
                ("Zambia", "va", 2001, Variable::Estimate),
                ("Åland", "va", 1998, Variable::Estimate),
            ]
        );
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let catalog = IndicatorCatalog::wgi();
        let opts = FilterOptions {
            start_year: Some(1996),
            countries: Some(vec!["Albania".into(), "Zambia".into()]),
            ..Default::default()
        };
        let once = apply(&table(), &opts, &catalog);
        let twice = apply(&once, &opts, &catalog);
        assert_eq!(once, twice);
    }

    #[test]
    fn input_is_not_mutated() {
        let catalog = IndicatorCatalog::wgi();
        let original = table();
        let before = original.clone();
        let _ = apply(&original, &FilterOptions::default(), &catalog);
        assert_eq!(original, before);
    }

    #[test]
    fn year_bounds_and_indicator_set() {
        let catalog = IndicatorCatalog::wgi();
        let opts = FilterOptions {
            start_year: Some(1997),
            end_year: Some(2001),
            indicators: Some(vec!["va".into(), "zz".into()]),
            ..Default::default()
        };
        let out = apply(&table(), &opts, &catalog);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.indicator == "va" && r.year >= 1997));
    }

    #[test]
    fn only_unknown_indicators_yield_empty_table() {
        let catalog = IndicatorCatalog::wgi();
        let opts = FilterOptions {
            indicators: Some(vec!["zz".into()]),
            ..Default::default()
        };
        assert!(apply(&table(), &opts, &catalog).is_empty());
    }

    #[test]
    fn keep_nulls_and_variable_and_code_match() {
        let catalog = IndicatorCatalog::wgi();
        let opts = FilterOptions {
            countries: Some(vec!["ALB".into()]),
            variables: Some(vec![Variable::StdDev]),
            drop_nulls: false,
            ..Default::default()
        };
        let out = apply(&table(), &opts, &catalog);
        assert_eq!(out.len(), 2);
        assert_eq!(out.records()[0].indicator, "pv");
        assert_eq!(out.records()[1].value, None);
    }
}
