// src/catalog.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One governance dimension and where to find it in the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    /// Short code used in the long table, e.g. `va`.
    pub code: &'static str,
    /// Worksheet holding the wide table for this indicator.
    pub sheet: &'static str,
    pub name: &'static str,
}

/// The six WGI dimensions in publication order.
static WGI_INDICATORS: &[Indicator] = &[
    Indicator {
        code: "va",
        sheet: "VoiceandAccountability",
        name: "Voice and Accountability",
    },
    Indicator {
        code: "pv",
        sheet: "Political StabilityNoViolence",
        name: "Political Stability and Absence of Violence/Terrorism",
    },
    Indicator {
        code: "ge",
        sheet: "GovernmentEffectiveness",
        name: "Government Effectiveness",
    },
    Indicator {
        code: "rq",
        sheet: "RegulatoryQuality",
        name: "Regulatory Quality",
    },
    Indicator {
        code: "rl",
        sheet: "RuleofLaw",
        name: "Rule of Law",
    },
    Indicator {
        code: "cc",
        sheet: "ControlofCorruption",
        name: "Control of Corruption",
    },
];

/// Immutable indicator table, built once and handed to the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorCatalog {
    indicators: &'static [Indicator],
}

impl IndicatorCatalog {
    pub fn wgi() -> Self {
        Self {
            indicators: WGI_INDICATORS,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Indicator> {
        self.indicators.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = &'static str> {
        self.indicators.iter().map(|i| i.code)
    }

    /// Case-insensitive lookup by short code.
    pub fn get(&self, code: &str) -> Option<&'static Indicator> {
        let code = code.trim();
        self.indicators
            .iter()
            .find(|i| i.code.eq_ignore_ascii_case(code))
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}

impl Default for IndicatorCatalog {
    fn default() -> Self {
        Self::wgi()
    }
}

/// Measurement facet of an (indicator, country, year) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    Estimate,
    StdDev,
    PctRank,
    NSource,
    PctRankLower,
    PctRankUpper,
}

impl Variable {
    pub const ALL: [Variable; 6] = [
        Variable::Estimate,
        Variable::StdDev,
        Variable::NSource,
        Variable::PctRank,
        Variable::PctRankLower,
        Variable::PctRankUpper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variable::Estimate => "estimate",
            Variable::StdDev => "stddev",
            Variable::PctRank => "pctrank",
            Variable::NSource => "nsource",
            Variable::PctRankLower => "pctranklower",
            Variable::PctRankUpper => "pctrankupper",
        }
    }

    /// Map a spreadsheet header token (already lower-cased) to its canonical
    /// variable name. Unknown tokens are returned unchanged so that schema
    /// validation can report them.
    pub fn canonical_token(token: &str) -> &str {
        match token {
            "estimate" | "est" => "estimate",
            "stderr" | "stddev" | "sd" => "stddev",
            "numsrc" | "nsource" | "nsources" => "nsource",
            "rank" | "pctrank" => "pctrank",
            "lower" | "pctranklower" => "pctranklower",
            "upper" | "pctrankupper" => "pctrankupper",
            other => other,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match Variable::canonical_token(&lower) {
            "estimate" => Ok(Variable::Estimate),
            "stddev" => Ok(Variable::StdDev),
            "pctrank" => Ok(Variable::PctRank),
            "nsource" => Ok(Variable::NSource),
            "pctranklower" => Ok(Variable::PctRankLower),
            "pctrankupper" => Ok(Variable::PctRankUpper),
            _ => Err(format!("unknown variable `{}`", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_six_unique_codes() {
        let catalog = IndicatorCatalog::wgi();
        let mut codes: Vec<_> = catalog.codes().collect();
        assert_eq!(codes.len(), 6);
        codes.sort();
        codes.dedup();
        assert_eq!(codes, vec!["cc", "ge", "pv", "rl", "rq", "va"]);
    }

    #[test]
    fn lookup_ignores_case() {
        let catalog = IndicatorCatalog::wgi();
        assert_eq!(catalog.get("VA").map(|i| i.sheet), Some("VoiceandAccountability"));
        assert!(catalog.get("xx").is_none());
    }

    #[test]
    fn spreadsheet_aliases_parse() {
        assert_eq!("Estimate".parse::<Variable>(), Ok(Variable::Estimate));
        assert_eq!("StdErr".parse::<Variable>(), Ok(Variable::StdDev));
        assert_eq!("NumSrc".parse::<Variable>(), Ok(Variable::NSource));
        assert_eq!("Rank".parse::<Variable>(), Ok(Variable::PctRank));
        assert_eq!("Lower".parse::<Variable>(), Ok(Variable::PctRankLower));
        assert_eq!("upper".parse::<Variable>(), Ok(Variable::PctRankUpper));
        assert!("median".parse::<Variable>().is_err());
    }
}
