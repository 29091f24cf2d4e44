use once_cell::sync::Lazy;
use regex::Regex;

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Positional placeholders spreadsheet readers invent for blank header cells:
/// `column 3`, `Unnamed: 3`, `...3`, `X3`.
static INDEX_ARTIFACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:column\s*\d+|unnamed:?\s*\d+(?:_level_\d+)?|\.\.\.\d+|x\d+)[\s_.:-]*")
        .expect("index artifact regex should compile")
});

/// Strip a leading positional-index artifact from a header token.
pub fn strip_index_artifact(token: &str) -> String {
    INDEX_ARTIFACT.replace(token, "").into_owned()
}

/// Lower-case a header token and turn path separators and runs of
/// whitespace into single underscores.
pub fn normalize_token(raw: &str) -> String {
    let cleaned = strip_index_artifact(&clean_str(raw));
    let mut out = String::with_capacity(cleaned.len());
    let mut pending_sep = false;
    for ch in cleaned.chars() {
        if ch == '/' || ch == '\\' || ch.is_whitespace() || ch == '_' {
            pending_sep = !out.is_empty();
            continue;
        }
        if pending_sep {
            out.push('_');
            pending_sep = false;
        }
        out.extend(ch.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_generic_column_prefixes() {
        assert_eq!(strip_index_artifact("column 3estimate"), "estimate");
        assert_eq!(strip_index_artifact("Unnamed: 4"), "");
        assert_eq!(strip_index_artifact("...5"), "");
        assert_eq!(strip_index_artifact("2020"), "2020");
    }

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(normalize_token("Country/Territory"), "country_territory");
        assert_eq!(normalize_token("  Std Err "), "std_err");
        assert_eq!(normalize_token("\"Estimate\""), "estimate");
        assert_eq!(normalize_token("a\\b"), "a_b");
    }
}
