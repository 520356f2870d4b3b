use once_cell::sync::Lazy;
use regex::Regex;

use crate::fetch::CellValue;

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").expect("valid regex"));
static QUOTE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r#""{2,}"#).expect("valid regex"));

/// Lowercase every header and turn spaces into underscores. One output per
/// input, same order, no dedup.
pub fn normalize_column_names<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    columns
        .iter()
        .map(|c| c.as_ref().to_lowercase().replace(' ', "_"))
        .collect()
}

/// Names that occur more than once, in first-seen order.
pub fn duplicate_columns(columns: &[String]) -> Vec<String> {
    let mut dups: Vec<String> = Vec::new();
    for (i, c) in columns.iter().enumerate() {
        if columns[..i].contains(c) && !dups.contains(c) {
            dups.push(c.clone());
        }
    }
    dups
}

/// Clean one text value:
/// 1) every run of CR/LF becomes a single space
/// 2) outer quote characters are stripped
/// 3) runs of quotes collapse to one
///
/// Idempotent: the output has no line breaks, no outer quotes and no
/// adjacent quotes left to act on.
pub fn clean_str(raw: &str) -> String {
    let flat = LINE_BREAKS.replace_all(raw, " ");
    let stripped = flat.trim_matches('"');
    QUOTE_RUNS.replace_all(stripped, "\"").into_owned()
}

/// Apply [`clean_str`] to text cells; every other cell passes through.
pub fn clean_field(value: CellValue) -> CellValue {
    match value {
        CellValue::Text(s) => CellValue::Text(clean_str(&s)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_headers() {
        let cols = normalize_column_names(&["Full Name", "Email Address", "id"]);
        assert_eq!(cols, vec!["full_name", "email_address", "id"]);
        assert!(normalize_column_names::<&str>(&[]).is_empty());
    }

    #[test]
    fn duplicates_are_reported_not_removed() {
        let cols = normalize_column_names(&["Name", "name", "Other", "NAME"]);
        assert_eq!(cols.len(), 4);
        assert_eq!(duplicate_columns(&cols), vec!["name"]);
    }

    #[test]
    fn line_breaks_collapse_to_space() {
        assert_eq!(clean_str("line1\r\nline2"), "line1 line2");
        assert_eq!(clean_str("a\n\n\nb\rc"), "a b c");
    }

    #[test]
    fn quotes_are_stripped_and_collapsed() {
        assert_eq!(clean_str("\"quoted\"\"inside\""), "quoted\"inside");
        assert_eq!(clean_str("\"\"\"x\"\"\""), "x");
        assert_eq!(clean_str("a\"\"\"\"b"), "a\"b");
        assert_eq!(clean_str("plain"), "plain");
    }

    #[test]
    fn non_text_passes_through() {
        assert_eq!(clean_field(CellValue::Int(3)), CellValue::Int(3));
        assert_eq!(clean_field(CellValue::Null), CellValue::Null);
        assert_eq!(clean_field(CellValue::Float(1.5)), CellValue::Float(1.5));
    }

    proptest! {
        #[test]
        fn normalize_keeps_shape(cols in proptest::collection::vec("[A-Za-z ]{0,12}", 0..8)) {
            let out = normalize_column_names(&cols);
            prop_assert_eq!(out.len(), cols.len());
            for (o, c) in out.iter().zip(&cols) {
                prop_assert!(!o.contains(' '));
                prop_assert_eq!(o, &o.to_lowercase());
                prop_assert_eq!(o.len(), c.len());
            }
        }

        #[test]
        fn clean_is_idempotent(s in "[a-z\"\r\n ]{0,24}") {
            let once = clean_str(&s);
            prop_assert_eq!(clean_str(&once), once.clone());
            prop_assert!(!once.contains('\n') && !once.contains('\r'));
        }
    }
}
