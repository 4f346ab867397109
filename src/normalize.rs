use once_cell::sync::Lazy;
use regex::Regex;

// Chat-app paste cleanup: "3) 123456789", "12. 123456789", "5- 123456789".
static LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\s*[.\-)]\s*").unwrap());
// Narrower dash-only numbering, tried when the first pattern changed nothing.
static DASH_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\s*-\s*").unwrap());
static VALID_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{9}$").unwrap());

/// Turns raw free text (newline- or comma-separated, possibly numbered)
/// into the surviving 9-digit IDs in input order. Malformed tokens are
/// dropped silently; duplicates are kept.
pub fn normalize_ids(input: &str) -> Vec<String> {
    input.split(['\n', ',']).filter_map(clean_token).collect()
}

fn clean_token(raw: &str) -> Option<String> {
    let stripped = LIST_MARKER.replace(raw, "");
    let cleaned = if stripped == raw.trim() {
        DASH_MARKER.replace(&stripped, "").into_owned()
    } else {
        stripped.into_owned()
    };
    let token = cleaned.trim();
    if !token.is_empty() && VALID_ID.is_match(token) {
        Some(token.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_numbered_list_markers() {
        let ids = normalize_ids("1. 123456789\n2) 987654321, 555555555");
        assert_eq!(ids, vec!["123456789", "987654321", "555555555"]);
    }

    #[test]
    fn strips_dash_numbering() {
        assert_eq!(normalize_ids("003-123456789"), vec!["123456789"]);
        assert_eq!(normalize_ids("5- 123456789"), vec!["123456789"]);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(normalize_ids("12ab34567").is_empty());
        assert!(normalize_ids("12345678").is_empty());
        assert!(normalize_ids("1234567890").is_empty());
        assert!(normalize_ids("123 456 789").is_empty());
        assert!(normalize_ids("").is_empty());
        assert!(normalize_ids(" , \n , ").is_empty());
    }

    #[test]
    fn idempotent_on_clean_input() {
        let clean = "123456789\n987654321";
        let once = normalize_ids(clean);
        let again = normalize_ids(&once.join("\n"));
        assert_eq!(once, again);
        assert_eq!(once, vec!["123456789", "987654321"]);
    }

    #[test]
    fn preserves_order_and_duplicates() {
        let ids = normalize_ids("987654321, 123456789\n987654321");
        assert_eq!(ids, vec!["987654321", "123456789", "987654321"]);
    }

    #[test]
    fn trims_whitespace_and_crlf() {
        let ids = normalize_ids("  123456789 \r\n\t987654321\r");
        assert_eq!(ids, vec!["123456789", "987654321"]);
    }

    #[test]
    fn bare_nine_digit_id_is_untouched() {
        // The marker pattern must not eat digits that are the ID itself.
        assert_eq!(normalize_ids("123456789"), vec!["123456789"]);
    }
}
