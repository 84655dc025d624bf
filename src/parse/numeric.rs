use once_cell::sync::Lazy;
use regex::Regex;

static COUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9][0-9,]*(?:\.[0-9]+)?)\s*(?:([kKmMbB])\b)?").expect("count pattern is valid")
});

/// Parses a free-text count such as "1,234", "1.2K" or "12 replies"
///
/// Takes the first number in the string and applies a K/M/B multiplier when
/// one follows it as a whole word. Returns None when the string holds no number.
pub fn parse_count(raw: &str) -> Option<i64> {
    let caps = COUNT_RE.captures(raw.trim())?;
    let digits = caps.get(1)?.as_str().replace(',', "");
    let value: f64 = digits.parse().ok()?;

    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("k") | Some("K") => 1_000.0,
        Some("m") | Some("M") => 1_000_000.0,
        Some("b") | Some("B") => 1_000_000_000.0,
        _ => 1.0,
    };

    Some((value * multiplier).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_grouped() {
        assert_eq!(parse_count("42"), Some(42));
        assert_eq!(parse_count("1,234"), Some(1234));
        assert_eq!(parse_count(" 12 replies"), Some(12));
    }

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(parse_count("1.2K"), Some(1200));
        assert_eq!(parse_count("3M subscribers"), Some(3_000_000));
        assert_eq!(parse_count("2.5b"), Some(2_500_000_000));
        assert_eq!(parse_count("4 k"), Some(4000));
    }

    #[test]
    fn test_parse_no_number() {
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("Unknown"), None);
    }

    #[test]
    fn test_unit_words_are_not_multipliers() {
        assert_eq!(parse_count("12 members"), Some(12));
        assert_eq!(parse_count("3 bookmarks"), Some(3));
        assert_eq!(parse_count("1,204 Members"), Some(1204));
        assert_eq!(parse_count("7likes"), Some(7));
    }
}
