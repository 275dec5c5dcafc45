use std::sync::LazyLock;

use regex::Regex;

use crate::scrape::RawRecord;

static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*h").unwrap());
static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:min|m)").unwrap());

/// A movie with typed fields whose genre is still the raw, possibly
/// comma-delimited scrape text. The partitioner fans this out to one
/// record per genre.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMovie {
    pub title: String,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
    pub duration_minutes: Option<i64>,
    pub genre_text: String,
}

/// All three parsers are total: unparsable input becomes None, never an
/// error. Nulls are counted by the caller, not corrected here.
pub fn normalize(raw: &RawRecord) -> NormalizedMovie {
    NormalizedMovie {
        title: raw.title.trim().to_string(),
        rating: raw.rating_text.as_deref().and_then(parse_rating),
        votes: raw.votes_text.as_deref().and_then(parse_votes),
        duration_minutes: raw.duration_text.as_deref().and_then(parse_duration),
        genre_text: raw.genre_text.clone(),
    }
}

/// "7.5" -> 7.5. Out-of-range values pass through unclamped.
pub fn parse_rating(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok()
}

/// "(12,345)" -> 12345, "1.2K" -> 1200. Parentheses and thousands
/// separators are stripped; a K suffix scales a float prefix by 1000,
/// truncating.
pub fn parse_votes(text: &str) -> Option<i64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | ','))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    let upper = cleaned.to_ascii_uppercase();
    if let Some(prefix) = upper.strip_suffix('K') {
        prefix
            .trim()
            .parse::<f64>()
            .ok()
            .map(|v| (v * 1000.0) as i64)
    } else {
        cleaned.parse::<i64>().ok()
    }
}

/// "2h 15m" -> 135, "2h" -> 120. A string with digits but no h/m unit
/// falls back to stripping non-digits and reading the rest as raw
/// minutes, so "95" -> 95. A computed total of zero means no duration
/// was found, not a zero-length movie.
pub fn parse_duration(text: &str) -> Option<i64> {
    let mut total: i64 = 0;
    if let Some(caps) = HOURS_RE.captures(text) {
        total += caps[1].parse::<i64>().unwrap_or(0) * 60;
    }
    if let Some(caps) = MINUTES_RE.captures(text) {
        total += caps[1].parse::<i64>().unwrap_or(0);
    }
    if total == 0 && text.chars().any(|c| c.is_ascii_digit()) {
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        total = digits.parse().unwrap_or(0);
    }
    (total > 0).then_some(total)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_parses_decimal() {
        assert_eq!(parse_rating("7.5"), Some(7.5));
        assert_eq!(parse_rating(" 8.0 "), Some(8.0));
        assert_eq!(parse_rating(""), None);
        assert_eq!(parse_rating("N/A"), None);
        // Garbage-in-garbage-out: no clamping to 0..10.
        assert_eq!(parse_rating("11.2"), Some(11.2));
    }

    #[test]
    fn votes_strip_separators_and_parens() {
        assert_eq!(parse_votes("1,234"), Some(1234));
        assert_eq!(parse_votes("(12,345)"), Some(12345));
        assert_eq!(parse_votes("42"), Some(42));
    }

    #[test]
    fn votes_k_suffix_scales_by_thousand() {
        assert_eq!(parse_votes("1.2K"), Some(1200));
        assert_eq!(parse_votes("(2.5k)"), Some(2500));
        assert_eq!(parse_votes("13K"), Some(13000));
        // Truncation, not rounding.
        assert_eq!(parse_votes("1.2345K"), Some(1234));
    }

    #[test]
    fn votes_unparsable_is_none() {
        assert_eq!(parse_votes(""), None);
        assert_eq!(parse_votes("abc"), None);
        assert_eq!(parse_votes("()"), None);
        assert_eq!(parse_votes("xK"), None);
    }

    #[test]
    fn duration_hours_and_minutes() {
        assert_eq!(parse_duration("2h 15m"), Some(135));
        assert_eq!(parse_duration("2h 15min"), Some(135));
        assert_eq!(parse_duration("1H 5M"), Some(65));
        assert_eq!(parse_duration("45m"), Some(45));
    }

    #[test]
    fn duration_hours_only() {
        assert_eq!(parse_duration("2h"), Some(120));
    }

    #[test]
    fn duration_bare_digits_fallback() {
        assert_eq!(parse_duration("95"), Some(95));
        assert_eq!(parse_duration("approx. 95"), Some(95));
    }

    #[test]
    fn duration_no_digits_is_none() {
        assert_eq!(parse_duration("N/A"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("0m"), None);
    }

    #[test]
    fn normalize_maps_missing_fields_to_none() {
        let raw = RawRecord {
            title: "  Some Movie  ".to_string(),
            rating_text: None,
            votes_text: Some("(1.2K)".to_string()),
            duration_text: Some("2h".to_string()),
            genre_text: "Action, Adventure".to_string(),
        };
        let n = normalize(&raw);
        assert_eq!(n.title, "Some Movie");
        assert_eq!(n.rating, None);
        assert_eq!(n.votes, Some(1200));
        assert_eq!(n.duration_minutes, Some(120));
        assert_eq!(n.genre_text, "Action, Adventure");
    }
}
