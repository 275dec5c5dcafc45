use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::scrape::RawRecord;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s+(.+)$").unwrap());
static LINK_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]*)\]\([^)]*\)$").unwrap());
static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*\(([^)]+)\)").unwrap());
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:\d+\s*h(?:\s*\d+\s*m(?:in)?)?|\d+\s*m(?:in)?)\b").unwrap()
});

/// Walk a scraped search-results page (markdown) and collect one
/// RawRecord per numbered listing entry. An entry starts at a
/// "N. Title" line; subsequent lines contribute the first rating/votes
/// pair and the first duration token seen before the next entry. Field
/// text is passed through raw; typing happens in the normalizer.
///
/// Returns the records plus the count of entries skipped for having no
/// usable title. Skipping is per-entry: a bad entry never aborts the
/// page.
pub fn parse_listing(markdown: &str, genre: &str) -> (Vec<RawRecord>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0;
    let mut current: Option<RawRecord> = None;

    for line in markdown.lines() {
        let line = line.trim();

        if let Some(caps) = TITLE_RE.captures(line) {
            flush(&mut current, &mut records, &mut skipped);
            let raw_title = caps[1].trim();
            // Unwrap [Title](url) down to the text.
            let title = LINK_TEXT_RE
                .captures(raw_title)
                .map_or_else(|| raw_title.to_string(), |c| c[1].trim().to_string());
            current = Some(RawRecord {
                title,
                rating_text: None,
                votes_text: None,
                duration_text: None,
                genre_text: genre.to_string(),
            });
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };

        if entry.rating_text.is_none() {
            if let Some(caps) = RATING_RE.captures(line) {
                entry.rating_text = Some(caps[1].to_string());
                entry.votes_text = Some(format!("({})", &caps[2]));
                continue;
            }
        }

        if entry.duration_text.is_none() {
            if let Some(m) = DURATION_RE.find(line) {
                entry.duration_text = Some(m.as_str().to_string());
            }
        }
    }

    flush(&mut current, &mut records, &mut skipped);
    (records, skipped)
}

fn flush(current: &mut Option<RawRecord>, records: &mut Vec<RawRecord>, skipped: &mut usize) {
    if let Some(entry) = current.take() {
        if entry.title.is_empty() {
            warn!("Skipping listing entry without a title");
            *skipped += 1;
        } else {
            records.push(entry);
        }
    }
}

// ── Tests ──
