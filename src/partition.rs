use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::db::MovieRecord;
use crate::normalize::NormalizedMovie;

/// All records sharing one genre, in original fetch order. Persisted as
/// one unit by the partition store.
#[derive(Debug, Clone)]
pub struct GenrePartition {
    pub genre: String,
    pub rows: Vec<MovieRecord>,
}

pub struct PartitionReport {
    pub records_in: usize,
    pub rows_out: usize,
    pub dropped_no_genre: usize,
    pub duplicates: usize,
}

impl PartitionReport {
    pub fn print(&self) {
        println!(
            "Partitioned {} records into {} rows ({} without genre dropped, {} duplicates collapsed).",
            self.records_in, self.rows_out, self.dropped_no_genre, self.duplicates,
        );
    }
}

/// Fan each record out to one row per genre token and group rows by
/// genre. Partitions come back in first-seen genre order; rows within a
/// partition keep their input order. A record whose genre text yields no
/// non-empty token is dropped and counted, never silently lost. Within a
/// partition, a repeated (title, genre, duration, rating, votes) tuple
/// keeps its first occurrence only.
pub fn partition_by_genre(records: &[NormalizedMovie]) -> (Vec<GenrePartition>, PartitionReport) {
    let mut partitions: Vec<GenrePartition> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut seen: HashSet<(String, String, Option<i64>, Option<u64>, Option<i64>)> =
        HashSet::new();

    let mut report = PartitionReport {
        records_in: records.len(),
        rows_out: 0,
        dropped_no_genre: 0,
        duplicates: 0,
    };

    for record in records {
        let genres: Vec<&str> = record
            .genre_text
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .collect();

        if genres.is_empty() {
            warn!("Dropping record without genre: {}", record.title);
            report.dropped_no_genre += 1;
            continue;
        }

        for genre in genres {
            let key = (
                record.title.clone(),
                genre.to_string(),
                record.duration_minutes,
                record.rating.map(f64::to_bits),
                record.votes,
            );
            if !seen.insert(key) {
                report.duplicates += 1;
                continue;
            }

            let row = MovieRecord {
                title: record.title.clone(),
                genre: genre.to_string(),
                rating: record.rating,
                votes: record.votes,
                duration_minutes: record.duration_minutes,
            };

            let slot = *index.entry(genre.to_string()).or_insert_with(|| {
                partitions.push(GenrePartition {
                    genre: genre.to_string(),
                    rows: Vec::new(),
                });
                partitions.len() - 1
            });
            partitions[slot].rows.push(row);
            report.rows_out += 1;
        }
    }

    (partitions, report)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, genre_text: &str) -> NormalizedMovie {
        NormalizedMovie {
            title: title.to_string(),
            rating: Some(7.0),
            votes: Some(1000),
            duration_minutes: Some(110),
            genre_text: genre_text.to_string(),
        }
    }

    #[test]
    fn multi_genre_record_fans_out() {
        let (partitions, report) = partition_by_genre(&[record("Movie", "Action, Adventure")]);
        assert_eq!(partitions.len(), 2);
        assert_eq!(report.rows_out, 2);

        let action = &partitions[0];
        let adventure = &partitions[1];
        assert_eq!(action.genre, "Action");
        assert_eq!(adventure.genre, "Adventure");
        // All fields identical except the genre.
        assert_eq!(action.rows[0].title, adventure.rows[0].title);
        assert_eq!(action.rows[0].rating, adventure.rows[0].rating);
        assert_eq!(action.rows[0].votes, adventure.rows[0].votes);
        assert_eq!(
            action.rows[0].duration_minutes,
            adventure.rows[0].duration_minutes
        );
    }

    #[test]
    fn genre_tokens_are_trimmed() {
        let (partitions, _) = partition_by_genre(&[record("Movie", " Sci-Fi ,  Sport")]);
        let genres: Vec<&str> = partitions.iter().map(|p| p.genre.as_str()).collect();
        assert_eq!(genres, vec!["Sci-Fi", "Sport"]);
    }

    #[test]
    fn empty_genre_is_dropped_and_counted() {
        let (partitions, report) =
            partition_by_genre(&[record("Ghost", ""), record("Comma", " , "), record("Kept", "Action")]);
        assert_eq!(partitions.len(), 1);
        assert_eq!(report.dropped_no_genre, 2);
        assert_eq!(report.rows_out, 1);
    }

    #[test]
    fn duplicate_records_collapse_within_partition() {
        let (partitions, report) =
            partition_by_genre(&[record("Rescraped", "Action"), record("Rescraped", "Action")]);
        assert_eq!(partitions[0].rows.len(), 1);
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn differing_fields_do_not_collapse() {
        let mut second = record("Same Title", "Action");
        second.rating = Some(8.0);
        let (partitions, report) =
            partition_by_genre(&[record("Same Title", "Action"), second]);
        assert_eq!(partitions[0].rows.len(), 2);
        assert_eq!(report.duplicates, 0);
    }

    #[test]
    fn input_order_is_preserved_per_genre() {
        let (partitions, _) = partition_by_genre(&[
            record("First", "Action"),
            record("Other", "Sport"),
            record("Second", "Action"),
        ]);
        let titles: Vec<&str> = partitions[0].rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }
}
