use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::normalize;
use crate::partition::{self, PartitionReport};
use crate::scrape::{ScrapeReport, ScrapeSource};
use crate::store::PartitionStore;

#[derive(Debug)]
pub struct MergeReport {
    pub partitions_read: usize,
    pub partitions_missing: usize,
    pub rows_loaded: usize,
}

impl MergeReport {
    pub fn print(&self) {
        println!(
            "Merged {} partitions ({} missing) into {} master rows.",
            self.partitions_read, self.partitions_missing, self.rows_loaded,
        );
    }
}

pub struct RunReport {
    pub scrape: ScrapeReport,
    pub partition: PartitionReport,
    pub merge: MergeReport,
}

impl RunReport {
    pub fn print(&self) {
        self.scrape.print();
        self.partition.print();
        self.merge.print();
    }
}

/// Full sequential batch: scrape → normalize → partition → persist each
/// partition → read them all back → merge → replace the master table.
/// Re-running on the same input produces the same master contents.
pub async fn run<S: ScrapeSource>(
    source: &S,
    config: &Config,
    conn: &Connection,
) -> Result<RunReport> {
    let store = PartitionStore::new(&config.data_dir);
    let (scrape, partition, genre_order) = scrape_and_partition(source, config, &store).await?;
    // Merge goes through the files just written, in first-seen genre
    // order, so a partition that failed to land surfaces as a
    // missing-partition warning rather than stale in-memory data.
    let merge = merge_partitions(&store, &genre_order, conn)?;
    Ok(RunReport {
        scrape,
        partition,
        merge,
    })
}

/// Phases 1–2: fetch every configured genre, normalize, partition, and
/// persist each partition. A genre whose fetch fails is skipped with a
/// warning; its partition is simply absent at merge time. Returns the
/// written partition keys in first-seen order.
pub async fn scrape_and_partition<S: ScrapeSource>(
    source: &S,
    config: &Config,
    store: &PartitionStore,
) -> Result<(ScrapeReport, PartitionReport, Vec<String>)> {
    let mut report = ScrapeReport::default();
    let mut normalized = Vec::new();

    let pb = ProgressBar::new(config.genres.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    for genre in &config.genres {
        pb.set_message(genre.clone());
        match source.fetch(genre).await {
            Ok((records, skipped)) => {
                report.genres_fetched += 1;
                report.records += records.len();
                report.entries_skipped += skipped;
                normalized.extend(records.iter().map(normalize::normalize));
            }
            Err(e) => {
                warn!("Fetch failed for genre {}: {:#}", genre, e);
                report.genres_failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let (partitions, partition_report) = partition::partition_by_genre(&normalized);
    for p in &partitions {
        store.write(&p.genre, &p.rows)?;
    }
    info!(
        "Wrote {} partition files under {}",
        partitions.len(),
        config.data_dir.display()
    );

    let genre_order = partitions.into_iter().map(|p| p.genre).collect();
    Ok((report, partition_report, genre_order))
}

/// Phase 3: read the named partitions back in the given order and
/// rebuild the master table wholesale. Missing partitions are warnings;
/// merging proceeds with whatever is present. Zero rows overall is a
/// distinct "no data" failure, not a store error.
pub fn merge_partitions(
    store: &PartitionStore,
    genres: &[String],
    conn: &Connection,
) -> Result<MergeReport> {
    let mut rows = Vec::new();
    let mut partitions_read = 0;
    let mut partitions_missing = 0;

    for genre in genres {
        match store.read(genre)? {
            Some(partition_rows) => {
                partitions_read += 1;
                rows.extend(partition_rows);
            }
            None => {
                warn!("Expected partition missing: {}", genre);
                partitions_missing += 1;
            }
        }
    }

    if rows.is_empty() {
        bail!(
            "No data: none of the {} expected partition(s) contained rows; master table left untouched",
            genres.len()
        );
    }

    let rows_loaded = db::replace_all(conn, &rows)?;
    info!("Master table rebuilt with {} rows", rows_loaded);

    Ok(MergeReport {
        partitions_read,
        partitions_missing,
        rows_loaded,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MovieRecord;
    use crate::scrape::RawRecord;

    /// Synthetic source: canned records per genre, one genre that always
    /// fails to fetch.
    struct FixtureSource;

    fn raw(title: &str, genre_text: &str, rating: &str, votes: &str, duration: &str) -> RawRecord {
        RawRecord {
            title: title.to_string(),
            rating_text: Some(rating.to_string()),
            votes_text: Some(votes.to_string()),
            duration_text: Some(duration.to_string()),
            genre_text: genre_text.to_string(),
        }
    }

    impl ScrapeSource for FixtureSource {
        async fn fetch(&self, genre: &str) -> Result<(Vec<RawRecord>, usize)> {
            match genre {
                "action" => Ok((
                    vec![
                        raw("Dune: Part Two", "Action, Adventure", "8.6", "(580K)", "2h 46m"),
                        raw("The Fall Guy", "Action", "6.9", "(210K)", "2h 6m"),
                    ],
                    1,
                )),
                "sport" => Ok((
                    vec![raw("The Iron Claw", "Sport", "7.8", "(120K)", "2h 12m")],
                    0,
                )),
                _ => bail!("connection reset"),
            }
        }
    }

    fn test_config(dir: &std::path::Path) -> Config {
        Config {
            genres: vec!["action".into(), "sport".into(), "western".into()],
            data_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        conn
    }

    #[tokio::test]
    async fn full_run_loads_master_table() {
        let dir = tempfile::tempdir().unwrap();
        let conn = test_conn();
        let report = run(&FixtureSource, &test_config(dir.path()), &conn)
            .await
            .unwrap();

        assert_eq!(report.scrape.genres_fetched, 2);
        assert_eq!(report.scrape.genres_failed, 1);
        assert_eq!(report.scrape.entries_skipped, 1);
        // Dune fans out to Action + Adventure.
        assert_eq!(report.partition.rows_out, 4);
        assert_eq!(report.merge.rows_loaded, 4);

        let rows = db::select_all(&conn).unwrap();
        let genres: Vec<&str> = rows.iter().map(|r| r.genre.as_str()).collect();
        // First-seen partition order, insertion order within each.
        assert_eq!(genres, vec!["Action", "Action", "Adventure", "Sport"]);
    }

    #[tokio::test]
    async fn rerun_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let conn = test_conn();
        let config = test_config(dir.path());

        run(&FixtureSource, &config, &conn).await.unwrap();
        let first = db::select_all(&conn).unwrap();
        run(&FixtureSource, &config, &conn).await.unwrap();
        let second = db::select_all(&conn).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn merge_survives_missing_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let store = PartitionStore::new(dir.path());
        let conn = test_conn();

        let row = MovieRecord {
            title: "Challengers".to_string(),
            genre: "Sport".to_string(),
            rating: Some(7.1),
            votes: Some(90_000),
            duration_minutes: Some(131),
        };
        store.write("Sport", &[row.clone()]).unwrap();

        let genres: Vec<String> = ["Action", "Adventure", "Animation", "Sport", "Sci-Fi"]
            .map(String::from)
            .to_vec();
        let report = merge_partitions(&store, &genres, &conn).unwrap();
        assert_eq!(report.partitions_read, 1);
        assert_eq!(report.partitions_missing, 4);
        assert_eq!(db::select_all(&conn).unwrap(), vec![row]);
    }

    #[test]
    fn merge_with_no_rows_is_a_distinct_no_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = PartitionStore::new(dir.path());
        let conn = test_conn();

        let err = merge_partitions(&store, &["action".to_string()], &conn).unwrap_err();
        assert!(err.to_string().contains("No data"));
    }
}
