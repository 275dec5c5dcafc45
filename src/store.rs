use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::db::MovieRecord;

/// Keyed persistence for genre partitions: one JSON-lines file per
/// genre under the data directory, spaces in the genre name replaced by
/// underscores.
pub struct PartitionStore {
    dir: PathBuf,
}

impl PartitionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, genre: &str) -> PathBuf {
        self.dir
            .join(format!("imdb_movies_2024_{}.jsonl", genre.replace(' ', "_")))
    }

    /// Overwrites any previous partition for this genre.
    pub fn write(&self, genre: &str, rows: &[MovieRecord]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.path_for(genre);
        let mut out = String::new();
        for row in rows {
            out.push_str(&serde_json::to_string(row)?);
            out.push('\n');
        }
        fs::write(&path, out)
            .with_context(|| format!("Failed to write partition {}", path.display()))?;
        Ok(())
    }

    /// None means no partition file exists for this genre; the merge
    /// step treats that as a warning, not an error.
    pub fn read(&self, genre: &str) -> Result<Option<Vec<MovieRecord>>> {
        let path = self.path_for(genre);
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read partition {}", path.display()))
            }
        };
        let mut rows = Vec::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            rows.push(
                serde_json::from_str(line)
                    .with_context(|| format!("Malformed row in {}", path.display()))?,
            );
        }
        Ok(Some(rows))
    }
}

// ── Tests ──
