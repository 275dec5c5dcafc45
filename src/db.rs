use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// One normalized movie row. Exactly one genre per row: a title scraped
/// under several genres appears once per genre, which is the shape the
/// per-genre aggregate queries want.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub title: String,
    pub genre: String,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
    pub duration_minutes: Option<i64>,
}

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS movies (
            id               INTEGER PRIMARY KEY,
            title            TEXT NOT NULL,
            genre            TEXT NOT NULL,
            rating           REAL,
            votes            INTEGER,
            duration_minutes INTEGER,
            loaded_at        TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_movies_genre ON movies(genre);
        CREATE INDEX IF NOT EXISTS idx_movies_rating ON movies(rating);
        ",
    )?;
    Ok(())
}

// ── Loading ──

/// Full rebuild: previous table contents are gone after this call.
/// Delete + insert run in one transaction, so a failed load never leaves
/// a half-replaced table.
pub fn replace_all(conn: &Connection, rows: &[MovieRecord]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM movies", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO movies (title, genre, rating, votes, duration_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for r in rows {
            stmt.execute(rusqlite::params![
                r.title, r.genre, r.rating, r.votes, r.duration_minutes,
            ])?;
        }
    }
    tx.commit()?;
    Ok(rows.len())
}

/// All rows in insertion order, for downstream consumers.
pub fn select_all(conn: &Connection) -> Result<Vec<MovieRecord>> {
    let mut stmt = conn.prepare(
        "SELECT title, genre, rating, votes, duration_minutes FROM movies ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MovieRecord {
                title: row.get(0)?,
                genre: row.get(1)?,
                rating: row.get(2)?,
                votes: row.get(3)?,
                duration_minutes: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Overview ──

/// Inclusive range/set filters applied by the overview query.
#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    pub genres: Vec<String>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_votes: Option<i64>,
    pub max_votes: Option<i64>,
    pub min_duration: Option<i64>,
    pub max_duration: Option<i64>,
}

pub fn fetch_filtered(
    conn: &Connection,
    filter: &MovieFilter,
    limit: usize,
) -> Result<Vec<MovieRecord>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if !filter.genres.is_empty() {
        let placeholders: Vec<String> = filter
            .genres
            .iter()
            .map(|g| {
                params.push(Box::new(g.clone()));
                format!("?{}", params.len())
            })
            .collect();
        conditions.push(format!("genre IN ({})", placeholders.join(", ")));
    }
    if let Some(v) = filter.min_rating {
        params.push(Box::new(v));
        conditions.push(format!("rating >= ?{}", params.len()));
    }
    if let Some(v) = filter.max_rating {
        params.push(Box::new(v));
        conditions.push(format!("rating <= ?{}", params.len()));
    }
    if let Some(v) = filter.min_votes {
        params.push(Box::new(v));
        conditions.push(format!("votes >= ?{}", params.len()));
    }
    if let Some(v) = filter.max_votes {
        params.push(Box::new(v));
        conditions.push(format!("votes <= ?{}", params.len()));
    }
    if let Some(v) = filter.min_duration {
        params.push(Box::new(v));
        conditions.push(format!("duration_minutes >= ?{}", params.len()));
    }
    if let Some(v) = filter.max_duration {
        params.push(Box::new(v));
        conditions.push(format!("duration_minutes <= ?{}", params.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT title, genre, rating, votes, duration_minutes
         FROM movies{}
         ORDER BY rating IS NULL, rating DESC, votes DESC
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(MovieRecord {
                title: row.get(0)?,
                genre: row.get(1)?,
                rating: row.get(2)?,
                votes: row.get(3)?,
                duration_minutes: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub rows: usize,
    pub titles: usize,
    pub genres: usize,
    pub rated: usize,
    pub with_votes: usize,
    pub with_duration: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let (rows, titles, genres, rated, with_votes, with_duration) = conn.query_row(
        "SELECT COUNT(*), COUNT(DISTINCT title), COUNT(DISTINCT genre),
                COUNT(rating), COUNT(votes), COUNT(duration_minutes)
         FROM movies",
        [],
        |r| {
            Ok((
                r.get(0)?,
                r.get(1)?,
                r.get(2)?,
                r.get(3)?,
                r.get(4)?,
                r.get(5)?,
            ))
        },
    )?;
    Ok(Stats {
        rows,
        titles,
        genres,
        rated,
        with_votes,
        with_duration,
    })
}

// ── Tests ──
