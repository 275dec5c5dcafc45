use std::path::PathBuf;

/// Run configuration, passed explicitly into the pipeline entry points.
#[derive(Debug, Clone)]
pub struct Config {
    /// Genres to scrape, in the order partitions are merged.
    pub genres: Vec<String>,
    /// Search URL prefix; the lowercased genre is appended.
    pub base_url: String,
    /// Directory holding the per-genre partition files.
    pub data_dir: PathBuf,
    /// SQLite database holding the master table.
    pub db_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            genres: ["action", "adventure", "animation", "sport", "sci-fi"]
                .map(String::from)
                .to_vec(),
            base_url: "https://www.imdb.com/search/title/?title_type=feature&release_date=2024-01-01,2024-12-31&genres=".to_string(),
            data_dir: PathBuf::from("data"),
            db_path: PathBuf::from("data/movies.sqlite"),
        }
    }
}
