mod config;
mod db;
mod listing;
mod normalize;
mod partition;
mod pipeline;
mod scrape;
mod store;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use config::Config;
use scrape::SpiderSource;
use store::PartitionStore;

#[derive(Parser)]
#[command(name = "imdb_scraper", about = "IMDb 2024 movie scraper + genre pipeline")]
struct Cli {
    /// Directory for per-genre partition files
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// SQLite database path
    #[arg(long)]
    db: Option<PathBuf>,
    /// Comma-separated genres (default: action,adventure,animation,sport,sci-fi)
    #[arg(long)]
    genres: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape + merge in one pipeline (partitions rewritten, master table rebuilt)
    Run,
    /// Scrape genres and write per-genre partition files only
    Scrape,
    /// Merge existing partition files into the master table
    Merge,
    /// Show master table statistics
    Stats,
    /// Print master table rows as JSON lines (dashboard feed)
    Export,
    /// Filtered movie table, top rated first
    Overview {
        /// Filter by genre (repeatable)
        #[arg(short, long)]
        genre: Vec<String>,
        /// Minimum rating (inclusive, like all bounds below)
        #[arg(long)]
        min_rating: Option<f64>,
        #[arg(long)]
        max_rating: Option<f64>,
        #[arg(long)]
        min_votes: Option<i64>,
        #[arg(long)]
        max_votes: Option<i64>,
        #[arg(long)]
        min_duration: Option<i64>,
        #[arg(long)]
        max_duration: Option<i64>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "25")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let config = build_config(&cli);

    let result = match cli.command {
        Commands::Run => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            let source = SpiderSource::new(&config)?;
            println!("Pipeline: scraping {} genres...", config.genres.len());
            let report = pipeline::run(&source, &config, &conn).await?;
            report.print();
            Ok(())
        }
        Commands::Scrape => {
            let source = SpiderSource::new(&config)?;
            let store = PartitionStore::new(&config.data_dir);
            println!("Scraping {} genres...", config.genres.len());
            let (scrape, partition, genres) =
                pipeline::scrape_and_partition(&source, &config, &store).await?;
            scrape.print();
            partition.print();
            println!("Partitions written: {}", genres.join(", "));
            Ok(())
        }
        Commands::Merge => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            let store = PartitionStore::new(&config.data_dir);
            let report = pipeline::merge_partitions(&store, &config.genres, &conn)?;
            report.print();
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Rows:          {}", s.rows);
            println!("Titles:        {}", s.titles);
            println!("Genres:        {}", s.genres);
            println!("With rating:   {}", s.rated);
            println!("With votes:    {}", s.with_votes);
            println!("With duration: {}", s.with_duration);
            Ok(())
        }
        Commands::Export => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::select_all(&conn)?;
            if rows.is_empty() {
                println!("No movie data. Run the pipeline first.");
                return Ok(());
            }
            use std::io::Write;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for row in &rows {
                serde_json::to_writer(&mut out, row)?;
                writeln!(out)?;
            }
            Ok(())
        }
        Commands::Overview {
            genre,
            min_rating,
            max_rating,
            min_votes,
            max_votes,
            min_duration,
            max_duration,
            limit,
        } => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            let filter = db::MovieFilter {
                genres: genre,
                min_rating,
                max_rating,
                min_votes,
                max_votes,
                min_duration,
                max_duration,
            };
            let rows = db::fetch_filtered(&conn, &filter, limit)?;
            if rows.is_empty() {
                println!("No movies found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<40} | {:<12} | {:>6} | {:>9} | {:>7}",
                "#", "Title", "Genre", "Rating", "Votes", "Minutes"
            );
            println!("{}", "-".repeat(90));

            for (i, r) in rows.iter().enumerate() {
                let rating = r
                    .rating
                    .map(|v| format!("{:.1}", v))
                    .unwrap_or_else(|| "-".into());
                let votes = r.votes.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
                let minutes = r
                    .duration_minutes
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{:>3} | {:<40} | {:<12} | {:>6} | {:>9} | {:>7}",
                    i + 1,
                    truncate(&r.title, 40),
                    truncate(&r.genre, 12),
                    rating,
                    votes,
                    minutes
                );
            }

            println!("\n{} movies", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn build_config(cli: &Cli) -> Config {
    let mut config = Config::default();
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(genres) = &cli.genres {
        config.genres = genres
            .split(',')
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
    }
    config
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
