use anyhow::{Context, Result};
use spider_client::shapes::request::{ReturnFormat, ReturnFormatHandling};
use spider_client::{RequestParams, Spider};

use crate::config::Config;
use crate::listing;

/// An unparsed, as-scraped listing entry. Field text is whatever the
/// page showed; typing happens downstream in the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub title: String,
    pub rating_text: Option<String>,
    pub votes_text: Option<String>,
    pub duration_text: Option<String>,
    /// May hold several genres joined by ", "; the partitioner splits.
    pub genre_text: String,
}

/// Per-run scrape counters, printed at the end of the batch.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub genres_fetched: usize,
    pub genres_failed: usize,
    pub records: usize,
    pub entries_skipped: usize,
}

impl ScrapeReport {
    pub fn print(&self) {
        println!(
            "Scraped {} genres ({} failed): {} records, {} entries skipped.",
            self.genres_fetched, self.genres_failed, self.records, self.entries_skipped,
        );
    }
}

/// Anything that can produce the raw records for one genre. The
/// pipeline only needs this one capability, so tests drive it with
/// synthetic in-memory sources instead of a live page.
pub trait ScrapeSource {
    async fn fetch(&self, genre: &str) -> Result<(Vec<RawRecord>, usize)>;
}

/// Production source: fetches the search listing for a genre through
/// spider.cloud as markdown and parses it. The page structure lives
/// behind this boundary; nothing downstream sees it.
pub struct SpiderSource {
    spider: Spider,
    base_url: String,
}

impl SpiderSource {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = std::env::var("SPIDER_API_KEY")
            .map_err(|_| anyhow::anyhow!("SPIDER_API_KEY environment variable must be set"))?;
        let spider = Spider::new(Some(api_key))
            .map_err(|e| anyhow::anyhow!("Failed to create Spider client: {}", e))?;
        Ok(Self {
            spider,
            base_url: config.base_url.clone(),
        })
    }

    async fn fetch_markdown(&self, url: &str) -> Result<String> {
        let params = RequestParams {
            return_format: Some(ReturnFormatHandling::Single(ReturnFormat::Markdown)),
            ..Default::default()
        };

        let response = self
            .spider
            .scrape_url(url, Some(params), "application/json")
            .await
            .map_err(|e| anyhow::anyhow!("Spider scrape failed: {}", e))?;

        let parsed: serde_json::Value = match response.as_str() {
            Some(s) => serde_json::from_str(s).unwrap_or(response.clone()),
            None => response,
        };

        parsed
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|obj| obj.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .context("No content in spider response")
    }
}

impl ScrapeSource for SpiderSource {
    async fn fetch(&self, genre: &str) -> Result<(Vec<RawRecord>, usize)> {
        let url = format!("{}{}", self.base_url, genre.to_lowercase());
        let markdown = self.fetch_markdown(&url).await?;
        Ok(listing::parse_listing(&markdown, genre))
    }
}
