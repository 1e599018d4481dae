use crate::extractor::models::{Metadata, SearchEntry};
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Extraction backend
///
/// This trait isolates the session from the specific extraction method
/// (yt-dlp process, test double, ...).
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns a unique identifier for this extractor (e.g., "ytdlp")
    fn id(&self) -> &'static str;

    /// Extracts video metadata, optionally sending the cookies stored in `cookie_file`
    async fn extract_info(&self, reference: &str, cookie_file: Option<&Path>) -> Result<Metadata>;

    /// Searches for videos matching `query` (optional, default implementation returns an error)
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchEntry>> {
        let _ = (query, max_results);
        Err(anyhow::anyhow!("Search not supported by {}", self.id()))
    }

    /// Lists a channel's uploads (optional, default implementation returns an error)
    async fn channel_videos(&self, channel_url: &str, max_results: usize) -> Result<Vec<SearchEntry>> {
        let _ = (channel_url, max_results);
        Err(anyhow::anyhow!(
            "Channel listing not supported by {}",
            self.id()
        ))
    }
}
