//! yt-dlp wrapper for video extraction
//!
//! Metadata, search results and channel listings all come from
//! `yt-dlp --dump-single-json`; the player later resolves the concrete
//! stream itself from the format filter it is given.

use crate::extractor::models::{FlatListing, Metadata, SearchEntry, VideoInfo};
use crate::extractor::traits::Extractor;
use crate::utils::config::AppSettings;
use crate::utils::error::BorgorError;
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Video extractor backed by the yt-dlp executable
pub struct YtDlpExtractor {
    ytdlp_path: PathBuf,
    user_agent: String,
    timeout: Duration,
}

impl YtDlpExtractor {
    /// Initialize extractor and verify yt-dlp availability
    ///
    /// Uses the configured path when set, otherwise searches PATH and common
    /// installation directories.
    pub fn new(settings: &AppSettings) -> Result<Self> {
        let ytdlp_path = match settings.extractor_path.clone().or_else(find_ytdlp) {
            Some(path) => {
                info!("Using yt-dlp at: {}", path.display());
                path
            }
            None => {
                error!("yt-dlp not found anywhere!");
                return Err(BorgorError::ToolNotFound("yt-dlp").into());
            }
        };

        Ok(Self {
            ytdlp_path,
            user_agent: settings.user_agent.clone(),
            timeout: settings.extraction_timeout(),
        })
    }

    /// Get the path to yt-dlp being used
    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }

    /// Run yt-dlp with `args` and return its stdout, bounded by the extraction timeout
    async fn run(&self, args: &[&str]) -> Result<String> {
        let mut command = AsyncCommand::new(&self.ytdlp_path);
        command
            .arg("--dump-single-json")
            .arg("--no-warnings")
            .arg("--quiet")
            .arg("--user-agent")
            .arg(&self.user_agent)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = timeout(self.timeout, command.output())
            .await
            .map_err(|_| BorgorError::Timeout("yt-dlp extraction"))??;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp failed: {}", error_msg.trim());
            return Err(BorgorError::OperationFailed(error_msg.trim().to_string()).into());
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn id(&self) -> &'static str {
        "ytdlp"
    }

    async fn extract_info(&self, reference: &str, cookie_file: Option<&Path>) -> Result<Metadata> {
        debug!(
            "Extracting video info for {} (cookies: {:?})",
            reference, cookie_file
        );

        let cookie_arg = cookie_file.map(|p| p.to_string_lossy().into_owned());
        let mut args = vec!["--skip-download"];
        if let Some(cookies) = cookie_arg.as_deref() {
            args.push("--cookies");
            args.push(cookies);
        }
        args.push("--");
        args.push(reference);

        let json_str = self.run(&args).await?;
        let info: VideoInfo = serde_json::from_str(&json_str)?;
        Ok(Metadata::from_info(&info, reference))
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchEntry>> {
        debug!("Searching for: {} (count: {})", query, max_results);

        let expr = format!("ytsearch{}:{}", max_results, query);
        let json_str = self.run(&["--flat-playlist", "--", &expr]).await?;
        let listing: FlatListing = serde_json::from_str(&json_str)?;
        Ok(listing.into_entries(max_results))
    }

    async fn channel_videos(&self, channel_url: &str, max_results: usize) -> Result<Vec<SearchEntry>> {
        debug!("Listing channel {} (count: {})", channel_url, max_results);

        let json_str = self.run(&["--flat-playlist", "--", channel_url]).await?;
        let listing: FlatListing = serde_json::from_str(&json_str)?;
        Ok(listing.into_entries(max_results))
    }
}

// ============================================================
// yt-dlp Detection Functions
// ============================================================

/// Find yt-dlp binary on PATH or in common installation paths
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Ok(path) = which::which("yt-dlp") {
        debug!("Using system yt-dlp: {:?}", path);
        return Some(path);
    }

    if let Some(common) = find_in_common_paths() {
        debug!("Using yt-dlp from common path: {:?}", common);
        return Some(common);
    }

    warn!("yt-dlp not found anywhere!");
    None
}

/// Find yt-dlp in common installation paths
fn find_in_common_paths() -> Option<PathBuf> {
    let mut candidates = vec![
        // macOS Homebrew (Apple Silicon)
        PathBuf::from("/opt/homebrew/bin/yt-dlp"),
        // macOS Homebrew (Intel)
        PathBuf::from("/usr/local/bin/yt-dlp"),
        PathBuf::from("/usr/bin/yt-dlp"),
    ];
    // pip user install
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local/bin/yt-dlp"));
    }

    candidates
        .into_iter()
        .find(|path| path.is_file() && is_executable(path))
}

/// Check if a file is executable
pub(crate) fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        // On Windows, just check if file exists
        path.exists()
    }
}

// ============================================================
// Tests
// ============================================================
