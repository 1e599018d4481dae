//! Application configuration

use crate::utils::error::Result;
use crate::utils::platform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Hard-coded Chromium 132 user agent sent with every extraction and HTTP fetch
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

/// How cookies are obtained when anonymous extraction is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// Headless browser session driven over WebDriver
    WebDriver,
    /// Export from an existing local browser profile via yt-dlp
    BrowserProfile,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// External player executable (name on PATH or absolute path)
    pub player_path: PathBuf,

    /// yt-dlp location; searched for when unset
    pub extractor_path: Option<PathBuf>,

    /// User agent for extraction and HTTP fetches
    pub user_agent: String,

    /// Saved session cookies, reused until deleted by the user
    pub cookie_file: PathBuf,

    /// Player log file
    pub player_log_file: PathBuf,

    /// Directory for per-session control sockets
    pub runtime_dir: PathBuf,

    pub credential_source: CredentialSource,

    /// WebDriver endpoint (chromedriver) for headless cookie capture
    pub webdriver_url: String,

    /// Seconds to let the page settle before reading cookies
    pub webdriver_settle_secs: u64,

    /// Browser profile read when `credential_source` is `browser_profile`
    pub cookie_browser: String,

    pub http_timeout_secs: u64,
    pub control_timeout_secs: u64,
    pub extraction_timeout_secs: u64,
    pub credential_timeout_secs: u64,

    /// Interval of the separate-stream sync check
    pub sync_interval_ms: u64,

    /// Results requested per search or channel listing
    pub max_results: usize,

    /// Kill every process named like the player before each launch
    pub kill_stray_players: bool,

    /// Drop worker results that were superseded by a newer request
    pub discard_stale_results: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        let data_dir = platform::data_dir();
        Self {
            player_path: PathBuf::from("mpv"),
            extractor_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie_file: data_dir.join("cookies.txt"),
            player_log_file: data_dir.join("mpvlog.txt"),
            runtime_dir: platform::runtime_dir(),
            credential_source: CredentialSource::WebDriver,
            webdriver_url: "http://localhost:9515".to_string(),
            webdriver_settle_secs: 3,
            cookie_browser: "chromium".to_string(),
            http_timeout_secs: 5,
            control_timeout_secs: 2,
            extraction_timeout_secs: 9,
            credential_timeout_secs: 60,
            sync_interval_ms: 1000,
            max_results: 20,
            kill_stray_players: false,
            discard_stale_results: true,
        }
    }
}

impl AppSettings {
    /// Load settings from `path`, falling back to defaults if the file is
    /// missing or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<AppSettings>(&raw) {
                Ok(settings) => {
                    debug!("Loaded settings from {}", path.display());
                    settings.sanitized()
                }
                Err(e) => {
                    warn!("Ignoring malformed settings file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Enforce sane minimums on user-edited values
    fn sanitized(mut self) -> Self {
        if self.max_results == 0 {
            self.max_results = 1;
        }
        if self.sync_interval_ms == 0 {
            self.sync_interval_ms = 1000;
        }
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_secs(self.control_timeout_secs)
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub fn credential_timeout(&self) -> Duration {
        Duration::from_secs(self.credential_timeout_secs)
    }

    pub fn webdriver_settle(&self) -> Duration {
        Duration::from_secs(self.webdriver_settle_secs)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }
}
