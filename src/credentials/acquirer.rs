//! Credential acquisition fallback
//!
//! Used when anonymous extraction is rejected. The default acquirer drives a
//! headless browser over WebDriver (see `webdriver.rs`). `ProfileCookieAcquirer`
//! is the alternative for machines with a logged-in local browser profile: it
//! runs yt-dlp's `--cookies-from-browser`, which exports the profile's cookies
//! for the target site into a scratch cookie file that is then parsed.

use crate::credentials::cookies::CredentialSet;
use crate::extractor::ytdlp::find_ytdlp;
use crate::utils::config::AppSettings;
use crate::utils::error::{BorgorError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Obtains session cookies for a reference. Long-running (seconds).
#[async_trait]
pub trait CredentialAcquirer: Send + Sync {
    async fn acquire(&self, reference: &str) -> Result<CredentialSet>;
}

/// Cookies exported from a local browser profile by yt-dlp
pub struct ProfileCookieAcquirer {
    ytdlp_path: PathBuf,
    browser: String,
    user_agent: String,
    scratch_dir: PathBuf,
    timeout: Duration,
}

impl ProfileCookieAcquirer {
    pub fn new(settings: &AppSettings) -> Result<Self> {
        let ytdlp_path = settings
            .extractor_path
            .clone()
            .or_else(find_ytdlp)
            .ok_or(BorgorError::ToolNotFound("yt-dlp"))?;

        Ok(Self {
            ytdlp_path,
            browser: settings.cookie_browser.clone(),
            user_agent: settings.user_agent.clone(),
            scratch_dir: settings.runtime_dir.clone(),
            timeout: settings.credential_timeout(),
        })
    }

    async fn export_cookies(&self, reference: &str, scratch: &Path) -> Result<CredentialSet> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;

        let mut command = AsyncCommand::new(&self.ytdlp_path);
        command
            .arg("--cookies-from-browser")
            .arg(&self.browser)
            .arg("--cookies")
            .arg(scratch)
            .arg("--skip-download")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg("--user-agent")
            .arg(&self.user_agent)
            .arg("--")
            .arg(reference)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = timeout(self.timeout, command.output())
            .await
            .map_err(|_| BorgorError::CredentialAcquisition("browser session timed out".into()))?
            .map_err(|e| BorgorError::CredentialAcquisition(format!("failed to start yt-dlp: {}", e)))?;

        // yt-dlp writes the jar even when the extraction itself fails
        if !output.status.success() {
            debug!(
                "yt-dlp exited with {} while exporting cookies",
                output.status
            );
        }

        let set = match CredentialSet::load(scratch).await {
            Ok(set) if !set.is_empty() => set,
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(BorgorError::CredentialAcquisition(format!(
                    "no cookies exported from {}: {}",
                    self.browser,
                    stderr.trim()
                )));
            }
        };
        Ok(set)
    }
}

#[async_trait]
impl CredentialAcquirer for ProfileCookieAcquirer {
    async fn acquire(&self, reference: &str) -> Result<CredentialSet> {
        info!(
            "Acquiring cookies from {} for {}",
            self.browser, reference
        );

        let scratch = self
            .scratch_dir
            .join(format!("cookies-{}.txt", Uuid::new_v4()));
        let result = self.export_cookies(reference, &scratch).await;

        if let Err(e) = tokio::fs::remove_file(&scratch).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove scratch cookie file {}: {}", scratch.display(), e);
            }
        }

        let set = result?;
        info!("Acquired {} cookies", set.entries.len());
        Ok(set)
    }
}
