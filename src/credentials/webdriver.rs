//! Headless browser cookie capture
//!
//! Opens the video page in a headless Chrome controlled over WebDriver
//! (chromedriver on `webdriver_url`), waits for the page to settle and reads
//! back every cookie the session holds.

use crate::credentials::acquirer::CredentialAcquirer;
use crate::credentials::cookies::{Credential, CredentialSet};
use crate::utils::config::AppSettings;
use crate::utils::error::{BorgorError, Result};
use async_trait::async_trait;
use fantoccini::cookies::Cookie;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub struct WebDriverCookieAcquirer {
    webdriver_url: String,
    user_agent: String,
    settle: Duration,
    timeout: Duration,
}

impl WebDriverCookieAcquirer {
    pub fn new(settings: &AppSettings) -> Self {
        Self {
            webdriver_url: settings.webdriver_url.clone(),
            user_agent: settings.user_agent.clone(),
            settle: settings.webdriver_settle(),
            timeout: settings.credential_timeout(),
        }
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless=new",
                    "--no-sandbox",
                    "--disable-gpu",
                    format!("--user-agent={}", self.user_agent),
                ]
            }),
        );
        caps
    }

    async fn connect(&self) -> Result<Client> {
        ClientBuilder::native()
            .capabilities(self.capabilities())
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| {
                BorgorError::CredentialAcquisition(format!(
                    "failed to connect to webdriver at {}: {}",
                    self.webdriver_url, e
                ))
            })
    }

    async fn capture(&self, client: &Client, reference: &str) -> Result<Vec<Cookie<'static>>> {
        client.goto(reference).await.map_err(|e| {
            BorgorError::CredentialAcquisition(format!("failed to open {}: {}", reference, e))
        })?;
        tokio::time::sleep(self.settle).await;
        client
            .get_all_cookies()
            .await
            .map_err(|e| BorgorError::CredentialAcquisition(format!("failed to read cookies: {}", e)))
    }
}

/// Host of `reference`, used for cookies the driver reports without a domain
fn page_host(reference: &str) -> String {
    reqwest::Url::parse(reference)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Convert a WebDriver cookie into a cookie-file entry.
///
/// The driver strips the leading dot of domain cookies; any explicit domain
/// is written back as a subdomain-matching `.domain`.
pub fn credential_from_cookie(cookie: &Cookie<'_>, page_host: &str) -> Credential {
    let domain = match cookie.domain().filter(|d| !d.is_empty()) {
        Some(domain) => format!(".{}", domain.trim_start_matches('.')),
        None => page_host.to_string(),
    };

    let mut credential = Credential::new(domain, cookie.name(), cookie.value());
    if let Some(path) = cookie.path().filter(|p| !p.is_empty()) {
        credential.path = path.to_string();
    }
    credential.secure = cookie.secure().unwrap_or(false);
    credential.expiry = cookie
        .expires_datetime()
        .map(|at| at.unix_timestamp().max(0))
        .unwrap_or(0);
    credential
}

#[async_trait]
impl CredentialAcquirer for WebDriverCookieAcquirer {
    async fn acquire(&self, reference: &str) -> Result<CredentialSet> {
        info!("Launching headless browser for cookie extraction...");

        let client = timeout(self.timeout, self.connect())
            .await
            .map_err(|_| BorgorError::CredentialAcquisition("webdriver connect timed out".into()))??;

        let captured = timeout(self.timeout, self.capture(&client, reference)).await;
        if let Err(e) = client.close().await {
            warn!("Failed to close browser session: {}", e);
        }
        let cookies = captured
            .map_err(|_| BorgorError::CredentialAcquisition("browser session timed out".into()))??;

        let host = page_host(reference);
        let set = CredentialSet::new(
            cookies
                .iter()
                .map(|cookie| credential_from_cookie(cookie, &host))
                .collect(),
        );
        if set.is_empty() {
            return Err(BorgorError::CredentialAcquisition(format!(
                "browser session for {} returned no cookies",
                reference
            )));
        }

        debug!("Captured cookies: {:?}", set.entries.iter().map(|c| &c.name).collect::<Vec<_>>());
        info!("Acquired {} cookies", set.entries.len());
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_cookie_matches_subdomains() {
        let mut cookie = Cookie::new("SID", "abc");
        cookie.set_domain(".youtube.com");
        cookie.set_path("/");
        cookie.set_secure(true);

        let credential = credential_from_cookie(&cookie, "www.youtube.com");
        assert_eq!(credential.domain, ".youtube.com");
        assert!(credential.include_subdomains);
        assert!(credential.secure);
        assert_eq!(credential.path, "/");
        assert_eq!(credential.expiry, 0);
        assert_eq!(
            credential.to_line(),
            ".youtube.com\tTRUE\t/\tTRUE\t0\tSID\tabc"
        );
    }

    #[test]
    fn test_cookie_without_domain_uses_page_host() {
        let mut cookie = Cookie::new("PREF", "f6=40000000");
        cookie.set_path("/watch");

        let credential =
            credential_from_cookie(&cookie, &page_host("https://www.youtube.com/watch?v=x"));
        assert_eq!(credential.domain, "www.youtube.com");
        assert!(!credential.include_subdomains);
        assert!(!credential.secure);
        assert_eq!(credential.path, "/watch");
    }

    #[test]
    fn test_page_host_of_bare_id_is_empty() {
        assert_eq!(page_host("dQw4w9WgXcQ"), "");
    }

    #[tokio::test]
    async fn test_unreachable_webdriver_reports_acquisition_error() {
        let settings = AppSettings {
            webdriver_url: "http://127.0.0.1:9".to_string(),
            credential_timeout_secs: 5,
            ..AppSettings::default()
        };
        let acquirer = WebDriverCookieAcquirer::new(&settings);

        let err = acquirer
            .acquire("https://www.youtube.com/watch?v=x")
            .await
            .unwrap_err();
        assert!(matches!(err, BorgorError::CredentialAcquisition(_)));
    }
}
