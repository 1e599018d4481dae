//! Session cookies in the Netscape cookie-file layout
//!
//! ```text
//! # Netscape HTTP Cookie File
//! domain<TAB>include-subdomains<TAB>path<TAB>secure<TAB>expiry<TAB>name<TAB>value
//! ```
//!
//! Flags are written as `TRUE`/`FALSE`, expiry as a decimal integer (0 when the
//! cookie has none). yt-dlp reads the same file through `--cookies`.

use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{info, warn};

const HEADER: &str = "# Netscape HTTP Cookie File";
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// One session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// Unix timestamp; 0 for session cookies
    pub expiry: i64,
    pub name: String,
    pub value: String,
}

impl Credential {
    /// Cookie valid for `/`, with the subdomain flag derived from a leading dot
    pub fn new(domain: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        let domain = domain.into();
        Self {
            include_subdomains: domain.starts_with('.'),
            domain,
            path: "/".to_string(),
            secure: false,
            expiry: 0,
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry > 0 && self.expiry < now.timestamp()
    }

    pub fn to_line(&self) -> String {
        [
            self.domain.as_str(),
            flag(self.include_subdomains),
            self.path.as_str(),
            flag(self.secure),
            &self.expiry.to_string(),
            self.name.as_str(),
            self.value.as_str(),
        ]
        .join("\t")
    }

    fn from_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        let &[domain, subdomains, path, secure, expiry, name, value] = fields.as_slice() else {
            return None;
        };
        Some(Self {
            domain: domain.to_string(),
            include_subdomains: subdomains.eq_ignore_ascii_case("TRUE"),
            path: path.to_string(),
            secure: secure.eq_ignore_ascii_case("TRUE"),
            expiry: parse_expiry(expiry)?,
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Browsers report fractional or negative expiries for session cookies
fn parse_expiry(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0);
    }
    let secs = raw.parse::<f64>().ok()?;
    Some(if secs > 0.0 { secs as i64 } else { 0 })
}

/// Cookies obtained from a browser session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    pub entries: Vec<Credential>,
}

impl CredentialSet {
    pub fn new(entries: Vec<Credential>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_netscape(&self) -> String {
        let mut out = String::with_capacity(64 * (self.entries.len() + 1));
        out.push_str(HEADER);
        out.push('\n');
        for entry in &self.entries {
            let _ = writeln!(out, "{}", entry.to_line());
        }
        out
    }

    /// Parse a cookie file, skipping comments and malformed lines
    pub fn parse_netscape(raw: &str) -> Self {
        let mut entries = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            let line = match line.strip_prefix(HTTP_ONLY_PREFIX) {
                Some(rest) => rest,
                None if line.starts_with('#') || line.trim().is_empty() => continue,
                None => line,
            };
            match Credential::from_line(line) {
                Some(entry) => entries.push(entry),
                None => warn!("Skipping malformed cookie line {}", idx + 1),
            }
        }
        Self { entries }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.to_netscape()).await?;
        info!("Cookies saved to {}", path.display());
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(Self::parse_netscape(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn sample() -> CredentialSet {
        let mut secure = Credential::new(".youtube.com", "SID", "abc=def");
        secure.secure = true;
        secure.expiry = 1_900_000_000;
        CredentialSet::new(vec![
            secure,
            Credential::new("www.youtube.com", "PREF", "f6=40000000"),
        ])
    }

    #[test]
    fn test_layout() {
        let text = sample().to_netscape();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            ".youtube.com\tTRUE\t/\tTRUE\t1900000000\tSID\tabc=def"
        );
        assert_eq!(lines[2], "www.youtube.com\tFALSE\t/\tFALSE\t0\tPREF\tf6=40000000");
    }

    #[test]
    fn test_parse_handles_http_only_and_junk() {
        let raw = "# Netscape HTTP Cookie File\n\
                   \n\
                   #HttpOnly_.youtube.com\tTRUE\t/\tTRUE\t1700000000.75\tLOGIN\tx\n\
                   broken line\n\
                   .google.com\tTRUE\t/\tFALSE\t-1\tNID\ty\r\n";
        let set = CredentialSet::parse_netscape(raw);
        assert_eq!(set.entries.len(), 2);
        assert_eq!(set.entries[0].name, "LOGIN");
        assert_eq!(set.entries[0].expiry, 1_700_000_000);
        assert_eq!(set.entries[1].expiry, 0);
        assert_eq!(set.entries[1].value, "y");
    }

    #[test]
    fn test_expiry() {
        let now = Utc.timestamp_opt(1_800_000_000, 0).unwrap();
        let set = sample();
        assert!(!set.entries[0].is_expired(now));
        assert!(!set.entries[1].is_expired(now));

        let mut old = Credential::new(".youtube.com", "OLD", "1");
        old.expiry = 1_000;
        assert!(old.is_expired(now));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data/cookies.txt");
        sample().save(&path).await.unwrap();
        assert_eq!(CredentialSet::load(&path).await.unwrap(), sample());
    }
}
