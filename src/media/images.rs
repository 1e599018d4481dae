//! Thumbnail and channel-avatar fetching

use crate::extractor::cache::Cache;
use crate::utils::error::{BorgorError, Result};
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP fetcher for images, with a per-instance byte cache keyed by URL
pub struct MediaFetcher {
    client: Client,
    images: Cache<String, Vec<u8>>,
}

impl MediaFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            images: Cache::new("image"),
        })
    }

    /// Image bytes for `url`, fetched once per fetcher
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        self.images
            .get_or_compute(url.to_string(), || async {
                let response = self.client.get(url).send().await?.error_for_status()?;
                Ok::<_, BorgorError>(response.bytes().await?.to_vec())
            })
            .await
    }

    /// The channel page's `og:image`, or `None` on any failure
    pub async fn scrape_channel_avatar(&self, channel_url: &str) -> Option<String> {
        if channel_url.is_empty() {
            return None;
        }

        let page = async {
            let response = self
                .client
                .get(channel_url)
                .send()
                .await?
                .error_for_status()?;
            response.text().await
        };

        match page.await {
            Ok(html) => {
                let avatar = find_og_image(&html);
                debug!("Avatar for {}: {:?}", channel_url, avatar);
                avatar
            }
            Err(e) => {
                warn!("Failed to scrape channel avatar from {}: {}", channel_url, e);
                None
            }
        }
    }
}

fn meta_tag() -> &'static Regex {
    static META: OnceLock<Regex> = OnceLock::new();
    META.get_or_init(|| Regex::new(r"(?is)<meta\s[^>]*>").expect("valid meta regex"))
}

/// `name="value"` or `name='value'`
fn attribute_pair() -> &'static Regex {
    static ATTR: OnceLock<Regex> = OnceLock::new();
    ATTR.get_or_init(|| {
        Regex::new(r#"(?i)\b([a-z_:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("valid attribute regex")
    })
}

/// `content` of a meta tag whose `property` is exactly `og:image`
fn og_image_content(tag: &str) -> Option<String> {
    let mut is_og_image = false;
    let mut content = None;
    for caps in attribute_pair().captures_iter(tag) {
        let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        match caps[1].to_ascii_lowercase().as_str() {
            "property" => is_og_image = value == "og:image",
            "content" => content = Some(value.to_string()),
            _ => {}
        }
    }
    content.filter(|_| is_og_image)
}

/// Content of the first `<meta property="og:image">` tag
pub fn find_og_image(html: &str) -> Option<String> {
    meta_tag()
        .find_iter(html)
        .find_map(|m| og_image_content(m.as_str()))
        .filter(|content| !content.is_empty())
}
