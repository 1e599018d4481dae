//! Data structures for video information

use serde::{Deserialize, Serialize};

/// Video information as dumped by yt-dlp (`--dump-single-json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    pub original_url: Option<String>,
    pub webpage_url: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub uploader_url: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub formats: Vec<Format>,
}

/// Video format information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Format {
    #[serde(default)]
    pub format_id: String,
    pub url: Option<String>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
}

/// Flat listing (search results, channel uploads)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlatListing {
    #[serde(default)]
    pub entries: Vec<FlatEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlatEntry {
    pub url: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// One encoded rendition of a video
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Pixels; 0 when unknown
    pub height: u32,
    /// Frames per second; 0 when unknown
    pub fps: u32,
    pub has_audio: bool,
    pub has_video: bool,
    pub url: String,
}

impl Variant {
    pub fn is_video_only(&self) -> bool {
        self.has_video && !self.has_audio
    }

    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }
}

impl From<&Format> for Variant {
    fn from(format: &Format) -> Self {
        // yt-dlp writes "none" for a missing stream; an absent field means unknown
        let codec_present = |codec: &Option<String>| codec.as_deref() != Some("none");
        Self {
            height: format.height.unwrap_or(0),
            fps: format.fps.map(|f| f.max(0.0) as u32).unwrap_or(0),
            has_audio: codec_present(&format.acodec),
            has_video: codec_present(&format.vcodec),
            url: format.url.clone().unwrap_or_default(),
        }
    }
}

/// Extraction result for one video
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Canonical playable URL handed to the player
    pub url: String,
    pub uploader: String,
    /// Channel URL; empty when the backend did not report one
    pub uploader_url: String,
    pub title: String,
    pub description: String,
    pub variants: Vec<Variant>,
}

impl Metadata {
    /// Build metadata from a yt-dlp dump, using `reference` when no canonical
    /// URL was reported.
    pub fn from_info(info: &VideoInfo, reference: &str) -> Self {
        let url = info
            .original_url
            .clone()
            .or_else(|| info.webpage_url.clone())
            .unwrap_or_else(|| reference.to_string());

        Self {
            url,
            uploader: info
                .uploader
                .clone()
                .unwrap_or_else(|| "Unknown Channel".to_string()),
            uploader_url: info.uploader_url.clone().unwrap_or_default(),
            title: info.title.clone().unwrap_or_else(|| "Untitled".to_string()),
            description: info
                .description
                .clone()
                .unwrap_or_else(|| "No description available.".to_string()),
            variants: info.formats.iter().map(Variant::from).collect(),
        }
    }

    /// First video-only and first audio-only variants, if both exist
    pub fn separate_streams(&self) -> Option<(&Variant, &Variant)> {
        let video = self.variants.iter().find(|v| v.is_video_only())?;
        let audio = self.variants.iter().find(|v| v.is_audio_only())?;
        Some((video, audio))
    }
}

/// One search hit or channel upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEntry {
    pub title: String,
    pub video_id: String,
    pub thumbnail: String,
}

impl FlatListing {
    /// First `max` entries that carry a URL
    pub fn into_entries(self, max: usize) -> Vec<SearchEntry> {
        self.entries
            .into_iter()
            .filter_map(|entry| {
                let video_id = entry.url?;
                Some(SearchEntry {
                    title: entry.title.unwrap_or_else(|| "Unknown".to_string()),
                    video_id,
                    thumbnail: entry
                        .thumbnails
                        .last()
                        .map(|t| t.url.clone())
                        .unwrap_or_default(),
                })
            })
            .take(max)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(id: &str, vcodec: Option<&str>, acodec: Option<&str>) -> Format {
        Format {
            format_id: id.to_string(),
            url: Some(format!("https://cdn.example/{}", id)),
            height: Some(720),
            fps: Some(30.0),
            vcodec: vcodec.map(str::to_string),
            acodec: acodec.map(str::to_string),
        }
    }

    #[test]
    fn test_metadata_prefers_original_url() {
        let info: VideoInfo = serde_json::from_str(
            r#"{
                "original_url": "https://youtu.be/abc",
                "webpage_url": "https://www.youtube.com/watch?v=abc",
                "title": "Clip",
                "formats": [{"format_id": "18", "url": "u", "height": null, "fps": 29.97}]
            }"#,
        )
        .unwrap();

        let meta = Metadata::from_info(&info, "abc");
        assert_eq!(meta.url, "https://youtu.be/abc");
        assert_eq!(meta.title, "Clip");
        assert_eq!(meta.uploader, "Unknown Channel");
        assert_eq!(meta.uploader_url, "");
        assert_eq!(meta.variants[0].height, 0);
        assert_eq!(meta.variants[0].fps, 29);
    }

    #[test]
    fn test_metadata_falls_back_to_reference() {
        let meta = Metadata::from_info(&VideoInfo::default(), "https://youtu.be/zzz");
        assert_eq!(meta.url, "https://youtu.be/zzz");
        assert_eq!(meta.description, "No description available.");
        assert!(meta.variants.is_empty());
    }

    #[test]
    fn test_codec_flags() {
        let video_only = Variant::from(&format("137", Some("avc1"), Some("none")));
        let audio_only = Variant::from(&format("140", Some("none"), Some("mp4a")));
        let unknown = Variant::from(&format("x", None, None));

        assert!(video_only.is_video_only());
        assert!(audio_only.is_audio_only());
        assert!(!unknown.is_video_only() && !unknown.is_audio_only());
    }

    #[test]
    fn test_separate_streams_pick_first_of_each() {
        let info = VideoInfo {
            formats: vec![
                format("18", Some("avc1"), Some("mp4a")),
                format("137", Some("avc1"), Some("none")),
                format("140", Some("none"), Some("mp4a")),
                format("248", Some("vp9"), Some("none")),
            ],
            ..Default::default()
        };
        let meta = Metadata::from_info(&info, "r");
        let (video, audio) = meta.separate_streams().unwrap();
        assert_eq!(video.url, "https://cdn.example/137");
        assert_eq!(audio.url, "https://cdn.example/140");
    }

    #[test]
    fn test_flat_listing_skips_entries_without_url() {
        let listing: FlatListing = serde_json::from_str(
            r#"{"entries": [
                {"title": "no url"},
                {"url": "a", "title": "A", "thumbnails": [{"url": "s"}, {"url": "l"}]},
                {"url": "b"},
                {"url": "c", "title": "C"}
            ]}"#,
        )
        .unwrap();

        let entries = listing.into_entries(2);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].thumbnail, "l");
        assert_eq!(entries[1].title, "Unknown");
        assert_eq!(entries[1].thumbnail, "");
    }
}
