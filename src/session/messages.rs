use crate::extractor::{CredentialMode, SearchEntry};
use crate::player::QualityTier;

/// Commands sent from the front end to the session coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Open { reference: String },
    Search { query: String },
    /// List the uploads of the current video's channel
    OpenChannel,
    ChangeQuality(QualityTier),
    WatchSeparate,
    ToggleDetach,
    ToggleFullscreen,
    FetchThumbnail { url: String },
    Stop,
    // System
    Shutdown,
}

/// Events sent from the session coordinator to the front end
#[derive(Debug, Clone)]
pub enum SessionEvent {
    // Extraction
    ExtractionStarted {
        reference: String,
    },
    Loaded {
        title: String,
        uploader: String,
        uploader_url: String,
        description: String,
        tiers: Vec<QualityTier>,
        tier: QualityTier,
        mode: CredentialMode,
    },
    Avatar {
        url: Option<String>,
    },

    // Listings
    SearchResults(Vec<SearchEntry>),
    ChannelVideos(Vec<SearchEntry>),
    Thumbnail {
        url: String,
        bytes: Vec<u8>,
    },

    // Playback
    QualityChanged {
        tier: QualityTier,
        offset: f64,
    },
    DetachChanged {
        detached: bool,
    },
    SeparateStarted,
    SeparateFallback,
    Stopped,

    // Console
    Notice(String),
    Error(String),
}
