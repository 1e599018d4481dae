//! BorgorTube playback session library

pub mod app;
pub mod credentials;
pub mod extractor;
pub mod media;
pub mod player;
pub mod session;
pub mod utils;

// Re-export main types for easier use
pub use extractor::{ExtractionOrchestrator, Extractor, Metadata, Variant, YtDlpExtractor};
pub use player::{available_tiers, PlayerController, QualityTier};
pub use session::{PlaybackSession, SessionActor, SessionCommand, SessionEvent};
pub use utils::{AppSettings, BorgorError};
