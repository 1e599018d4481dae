pub mod cache;
pub mod models;
pub mod orchestrator;
pub mod traits;
pub mod ytdlp;

pub use cache::{Cache, CredentialMode, ExtractionKey};
pub use models::{Metadata, SearchEntry, Variant, VideoInfo};
pub use orchestrator::{ExtractionOrchestrator, Resolved};
pub use traits::Extractor;
pub use ytdlp::YtDlpExtractor;
