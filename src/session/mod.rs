pub mod actor;
pub mod messages;
pub mod state;

pub use actor::SessionActor;
pub use messages::{SessionCommand, SessionEvent};
pub use state::PlaybackSession;
