//! External player supervision

pub mod controller;
pub mod ipc;
pub mod process;
pub mod quality;

pub use controller::{
    ControllerOptions, DriftHook, LaunchOutcome, OffsetProbe, PlaybackMode, PlayerController,
    SyncSample,
};
pub use ipc::{query_offset, ControlChannel, IpcChannel, PlaybackOffset};
pub use process::{MpvLauncher, PlayerInvocation, PlayerLauncher, PlayerProcess, StreamRole};
pub use quality::{available_tiers, format_filter_for, QualityTier};
