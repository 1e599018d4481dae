//! Player Controller
//!
//! Owns zero, one or two player processes and their control channels:
//!
//! ```text
//! Idle -> Merged (one process) -> Separate (video + audio processes)
//!   ^_______________________________________|  stop()
//! ```
//!
//! Every launch tears down the processes this controller owns before starting
//! new ones, so process handles follow last-writer-wins.

use crate::extractor::models::Metadata;
use crate::player::ipc::{ControlChannel, PlaybackOffset};
use crate::player::process::{PlayerInvocation, PlayerLauncher, PlayerProcess, StreamRole};
use crate::player::quality::QualityTier;
use crate::utils::error::{BorgorError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of asking for separate playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    Separate,
    /// No video-only or no audio-only variant; merged playback was started instead
    Fallback,
}

/// Merged vs. separate audio/video playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Merged,
    Separate,
}

/// One reading of both separate-stream positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncSample {
    pub video: PlaybackOffset,
    pub audio: PlaybackOffset,
}

impl SyncSample {
    /// Video minus audio position, when both are known
    pub fn drift(&self) -> Option<f64> {
        match (self.video, self.audio) {
            (PlaybackOffset::Known(v), PlaybackOffset::Known(a)) => Some(v - a),
            _ => None,
        }
    }
}

/// Receives every sync sample. No corrective action is taken on drift.
pub type DriftHook = Arc<dyn Fn(SyncSample) + Send + Sync>;

/// Position query bound to one control channel, runnable off the coordinator
pub struct OffsetProbe {
    channel: Arc<dyn ControlChannel>,
    path: PathBuf,
}

impl OffsetProbe {
    pub async fn run(self) -> PlaybackOffset {
        self.channel.probe_offset(&self.path).await
    }
}

struct SyncTask(JoinHandle<()>);

impl Drop for SyncTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

enum PlayerState {
    Idle,
    Merged(PlayerProcess),
    Separate {
        video: PlayerProcess,
        audio: PlayerProcess,
        _sync: SyncTask,
    },
}

pub struct ControllerOptions {
    pub runtime_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub sync_interval: Duration,
    /// Native window handle used while attached
    pub embed_window: Option<String>,
    pub detached: bool,
}

pub struct PlayerController {
    launcher: Arc<dyn PlayerLauncher>,
    channel: Arc<dyn ControlChannel>,
    /// Short session tag; socket paths must fit in `sun_path`
    session_tag: String,
    options: ControllerOptions,
    drift_hook: DriftHook,
    state: PlayerState,
}

impl PlayerController {
    pub fn new(
        launcher: Arc<dyn PlayerLauncher>,
        channel: Arc<dyn ControlChannel>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            launcher,
            channel,
            session_tag: Uuid::new_v4().simple().to_string()[..8].to_string(),
            options,
            drift_hook: Arc::new(|sample: SyncSample| match sample.drift() {
                Some(drift) => debug!("Sync check: drift {:+.3}s", drift),
                None => debug!("Sync check: position unknown"),
            }),
            state: PlayerState::Idle,
        }
    }

    pub fn with_drift_hook(mut self, hook: DriftHook) -> Self {
        self.drift_hook = hook;
        self
    }

    /// Session-scoped control socket for a stream role
    pub fn control_path(&self, role: StreamRole) -> PathBuf {
        self.options
            .runtime_dir
            .join(format!("{}-{}.sock", self.session_tag, role.socket_suffix()))
    }

    pub fn mode(&self) -> Option<PlaybackMode> {
        match self.state {
            PlayerState::Idle => None,
            PlayerState::Merged(_) => Some(PlaybackMode::Merged),
            PlayerState::Separate { .. } => Some(PlaybackMode::Separate),
        }
    }

    pub fn is_active(&self) -> bool {
        self.mode().is_some()
    }

    pub fn is_detached(&self) -> bool {
        self.options.detached
    }

    pub fn set_detached(&mut self, detached: bool) {
        self.options.detached = detached;
    }

    pub fn set_embed_window(&mut self, handle: Option<String>) {
        self.options.embed_window = handle;
    }

    fn embed_target(&self) -> Option<String> {
        if self.options.detached {
            None
        } else {
            self.options.embed_window.clone()
        }
    }

    /// Control path of the process whose position stands for the session
    pub fn primary_control_path(&self) -> Option<&Path> {
        match &self.state {
            PlayerState::Idle => None,
            PlayerState::Merged(process) => Some(&process.control_path),
            PlayerState::Separate { video, .. } => Some(&video.control_path),
        }
    }

    /// Owned position query for the primary process; `None` while idle
    pub fn offset_probe(&self) -> Option<OffsetProbe> {
        self.primary_control_path().map(|path| OffsetProbe {
            channel: self.channel.clone(),
            path: path.to_path_buf(),
        })
    }

    /// Current position in seconds; 0.0 when idle or the channel fails
    pub async fn query_offset(&self) -> f64 {
        match self.offset_probe() {
            Some(probe) => probe.run().await.seconds(),
            None => 0.0,
        }
    }

    fn log_file_for(&self, role: StreamRole) -> Option<PathBuf> {
        let log = self.options.log_file.as_ref()?;
        if role == StreamRole::Merged {
            return Some(log.clone());
        }
        let stem = log.file_stem()?.to_string_lossy();
        Some(log.with_file_name(format!("{}-{}.txt", stem, role.socket_suffix())))
    }

    fn invocation(
        &self,
        role: StreamRole,
        url: &str,
        format_filter: Option<String>,
        start_offset: f64,
    ) -> PlayerInvocation {
        PlayerInvocation {
            role,
            url: url.to_string(),
            format_filter,
            control_path: self.control_path(role),
            log_file: self.log_file_for(role),
            start_offset,
            // audio has nothing to draw
            embed_target: match role {
                StreamRole::AudioOnly => None,
                _ => self.embed_target(),
            },
        }
    }

    /// Terminate the processes this controller owns and return to idle
    pub async fn stop(&mut self) {
        match std::mem::replace(&mut self.state, PlayerState::Idle) {
            PlayerState::Idle => {}
            PlayerState::Merged(process) => process.terminate().await,
            PlayerState::Separate {
                video,
                audio,
                _sync,
            } => {
                drop(_sync);
                video.terminate().await;
                audio.terminate().await;
            }
        }
    }

    async fn prepare_launch(&mut self) {
        self.stop().await;
        self.launcher.kill_strays().await;
    }

    /// Start one process playing `metadata.url` at `tier`, replacing whatever ran before
    pub async fn launch_merged(
        &mut self,
        metadata: &Metadata,
        tier: QualityTier,
        start_offset: f64,
    ) -> Result<()> {
        self.prepare_launch().await;

        let invocation = self.invocation(
            StreamRole::Merged,
            &metadata.url,
            Some(tier.format_filter()),
            start_offset,
        );
        info!("Launching player with '{}' at {:.1}s", tier, start_offset);

        let process = self.launcher.spawn(&invocation)?;
        self.state = PlayerState::Merged(process);
        Ok(())
    }

    /// Relaunch at `tier` from the current position. Returns the offset used.
    pub async fn change_quality(&mut self, metadata: &Metadata, tier: QualityTier) -> Result<f64> {
        let offset = self.query_offset().await;
        info!("Switching quality to {} at {:.1}s", tier, offset);
        self.launch_merged(metadata, tier, offset).await?;
        Ok(offset)
    }

    /// Play the first video-only and audio-only variants in two processes,
    /// or fall back to merged playback at `fallback_tier`.
    pub async fn launch_separate(
        &mut self,
        metadata: &Metadata,
        fallback_tier: QualityTier,
    ) -> Result<LaunchOutcome> {
        let Some((video, audio)) = metadata.separate_streams() else {
            warn!("No separate streams found; falling back to merged playback");
            self.launch_merged(metadata, fallback_tier, 0.0).await?;
            return Ok(LaunchOutcome::Fallback);
        };

        self.prepare_launch().await;
        info!("Launching separate players for video and audio");

        let video_invocation = self.invocation(StreamRole::VideoOnly, &video.url, None, 0.0);
        let audio_invocation = self.invocation(StreamRole::AudioOnly, &audio.url, None, 0.0);

        let video_process = self.launcher.spawn(&video_invocation)?;
        let audio_process = match self.launcher.spawn(&audio_invocation) {
            Ok(process) => process,
            Err(e) => {
                video_process.terminate().await;
                return Err(e);
            }
        };

        let sync = self.spawn_sync_check(
            video_process.control_path.clone(),
            audio_process.control_path.clone(),
        );
        self.state = PlayerState::Separate {
            video: video_process,
            audio: audio_process,
            _sync: sync,
        };
        Ok(LaunchOutcome::Separate)
    }

    fn spawn_sync_check(&self, video: PathBuf, audio: PathBuf) -> SyncTask {
        let channel = self.channel.clone();
        let hook = self.drift_hook.clone();
        let period = self.options.sync_interval;

        SyncTask(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let (video_offset, audio_offset) =
                    tokio::join!(channel.probe_offset(&video), channel.probe_offset(&audio));
                hook(SyncSample {
                    video: video_offset,
                    audio: audio_offset,
                });
            }
        }))
    }

    /// Flip embedded/standalone; an active session is relaunched at `tier`
    /// from its current position. Returns the new detach flag.
    pub async fn toggle_detach(
        &mut self,
        metadata: Option<&Metadata>,
        tier: QualityTier,
    ) -> Result<bool> {
        self.options.detached = !self.options.detached;
        info!(
            "Now in {} mode",
            if self.options.detached { "detached" } else { "embedded" }
        );

        if let (Some(metadata), true) = (metadata, self.is_active()) {
            self.change_quality(metadata, tier).await?;
        }
        Ok(self.options.detached)
    }

    pub async fn toggle_fullscreen(&self) -> Result<()> {
        let path = self
            .primary_control_path()
            .ok_or(BorgorError::NoActiveSession)?;
        self.channel.send_command(path, "cycle fullscreen").await
    }
}
