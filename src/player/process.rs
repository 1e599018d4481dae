//! External player processes
//!
//! Builds the player command line and owns the spawned child handles.

use crate::utils::error::{BorgorError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command as AsyncCommand};
use tracing::{debug, info, warn};

/// Which media a process renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    Merged,
    VideoOnly,
    AudioOnly,
}

impl StreamRole {
    pub fn socket_suffix(self) -> &'static str {
        match self {
            StreamRole::Merged => "main",
            StreamRole::VideoOnly => "video",
            StreamRole::AudioOnly => "audio",
        }
    }
}

/// Everything the player is told at launch
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInvocation {
    pub role: StreamRole,
    pub url: String,
    /// yt-dlp format filter; separate streams play direct URLs without one
    pub format_filter: Option<String>,
    pub control_path: PathBuf,
    pub log_file: Option<PathBuf>,
    /// Only emitted when positive
    pub start_offset: f64,
    /// Native window handle to render into
    pub embed_target: Option<String>,
}

impl PlayerInvocation {
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(12);

        if let Some(wid) = &self.embed_target {
            args.push(format!("--wid={}", wid));
        }
        if self.start_offset > 0.0 {
            args.push(format!("--start={}", self.start_offset));
        }
        match self.role {
            StreamRole::Merged => {}
            StreamRole::VideoOnly => args.push("--no-audio".to_string()),
            StreamRole::AudioOnly => args.push("--no-video".to_string()),
        }

        args.push("--osc".to_string());
        args.push("--cache=yes".to_string());
        args.push("--demuxer-thread=yes".to_string());
        if let Some(filter) = &self.format_filter {
            args.push(format!("--ytdl-format={}", filter));
        }
        if let Some(log) = &self.log_file {
            args.push(format!("--log-file={}", log.display()));
            args.push("--msg-level=all=v".to_string());
        }
        args.push(format!("--input-ipc-server={}", self.control_path.display()));
        args.push(self.url.clone());
        args
    }
}

/// A running (or test-double) player process and its control channel
#[derive(Debug)]
pub struct PlayerProcess {
    pub role: StreamRole,
    pub control_path: PathBuf,
    child: Option<Child>,
}

impl PlayerProcess {
    pub fn new(role: StreamRole, control_path: PathBuf, child: Option<Child>) -> Self {
        Self {
            role,
            control_path,
            child,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.id())
    }

    /// Whether the child has already exited. Handles without a child never run.
    pub fn has_exited(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => !matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Kill this process only and remove its control socket
    pub async fn terminate(mut self) {
        if let Some(mut child) = self.child.take() {
            let pid = child.id();
            if let Err(e) = child.start_kill() {
                debug!("Player {:?} already gone: {}", pid, e);
            }
            match tokio::time::timeout(Duration::from_secs(2), child.wait()).await {
                Ok(Ok(status)) => debug!("Player {:?} exited: {}", pid, status),
                Ok(Err(e)) => warn!("Failed to reap player {:?}: {}", pid, e),
                Err(_) => warn!("Player {:?} did not exit after kill", pid),
            }
        }
        remove_socket(&self.control_path).await;
    }
}

async fn remove_socket(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!("Could not remove control socket {}: {}", path.display(), e);
        }
    }
}

/// Starts player processes
#[async_trait]
pub trait PlayerLauncher: Send + Sync {
    fn spawn(&self, invocation: &PlayerInvocation) -> Result<PlayerProcess>;

    /// Kill every process named like the player, owned by this session or not
    async fn kill_strays(&self) {}
}

/// Launches mpv
pub struct MpvLauncher {
    executable: PathBuf,
    kill_strays: bool,
}

impl MpvLauncher {
    pub fn new(executable: PathBuf, kill_strays: bool) -> Self {
        Self {
            executable,
            kill_strays,
        }
    }

    fn process_name(&self) -> String {
        self.executable
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mpv".to_string())
    }
}

#[async_trait]
impl PlayerLauncher for MpvLauncher {
    fn spawn(&self, invocation: &PlayerInvocation) -> Result<PlayerProcess> {
        if let Some(parent) = invocation.control_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let args = invocation.args();
        debug!("Spawning {} {:?}", self.executable.display(), args);

        let child = AsyncCommand::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                BorgorError::PlaybackLaunch(format!("{}: {}", self.executable.display(), e))
            })?;

        info!(
            "Started {:?} player pid={:?}",
            invocation.role,
            child.id()
        );
        Ok(PlayerProcess::new(
            invocation.role,
            invocation.control_path.clone(),
            Some(child),
        ))
    }

    async fn kill_strays(&self) {
        if !self.kill_strays {
            return;
        }

        let name = self.process_name();
        let mut command = if cfg!(windows) {
            let mut c = AsyncCommand::new("taskkill");
            c.arg("/F")
                .arg("/IM")
                .arg(format!("{}.exe", name.trim_end_matches(".exe")));
            c
        } else {
            let mut c = AsyncCommand::new("pkill");
            c.arg("-x").arg(&name);
            c
        };

        match command.stdout(Stdio::null()).stderr(Stdio::null()).status().await {
            Ok(status) => debug!("Killed stray {} processes ({})", name, status),
            Err(e) => warn!("Failed to kill stray {} processes: {}", name, e),
        }
    }
}
