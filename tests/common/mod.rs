//! Test doubles shared by the integration tests. Nothing here touches the
//! network or spawns real processes.

#![allow(dead_code)]

use async_trait::async_trait;
use borgortube::credentials::{Credential, CredentialAcquirer, CredentialSet};
use borgortube::extractor::{Extractor, Metadata, SearchEntry, Variant};
use borgortube::player::{
    ControlChannel, PlaybackOffset, PlayerInvocation, PlayerLauncher, PlayerProcess,
};
use borgortube::utils::error::{BorgorError, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn variant(height: u32, fps: u32, has_video: bool, has_audio: bool, url: &str) -> Variant {
    Variant {
        height,
        fps,
        has_audio,
        has_video,
        url: url.to_string(),
    }
}

pub fn sample_metadata(variants: Vec<Variant>) -> Metadata {
    Metadata {
        url: "https://www.youtube.com/watch?v=abc123".to_string(),
        uploader: "Some Channel".to_string(),
        uploader_url: String::new(),
        title: "Sample Video".to_string(),
        description: "A description.".to_string(),
        variants,
    }
}

/// 1080p30 merged, plus one video-only and one audio-only stream
pub fn full_metadata() -> Metadata {
    sample_metadata(vec![
        variant(1080, 30, true, true, "https://cdn.example/merged"),
        variant(720, 30, true, false, "https://cdn.example/video-only"),
        variant(0, 0, false, true, "https://cdn.example/audio-only"),
    ])
}

/// Extractor that refuses anonymous requests when `require_cookies` is set
pub struct ScriptedExtractor {
    pub require_cookies: bool,
    pub metadata: Metadata,
    pub calls: AtomicUsize,
    pub cookie_files: Mutex<Vec<Option<PathBuf>>>,
    pub search_delay: Duration,
}

impl ScriptedExtractor {
    pub fn new(metadata: Metadata, require_cookies: bool) -> Self {
        Self {
            require_cookies,
            metadata,
            calls: AtomicUsize::new(0),
            cookie_files: Mutex::new(Vec::new()),
            search_delay: Duration::ZERO,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    fn id(&self) -> &'static str {
        "scripted"
    }

    async fn extract_info(
        &self,
        _reference: &str,
        cookie_file: Option<&Path>,
    ) -> anyhow::Result<Metadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.cookie_files
            .lock()
            .unwrap()
            .push(cookie_file.map(Path::to_path_buf));

        if !self.require_cookies {
            return Ok(self.metadata.clone());
        }
        // read the cookie file the way the backend would
        let Some(path) = cookie_file else {
            anyhow::bail!("Sign in to confirm you're not a bot");
        };
        let cookies = CredentialSet::load(path).await?;
        if !cookies
            .entries
            .iter()
            .any(|c| c.domain.ends_with("youtube.com") && c.name == "SID")
        {
            anyhow::bail!("cookie file has no session cookie");
        }
        Ok(self.metadata.clone())
    }

    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<SearchEntry>> {
        // "slow" queries finish after fast ones
        if query.starts_with("slow") {
            tokio::time::sleep(self.search_delay).await;
        }
        Ok((0..max_results.min(3))
            .map(|i| SearchEntry {
                title: format!("{} #{}", query, i),
                video_id: format!("{}-{}", query, i),
                thumbnail: String::new(),
            })
            .collect())
    }
}

/// Acquirer that counts calls and either succeeds with one cookie or fails
pub struct CountingAcquirer {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingAcquirer {
    pub fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialAcquirer for CountingAcquirer {
    async fn acquire(&self, _reference: &str) -> Result<CredentialSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BorgorError::CredentialAcquisition(
                "browser profile locked".to_string(),
            ));
        }
        Ok(CredentialSet::new(vec![Credential::new(
            ".youtube.com",
            "SID",
            "secret",
        )]))
    }
}

/// Launcher that records invocations and hands back childless processes
#[derive(Default)]
pub struct RecordingLauncher {
    pub invocations: Mutex<Vec<PlayerInvocation>>,
    pub fail: bool,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        Self {
            invocations: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn invocations(&self) -> Vec<PlayerInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<PlayerInvocation> {
        self.invocations.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PlayerLauncher for RecordingLauncher {
    fn spawn(&self, invocation: &PlayerInvocation) -> Result<PlayerProcess> {
        self.invocations.lock().unwrap().push(invocation.clone());
        if self.fail {
            return Err(BorgorError::PlaybackLaunch("mpv: not found".to_string()));
        }
        Ok(PlayerProcess::new(
            invocation.role,
            invocation.control_path.clone(),
            None,
        ))
    }
}

/// Every player reports the same position
pub struct FixedChannel {
    pub offset: PlaybackOffset,
    pub commands: Mutex<Vec<(PathBuf, String)>>,
}

impl FixedChannel {
    pub fn at(seconds: f64) -> Self {
        Self {
            offset: PlaybackOffset::Known(seconds),
            commands: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ControlChannel for FixedChannel {
    async fn probe_offset(&self, _path: &Path) -> PlaybackOffset {
        self.offset
    }

    async fn send_command(&self, path: &Path, command: &str) -> Result<()> {
        self.commands
            .lock()
            .unwrap()
            .push((path.to_path_buf(), command.to_string()));
        Ok(())
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
