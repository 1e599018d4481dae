use super::messages::{SessionCommand, SessionEvent};
use super::state::PlaybackSession;
use crate::credentials::{CredentialAcquirer, ProfileCookieAcquirer, WebDriverCookieAcquirer};
use crate::extractor::{
    CredentialMode, ExtractionOrchestrator, Resolved, SearchEntry, YtDlpExtractor,
};
use crate::media::MediaFetcher;
use crate::player::{
    ControllerOptions, IpcChannel, LaunchOutcome, MpvLauncher, PlaybackOffset, PlayerController,
    QualityTier,
};
use crate::utils::config::{AppSettings, CredentialSource};
use crate::utils::error::BorgorError;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Results handed back from worker tasks, tagged with the generation they were
/// dispatched under
enum Completion {
    Resolved {
        generation: u64,
        result: Result<Resolved, BorgorError>,
    },
    Searched {
        generation: u64,
        result: Result<Vec<SearchEntry>, BorgorError>,
    },
    ChannelListed {
        generation: u64,
        result: Result<Vec<SearchEntry>, BorgorError>,
    },
    Avatar {
        generation: u64,
        url: Option<String>,
    },
    Offset {
        generation: u64,
        tier: QualityTier,
        offset: PlaybackOffset,
    },
    Thumbnail {
        url: String,
        result: Result<Vec<u8>, BorgorError>,
    },
}

/// Latest dispatch per kind of work
#[derive(Debug, Default)]
struct Generations {
    resolve: u64,
    search: u64,
    channel: u64,
    playback: u64,
}

fn bump(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// Session coordinator
///
/// The only owner of the `PlaybackSession`. Commands are handled one at a
/// time; anything slow runs on a spawned worker and comes back as a
/// `Completion`.
pub struct SessionActor {
    receiver: mpsc::Receiver<SessionCommand>,
    sender: mpsc::Sender<SessionEvent>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,

    // Components
    orchestrator: Arc<ExtractionOrchestrator>,
    media: Arc<MediaFetcher>,
    session: PlaybackSession,

    max_results: usize,
    discard_stale: bool,
    generations: Generations,
}

impl SessionActor {
    pub fn new(
        settings: &AppSettings,
        orchestrator: Arc<ExtractionOrchestrator>,
        media: Arc<MediaFetcher>,
        player: PlayerController,
        receiver: mpsc::Receiver<SessionCommand>,
        sender: mpsc::Sender<SessionEvent>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            receiver,
            sender,
            completions_tx,
            completions_rx,
            orchestrator,
            media,
            session: PlaybackSession::new(player),
            max_results: settings.max_results,
            discard_stale: settings.discard_stale_results,
            generations: Generations::default(),
        }
    }

    /// Wire up yt-dlp, the cookie fallback, mpv and the HTTP fetcher from settings
    pub fn from_settings(
        settings: &AppSettings,
        embed_window: Option<String>,
        detached: bool,
        receiver: mpsc::Receiver<SessionCommand>,
        sender: mpsc::Sender<SessionEvent>,
    ) -> Result<Self> {
        let extractor = Arc::new(YtDlpExtractor::new(settings)?);
        let acquirer: Arc<dyn CredentialAcquirer> = match settings.credential_source {
            CredentialSource::WebDriver => Arc::new(WebDriverCookieAcquirer::new(settings)),
            CredentialSource::BrowserProfile => Arc::new(ProfileCookieAcquirer::new(settings)?),
        };
        let orchestrator = Arc::new(ExtractionOrchestrator::new(
            extractor,
            acquirer,
            settings.cookie_file.clone(),
        ));
        let media = Arc::new(MediaFetcher::new(
            &settings.user_agent,
            settings.http_timeout(),
        )?);

        let launcher = Arc::new(MpvLauncher::new(
            settings.player_path.clone(),
            settings.kill_stray_players,
        ));
        let channel = Arc::new(IpcChannel::new(settings.control_timeout()));
        let player = PlayerController::new(
            launcher,
            channel,
            ControllerOptions {
                runtime_dir: settings.runtime_dir.clone(),
                log_file: Some(settings.player_log_file.clone()),
                sync_interval: settings.sync_interval(),
                embed_window,
                detached,
            },
        );

        Ok(Self::new(
            settings,
            orchestrator,
            media,
            player,
            receiver,
            sender,
        ))
    }

    pub async fn run(mut self) {
        info!("SessionActor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(SessionCommand::Shutdown) | None => {
                        info!("SessionActor shutting down");
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd).await,
                },
                Some(done) = self.completions_rx.recv() => {
                    self.handle_completion(done).await;
                }
            }
        }

        self.session.stop().await;
    }

    async fn emit(&self, event: SessionEvent) {
        let _ = self.sender.send(event).await;
    }

    fn is_stale(&self, generation: u64, latest: u64, what: &str) -> bool {
        let stale = self.discard_stale && generation != latest;
        if stale {
            debug!(
                "Discarding stale {} result (generation {} < {})",
                what, generation, latest
            );
        }
        stale
    }

    /// Run `work` on a worker task and feed its completion back to the loop
    fn dispatch<F>(&self, work: F)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(work.await);
        });
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Open { reference } => self.handle_open(reference).await,
            SessionCommand::Search { query } => self.handle_search(query).await,
            SessionCommand::OpenChannel => self.handle_open_channel().await,
            SessionCommand::ChangeQuality(tier) => self.handle_change_quality(tier).await,
            SessionCommand::WatchSeparate => self.handle_watch_separate().await,
            SessionCommand::ToggleDetach => self.handle_toggle_detach().await,
            SessionCommand::ToggleFullscreen => match self.session.toggle_fullscreen().await {
                Ok(()) => {
                    self.emit(SessionEvent::Notice("Fullscreen toggled via IPC.".into()))
                        .await
                }
                Err(e) => {
                    self.emit(SessionEvent::Notice(format!("Fullscreen toggle failed: {}", e)))
                        .await
                }
            },
            SessionCommand::FetchThumbnail { url } => {
                let media = self.media.clone();
                self.dispatch(async move {
                    let result = media.fetch_image(&url).await;
                    Completion::Thumbnail { url, result }
                });
            }
            SessionCommand::Stop => {
                bump(&mut self.generations.playback);
                self.session.stop().await;
                self.emit(SessionEvent::Stopped).await;
            }
            SessionCommand::Shutdown => {}
        }
    }

    async fn handle_open(&mut self, reference: String) {
        let generation = bump(&mut self.generations.resolve);
        self.emit(SessionEvent::ExtractionStarted {
            reference: reference.clone(),
        })
        .await;

        let orchestrator = self.orchestrator.clone();
        self.dispatch(async move {
            let result = orchestrator.resolve(&reference).await;
            Completion::Resolved { generation, result }
        });
    }

    async fn handle_search(&mut self, query: String) {
        let query = query.trim().to_string();
        if query.is_empty() {
            self.emit(SessionEvent::Notice("No search query.".into())).await;
            return;
        }

        let generation = bump(&mut self.generations.search);
        let orchestrator = self.orchestrator.clone();
        let max_results = self.max_results;
        self.dispatch(async move {
            let result = orchestrator.search(&query, max_results).await;
            Completion::Searched { generation, result }
        });
    }

    async fn handle_open_channel(&mut self) {
        let Some(metadata) = self.session.metadata() else {
            self.emit(SessionEvent::Error(BorgorError::NoActiveSession.to_string()))
                .await;
            return;
        };

        let channel_url = metadata.uploader_url.clone();
        let generation = bump(&mut self.generations.channel);
        let orchestrator = self.orchestrator.clone();
        let max_results = self.max_results;
        self.dispatch(async move {
            let result = orchestrator.channel_videos(&channel_url, max_results).await;
            Completion::ChannelListed { generation, result }
        });
    }

    async fn handle_change_quality(&mut self, tier: QualityTier) {
        if self.session.metadata().is_none() {
            self.emit(SessionEvent::Error(BorgorError::NoActiveSession.to_string()))
                .await;
            return;
        }
        self.relaunch_from_current_position(tier).await;
    }

    async fn handle_toggle_detach(&mut self) {
        let detached = self.session.flip_detached();
        self.emit(SessionEvent::DetachChanged { detached }).await;

        if self.session.metadata().is_some() && self.session.is_playing() {
            let tier = self.session.tier();
            self.relaunch_from_current_position(tier).await;
        }
    }

    /// Query the position on a worker, then relaunch when it comes back
    async fn relaunch_from_current_position(&mut self, tier: QualityTier) {
        let generation = bump(&mut self.generations.playback);
        match self.session.offset_probe() {
            Some(probe) => self.dispatch(async move {
                let offset = probe.run().await;
                Completion::Offset {
                    generation,
                    tier,
                    offset,
                }
            }),
            None => self.apply_relaunch(tier, 0.0).await,
        }
    }

    async fn apply_relaunch(&mut self, tier: QualityTier, offset: f64) {
        match self.session.relaunch(tier, offset).await {
            Ok(()) => self.emit(SessionEvent::QualityChanged { tier, offset }).await,
            Err(e) => self.emit(SessionEvent::Error(e.to_string())).await,
        }
    }

    async fn handle_watch_separate(&mut self) {
        if self.session.metadata().is_none() {
            self.emit(SessionEvent::Notice(
                "No video info for separate streams.".into(),
            ))
            .await;
            return;
        }

        bump(&mut self.generations.playback);
        match self.session.watch_separate().await {
            Ok(LaunchOutcome::Separate) => self.emit(SessionEvent::SeparateStarted).await,
            Ok(LaunchOutcome::Fallback) => {
                self.emit(SessionEvent::Notice(
                    "No separate streams found; fallback merged.".into(),
                ))
                .await;
                self.emit(SessionEvent::SeparateFallback).await;
            }
            Err(e) => self.emit(SessionEvent::Error(e.to_string())).await,
        }
    }

    async fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::Resolved { generation, result } => {
                if self.is_stale(generation, self.generations.resolve, "extraction") {
                    return;
                }
                match result {
                    Ok(resolved) => self.apply_resolved(resolved).await,
                    Err(e) => {
                        self.emit(SessionEvent::Error(format!("Extraction error: {}", e)))
                            .await
                    }
                }
            }
            Completion::Searched { generation, result } => {
                if self.is_stale(generation, self.generations.search, "search") {
                    return;
                }
                match result {
                    Ok(entries) => {
                        self.emit(SessionEvent::Notice(format!(
                            "Got {} results.",
                            entries.len()
                        )))
                        .await;
                        self.emit(SessionEvent::SearchResults(entries)).await;
                    }
                    Err(e) => self.emit(SessionEvent::Error(format!("Search error: {}", e))).await,
                }
            }
            Completion::ChannelListed { generation, result } => {
                if self.is_stale(generation, self.generations.channel, "channel") {
                    return;
                }
                match result {
                    Ok(entries) => self.emit(SessionEvent::ChannelVideos(entries)).await,
                    Err(e) => self.emit(SessionEvent::Error(e.to_string())).await,
                }
            }
            Completion::Avatar { generation, url } => {
                if !self.is_stale(generation, self.generations.resolve, "avatar") {
                    self.emit(SessionEvent::Avatar { url }).await;
                }
            }
            Completion::Offset {
                generation,
                tier,
                offset,
            } => {
                if self.is_stale(generation, self.generations.playback, "relaunch") {
                    return;
                }
                self.apply_relaunch(tier, offset.seconds()).await;
            }
            Completion::Thumbnail { url, result } => match result {
                Ok(bytes) => self.emit(SessionEvent::Thumbnail { url, bytes }).await,
                Err(e) => debug!("Thumbnail {} failed: {}", url, e),
            },
        }
    }

    async fn apply_resolved(&mut self, resolved: Resolved) {
        let Resolved { metadata, mode } = resolved;
        bump(&mut self.generations.playback);

        let notice = match mode {
            CredentialMode::Anonymous => "Extraction succeeded without cookies.",
            CredentialMode::Credentialed => "Extraction succeeded with cookies fallback.",
        };
        self.emit(SessionEvent::Notice(notice.into())).await;

        let title = metadata.title.clone();
        let uploader = metadata.uploader.clone();
        let uploader_url = metadata.uploader_url.clone();
        let description = metadata.description.clone();

        let launch = self.session.load(metadata).await;
        self.emit(SessionEvent::Loaded {
            title,
            uploader,
            uploader_url: uploader_url.clone(),
            description,
            tiers: self.session.tiers().to_vec(),
            tier: self.session.tier(),
            mode,
        })
        .await;
        if let Err(e) = launch {
            self.emit(SessionEvent::Error(e.to_string())).await;
        }

        let generation = self.generations.resolve;
        let media = self.media.clone();
        self.dispatch(async move {
            let url = media.scrape_channel_avatar(&uploader_url).await;
            Completion::Avatar { generation, url }
        });
    }
}
