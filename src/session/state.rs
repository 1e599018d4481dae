//! The playback session aggregate
//!
//! One per application instance. Created empty, populated by `load`, and then
//! mutated in place by quality, mode and detach changes. Only the coordinator
//! touches it.

use crate::extractor::models::Metadata;
use crate::player::controller::{LaunchOutcome, OffsetProbe, PlaybackMode, PlayerController};
use crate::player::quality::{available_tiers, QualityTier};
use crate::utils::error::{BorgorError, Result};

pub struct PlaybackSession {
    metadata: Option<Metadata>,
    tiers: Vec<QualityTier>,
    tier: QualityTier,
    player: PlayerController,
}

impl PlaybackSession {
    pub fn new(player: PlayerController) -> Self {
        Self {
            metadata: None,
            tiers: vec![QualityTier::FALLBACK],
            tier: QualityTier::FALLBACK,
            player,
        }
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn tiers(&self) -> &[QualityTier] {
        &self.tiers
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn mode(&self) -> Option<PlaybackMode> {
        self.player.mode()
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_active()
    }

    pub fn is_detached(&self) -> bool {
        self.player.is_detached()
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    fn loaded(&self) -> Result<&Metadata> {
        self.metadata.as_ref().ok_or(BorgorError::NoActiveSession)
    }

    /// Replace the current video and start it at its best tier.
    ///
    /// The metadata stays applied even if the player fails to start.
    pub async fn load(&mut self, metadata: Metadata) -> Result<QualityTier> {
        self.tiers = available_tiers(&metadata.variants);
        let best = self.tiers[0];
        self.tier = best;
        self.metadata = Some(metadata);
        self.relaunch(best, 0.0).await?;
        Ok(best)
    }

    /// Merged playback at `tier` from `offset`; the tier is recorded on success
    pub async fn relaunch(&mut self, tier: QualityTier, offset: f64) -> Result<()> {
        let metadata = self.loaded()?.clone();
        self.player.launch_merged(&metadata, tier, offset).await?;
        self.tier = tier;
        Ok(())
    }

    /// Switch tier, preserving the position queried from the running player
    pub async fn change_quality(&mut self, tier: QualityTier) -> Result<f64> {
        let metadata = self.loaded()?.clone();
        let offset = self.player.change_quality(&metadata, tier).await?;
        self.tier = tier;
        Ok(offset)
    }

    pub async fn watch_separate(&mut self) -> Result<LaunchOutcome> {
        let metadata = self.loaded()?.clone();
        self.player.launch_separate(&metadata, self.tier).await
    }

    /// Flip the detach flag without relaunching. Returns the new flag.
    pub fn flip_detached(&mut self) -> bool {
        let detached = !self.player.is_detached();
        self.player.set_detached(detached);
        detached
    }

    pub fn offset_probe(&self) -> Option<OffsetProbe> {
        self.player.offset_probe()
    }

    pub async fn toggle_fullscreen(&self) -> Result<()> {
        self.player.toggle_fullscreen().await
    }

    pub async fn stop(&mut self) {
        self.player.stop().await;
    }
}
