use crate::credentials::CredentialAcquirer;
use crate::extractor::cache::{Cache, CredentialMode, ExtractionKey};
use crate::extractor::models::{Metadata, SearchEntry};
use crate::extractor::traits::Extractor;
use crate::utils::error::{BorgorError, ExtractionCause, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Metadata plus the credential mode that produced it
#[derive(Debug, Clone)]
pub struct Resolved {
    pub metadata: Metadata,
    pub mode: CredentialMode,
}

/// The Extraction Orchestrator
///
/// Routes every request through its caches and owns the cookie fallback:
/// anonymous first, then one credentialed retry using the saved cookie file
/// (acquiring it first if it does not exist yet).
pub struct ExtractionOrchestrator {
    extractor: Arc<dyn Extractor>,
    acquirer: Arc<dyn CredentialAcquirer>,
    cookie_file: PathBuf,
    metadata_cache: Cache<ExtractionKey, Metadata>,
    listing_cache: Cache<ExtractionKey, Vec<SearchEntry>>,
}

impl ExtractionOrchestrator {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        acquirer: Arc<dyn CredentialAcquirer>,
        cookie_file: PathBuf,
    ) -> Self {
        Self {
            extractor,
            acquirer,
            cookie_file,
            metadata_cache: Cache::new("extraction"),
            listing_cache: Cache::new("listing"),
        }
    }

    pub fn cookie_file(&self) -> &Path {
        &self.cookie_file
    }

    /// Resolve a video reference into metadata
    pub async fn resolve(&self, reference: &str) -> Result<Resolved> {
        match self.extract(reference, CredentialMode::Anonymous).await {
            Ok(metadata) => {
                return Ok(Resolved {
                    metadata,
                    mode: CredentialMode::Anonymous,
                })
            }
            Err(e) => info!(
                "Anonymous extraction via {} failed: {}. Retrying with cookies...",
                self.extractor.id(),
                e
            ),
        }

        self.ensure_credentials(reference).await?;

        let metadata = self
            .extract(reference, CredentialMode::Credentialed)
            .await
            .map_err(|e| {
                BorgorError::extraction(ExtractionCause::CredentialedRetryFailed(e.to_string()))
            })?;

        Ok(Resolved {
            metadata,
            mode: CredentialMode::Credentialed,
        })
    }

    /// Acquire and persist cookies unless a saved cookie file already exists
    async fn ensure_credentials(&self, reference: &str) -> Result<()> {
        if tokio::fs::try_exists(&self.cookie_file)
            .await
            .unwrap_or(false)
        {
            debug!("Reusing saved cookies at {}", self.cookie_file.display());
            return Ok(());
        }

        let acquisition_failed =
            |e: BorgorError| BorgorError::extraction(ExtractionCause::CredentialAcquisitionFailed(e.to_string()));

        let credentials = self
            .acquirer
            .acquire(reference)
            .await
            .map_err(acquisition_failed)?;
        credentials
            .save(&self.cookie_file)
            .await
            .map_err(acquisition_failed)?;
        Ok(())
    }

    async fn extract(&self, reference: &str, mode: CredentialMode) -> anyhow::Result<Metadata> {
        let cookie_file = match mode {
            CredentialMode::Anonymous => None,
            CredentialMode::Credentialed => Some(self.cookie_file.as_path()),
        };
        let key = ExtractionKey::new(reference, "", mode);
        self.metadata_cache
            .get_or_compute(key, || self.extractor.extract_info(reference, cookie_file))
            .await
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchEntry>> {
        let key = ExtractionKey::new(
            query,
            format!("search/{}", max_results),
            CredentialMode::Anonymous,
        );
        self.listing_cache
            .get_or_compute(key, || self.extractor.search(query, max_results))
            .await
            .map_err(|e| BorgorError::OperationFailed(format!("search failed: {}", e)))
    }

    pub async fn channel_videos(
        &self,
        channel_url: &str,
        max_results: usize,
    ) -> Result<Vec<SearchEntry>> {
        if channel_url.is_empty() {
            return Ok(Vec::new());
        }
        let key = ExtractionKey::new(
            channel_url,
            format!("channel/{}", max_results),
            CredentialMode::Anonymous,
        );
        self.listing_cache
            .get_or_compute(key, || self.extractor.channel_videos(channel_url, max_results))
            .await
            .map_err(|e| BorgorError::OperationFailed(format!("channel listing failed: {}", e)))
    }
}
