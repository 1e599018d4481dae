//! Cookie fallback and caching through the extraction orchestrator.

mod common;

use borgortube::credentials::CredentialSet;
use borgortube::extractor::{CredentialMode, ExtractionOrchestrator};
use borgortube::utils::error::{BorgorError, ExtractionCause};
use common::{full_metadata, CountingAcquirer, ScriptedExtractor};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::assert_ok;

fn orchestrator(
    extractor: &Arc<ScriptedExtractor>,
    acquirer: &Arc<CountingAcquirer>,
    temp: &TempDir,
) -> ExtractionOrchestrator {
    ExtractionOrchestrator::new(
        extractor.clone(),
        acquirer.clone(),
        temp.path().join("cookies.txt"),
    )
}

#[tokio::test]
async fn anonymous_success_skips_credentials() {
    let temp = TempDir::new().expect("temp dir");
    let extractor = Arc::new(ScriptedExtractor::new(full_metadata(), false));
    let acquirer = Arc::new(CountingAcquirer::new(false));
    let orchestrator = orchestrator(&extractor, &acquirer, &temp);

    let resolved = assert_ok!(orchestrator.resolve("abc123").await);

    assert_eq!(resolved.mode, CredentialMode::Anonymous);
    assert_eq!(resolved.metadata, full_metadata());
    assert_eq!(acquirer.calls(), 0);
    assert!(!temp.path().join("cookies.txt").exists());
}

#[tokio::test]
async fn refused_extraction_acquires_cookies_once() {
    let temp = TempDir::new().expect("temp dir");
    let extractor = Arc::new(ScriptedExtractor::new(full_metadata(), true));
    let acquirer = Arc::new(CountingAcquirer::new(false));
    let orchestrator = orchestrator(&extractor, &acquirer, &temp);

    let resolved = orchestrator.resolve("abc123").await.expect("resolve");
    assert_eq!(resolved.mode, CredentialMode::Credentialed);
    assert_eq!(resolved.metadata.title, "Sample Video");
    assert_eq!(acquirer.calls(), 1);

    // The retry was pointed at the saved cookie file
    let cookie_file = temp.path().join("cookies.txt");
    let used = extractor.cookie_files.lock().unwrap().clone();
    assert_eq!(used, vec![None, Some(cookie_file.clone())]);

    let saved = CredentialSet::load(&cookie_file).await.expect("load cookies");
    assert_eq!(saved.entries.len(), 1);
    assert_eq!(saved.entries[0].name, "SID");
    assert_eq!(saved.entries[0].value, "secret");
}

#[tokio::test]
async fn existing_cookie_file_is_reused() {
    let temp = TempDir::new().expect("temp dir");
    std::fs::write(
        temp.path().join("cookies.txt"),
        "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tSID\told\n",
    )
    .expect("write cookies");

    let extractor = Arc::new(ScriptedExtractor::new(full_metadata(), true));
    let acquirer = Arc::new(CountingAcquirer::new(false));
    let orchestrator = orchestrator(&extractor, &acquirer, &temp);

    let resolved = orchestrator.resolve("abc123").await.expect("resolve");
    assert_eq!(resolved.mode, CredentialMode::Credentialed);
    assert_eq!(acquirer.calls(), 0);
}

#[tokio::test]
async fn acquisition_failure_is_reported_as_extraction_error() {
    let temp = TempDir::new().expect("temp dir");
    let extractor = Arc::new(ScriptedExtractor::new(full_metadata(), true));
    let acquirer = Arc::new(CountingAcquirer::new(true));
    let orchestrator = orchestrator(&extractor, &acquirer, &temp);

    let err = orchestrator.resolve("abc123").await.unwrap_err();
    assert!(matches!(
        err,
        BorgorError::ExtractionError {
            cause: ExtractionCause::CredentialAcquisitionFailed(_)
        }
    ));
    assert_eq!(acquirer.calls(), 1);
    // no credentialed retry without cookies
    assert_eq!(extractor.calls(), 1);
}

#[tokio::test]
async fn rejected_saved_cookies_are_reported_as_retry_failure() {
    let temp = TempDir::new().expect("temp dir");
    // a saved file without the session cookie the backend needs
    std::fs::write(
        temp.path().join("cookies.txt"),
        "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tFALSE\t0\tPREF\tf6=40000000\n",
    )
    .expect("write cookies");

    let extractor = Arc::new(ScriptedExtractor::new(full_metadata(), true));
    let acquirer = Arc::new(CountingAcquirer::new(false));
    let orchestrator = orchestrator(&extractor, &acquirer, &temp);

    let err = orchestrator.resolve("abc123").await.unwrap_err();
    assert!(matches!(
        err,
        BorgorError::ExtractionError {
            cause: ExtractionCause::CredentialedRetryFailed(_)
        }
    ));
    // the saved file is trusted, so nothing is re-acquired
    assert_eq!(acquirer.calls(), 0);
    assert_eq!(extractor.calls(), 2);

    // failures are not cached; a fixed cookie file is picked up on the next call
    std::fs::write(
        temp.path().join("cookies.txt"),
        "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tSID\tfresh\n",
    )
    .expect("rewrite cookies");
    let resolved = orchestrator.resolve("abc123").await.expect("resolve");
    assert_eq!(resolved.mode, CredentialMode::Credentialed);
}

#[tokio::test]
async fn repeated_resolve_hits_the_cache() {
    let temp = TempDir::new().expect("temp dir");
    let extractor = Arc::new(ScriptedExtractor::new(full_metadata(), false));
    let acquirer = Arc::new(CountingAcquirer::new(false));
    let orchestrator = orchestrator(&extractor, &acquirer, &temp);

    orchestrator.resolve("abc123").await.expect("first");
    orchestrator.resolve("abc123").await.expect("second");
    assert_eq!(extractor.calls(), 1);

    orchestrator.resolve("other").await.expect("other reference");
    assert_eq!(extractor.calls(), 2);
}

#[tokio::test]
async fn listings_use_their_own_cache_keys() {
    let temp = TempDir::new().expect("temp dir");
    let extractor = Arc::new(ScriptedExtractor::new(full_metadata(), false));
    let acquirer = Arc::new(CountingAcquirer::new(false));
    let orchestrator = orchestrator(&extractor, &acquirer, &temp);

    let results = orchestrator.search("rust", 2).await.expect("search");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].video_id, "rust-0");

    // channel listing is not implemented by the scripted extractor
    let err = orchestrator
        .channel_videos("https://www.youtube.com/@some", 5)
        .await
        .unwrap_err();
    assert!(matches!(err, BorgorError::OperationFailed(_)));

    let empty = orchestrator.channel_videos("", 5).await.expect("empty url");
    assert!(empty.is_empty());
}
