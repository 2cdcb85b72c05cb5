//! Download worker state machine and event ordering tests

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::{mpsc, Notify};
use tubevault::extractor::{DownloadProfile, MediaExtractor, MediaInfo};
use tubevault::{DownloadRequest, DownloadWorker, MediaKind, TubevaultError, WorkerEvent, WorkerState};

/// Scripted extraction capability for driving the worker in tests.
#[derive(Default)]
struct MockExtractor {
    /// `None` makes metadata resolution fail.
    media_info: Option<MediaInfo>,
    /// Raw progress values reported during the transfer.
    progress: Vec<f64>,
    /// `Some` makes the transfer fail with this message.
    transfer_error: Option<String>,
    /// When set, the transfer blocks until notified.
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl MediaExtractor for MockExtractor {
    async fn probe(&self, url: &str) -> Result<MediaInfo, TubevaultError> {
        match &self.media_info {
            Some(info) => Ok(info.clone()),
            None => Err(TubevaultError::MetadataUnavailable(url.to_string())),
        }
    }

    async fn download(
        &self,
        _url: &str,
        _output_template: &Path,
        _profile: &DownloadProfile,
        progress: mpsc::Sender<f64>,
    ) -> Result<(), TubevaultError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        for p in &self.progress {
            let _ = progress.send(*p).await;
        }
        match &self.transfer_error {
            Some(msg) => Err(TubevaultError::Download(msg.clone())),
            None => Ok(()),
        }
    }
}

fn usable_info(title: &str) -> MediaInfo {
    MediaInfo {
        id: "abc123".into(),
        title: title.into(),
        url: "https://www.youtube.com/watch?v=abc123".into(),
        ..Default::default()
    }
}

fn request(dest: &Path, kind: MediaKind) -> DownloadRequest {
    DownloadRequest {
        url: "https://www.youtube.com/watch?v=abc123".into(),
        dest_dir: dest.to_path_buf(),
        kind,
        audio_bitrate_kbps: 192,
    }
}

async fn drain(mut rx: mpsc::Receiver<WorkerEvent>) -> Vec<WorkerEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_metadata_failure_goes_straight_to_failed() {
    let dir = tempdir().unwrap();
    let worker = DownloadWorker::new(Arc::new(MockExtractor::default()));
    let (handle, rx) = worker.spawn(request(dir.path(), MediaKind::Video));

    let events = drain(rx).await;
    assert_eq!(events.len(), 1, "no progress or metadata before the failure");
    match &events[0] {
        WorkerEvent::Failed { reason } => {
            assert!(reason.contains("metadata"), "unexpected reason: {reason}")
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(handle.state(), WorkerState::Failed);
}

#[tokio::test]
async fn test_unusable_metadata_fails() {
    let dir = tempdir().unwrap();
    let extractor = MockExtractor {
        media_info: Some(usable_info("   ")),
        ..Default::default()
    };
    let worker = DownloadWorker::new(Arc::new(extractor));
    let (handle, rx) = worker.spawn(request(dir.path(), MediaKind::Video));

    let events = drain(rx).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], WorkerEvent::Failed { reason } if reason.contains("metadata")));
    assert_eq!(handle.state(), WorkerState::Failed);
}

#[tokio::test]
async fn test_successful_download_event_order() {
    let dir = tempdir().unwrap();
    let extractor = MockExtractor {
        media_info: Some(usable_info("Test Video")),
        progress: vec![10.0, 55.5, 99.0],
        ..Default::default()
    };
    let worker = DownloadWorker::new(Arc::new(extractor));
    let (handle, rx) = worker.spawn(request(dir.path(), MediaKind::Video));

    let events = drain(rx).await;

    // Metadata first, terminal event last, progress in between.
    assert!(matches!(&events[0], WorkerEvent::MetadataResolved(info) if info.title == "Test Video"));
    match events.last().unwrap() {
        WorkerEvent::Completed { output_path } => {
            assert_eq!(output_path, &dir.path().join("Test_Video.mp4"));
        }
        other => panic!("expected Completed, got {other:?}"),
    }

    let percents: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert_eq!(*percents.last().unwrap(), 100.0);
    assert_eq!(handle.state(), WorkerState::Succeeded);
}

#[tokio::test]
async fn test_audio_profile_output_path() {
    let dir = tempdir().unwrap();
    let extractor = MockExtractor {
        media_info: Some(usable_info("My Song")),
        ..Default::default()
    };
    let worker = DownloadWorker::new(Arc::new(extractor));
    let (_handle, rx) = worker.spawn(request(dir.path(), MediaKind::Audio));

    let events = drain(rx).await;
    match events.last().unwrap() {
        WorkerEvent::Completed { output_path } => {
            assert_eq!(output_path, &dir.path().join("My_Song.mp3"));
        }
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_progress_is_clamped_and_monotonic() {
    let dir = tempdir().unwrap();
    let extractor = MockExtractor {
        media_info: Some(usable_info("Jumpy")),
        // Regressions and out-of-range values must not reach consumers.
        progress: vec![50.0, 25.0, 150.0, 75.0],
        ..Default::default()
    };
    let worker = DownloadWorker::new(Arc::new(extractor));
    let (_handle, rx) = worker.spawn(request(dir.path(), MediaKind::Video));

    let events = drain(rx).await;
    let percents: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();

    assert!(percents.iter().all(|p| (0.0..=100.0).contains(p)), "{percents:?}");
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert!(!percents.contains(&25.0));
    assert!(!percents.contains(&75.0));
}

#[tokio::test]
async fn test_transfer_failure_after_metadata() {
    let dir = tempdir().unwrap();
    let extractor = MockExtractor {
        media_info: Some(usable_info("Doomed")),
        progress: vec![12.0],
        transfer_error: Some("network unreachable".into()),
        ..Default::default()
    };
    let worker = DownloadWorker::new(Arc::new(extractor));
    let (handle, rx) = worker.spawn(request(dir.path(), MediaKind::Video));

    let events = drain(rx).await;
    assert!(matches!(&events[0], WorkerEvent::MetadataResolved(_)));
    match events.last().unwrap() {
        WorkerEvent::Failed { reason } => assert!(reason.contains("network unreachable")),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(!events.iter().any(|e| matches!(e, WorkerEvent::Completed { .. })));
    assert_eq!(handle.state(), WorkerState::Failed);
}

#[tokio::test]
async fn test_worker_reports_running_while_gated() {
    let dir = tempdir().unwrap();
    let gate = Arc::new(Notify::new());
    let extractor = MockExtractor {
        media_info: Some(usable_info("Gated")),
        gate: Some(Arc::clone(&gate)),
        ..Default::default()
    };
    let worker = DownloadWorker::new(Arc::new(extractor));
    let (handle, mut rx) = worker.spawn(request(dir.path(), MediaKind::Video));

    // First event proves the worker is past resolution and mid-transfer.
    let first = rx.recv().await.unwrap();
    assert!(matches!(first, WorkerEvent::MetadataResolved(_)));
    assert_eq!(handle.state(), WorkerState::Running);

    gate.notify_one();
    let rest: Vec<WorkerEvent> = drain(rx).await;
    assert!(matches!(rest.last().unwrap(), WorkerEvent::Completed { .. }));
    assert_eq!(handle.state(), WorkerState::Succeeded);
}
