//! Background download worker
//!
//! One worker per user-initiated download, never reused. The worker runs
//! off the control thread and communicates exclusively through messages;
//! it never touches session or UI state directly.

use crate::database::MediaKind;
use crate::extractor::{DownloadProfile, MediaExtractor, MediaInfo};
use crate::utils::files;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Worker lifecycle: `Idle → Running → {Succeeded, Failed}`, terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Events emitted by a worker, in order: an optional `MetadataResolved`,
/// any number of non-decreasing `Progress` updates, then exactly one
/// terminal `Completed` or `Failed`.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    MetadataResolved(MediaInfo),
    /// Percentage in `[0.0, 100.0]`
    Progress(f64),
    Completed {
        output_path: PathBuf,
    },
    Failed {
        reason: String,
    },
}

/// Everything a worker needs to run one download
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub dest_dir: PathBuf,
    pub kind: MediaKind,
    pub audio_bitrate_kbps: u32,
}

/// Handle to observe a spawned worker
pub struct WorkerHandle {
    id: Uuid,
    state: watch::Receiver<WorkerState>,
}

impl WorkerHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }
}

/// A single-use download worker
pub struct DownloadWorker {
    id: Uuid,
    extractor: Arc<dyn MediaExtractor>,
}

impl DownloadWorker {
    pub fn new(extractor: Arc<dyn MediaExtractor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            extractor,
        }
    }

    /// Spawn the worker onto the runtime, consuming it. Events arrive on
    /// the returned receiver; the channel closes after the terminal event.
    pub fn spawn(self, request: DownloadRequest) -> (WorkerHandle, mpsc::Receiver<WorkerEvent>) {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(WorkerState::Idle);
        let handle = WorkerHandle {
            id: self.id,
            state: state_rx,
        };

        tokio::spawn(async move {
            self.run(request, event_tx, state_tx).await;
        });

        (handle, event_rx)
    }

    async fn run(
        self,
        request: DownloadRequest,
        events: mpsc::Sender<WorkerEvent>,
        state: watch::Sender<WorkerState>,
    ) {
        let _ = state.send(WorkerState::Running);
        info!(worker = %self.id, url = %request.url, kind = %request.kind, "resolving metadata");

        // Resolve metadata first; nothing is transferred until it succeeds.
        let media_info = match self.extractor.probe(&request.url).await {
            Ok(info) if info.is_usable() => info,
            Ok(_) => {
                warn!(worker = %self.id, "metadata resolution returned nothing usable");
                let reason =
                    crate::utils::TubevaultError::MetadataUnavailable(request.url.clone())
                        .to_string();
                let _ = events.send(WorkerEvent::Failed { reason }).await;
                let _ = state.send(WorkerState::Failed);
                return;
            }
            Err(e) => {
                warn!(worker = %self.id, error = %e, "metadata resolution failed");
                let _ = events
                    .send(WorkerEvent::Failed {
                        reason: e.to_string(),
                    })
                    .await;
                let _ = state.send(WorkerState::Failed);
                return;
            }
        };

        let _ = events
            .send(WorkerEvent::MetadataResolved(media_info.clone()))
            .await;

        if let Err(e) = files::ensure_dir(&request.dest_dir) {
            let _ = events
                .send(WorkerEvent::Failed {
                    reason: format!("cannot create destination directory: {e}"),
                })
                .await;
            let _ = state.send(WorkerState::Failed);
            return;
        }

        // Derive the destination from the resolved title; collide with an
        // existing file and the stem gets a numeric suffix instead.
        let stem = files::sanitize_filename(&media_info.title);
        let filename = format!("{stem}.{}", request.kind.extension());
        let output_path = files::available_path(&request.dest_dir, &filename);
        let final_stem = output_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&stem)
            .to_string();
        let template = request.dest_dir.join(format!("{final_stem}.%(ext)s"));

        // Relay progress, clamping into [0, 100] and dropping regressions
        // so downstream consumers always see a non-decreasing sequence.
        let (progress_tx, mut progress_rx) = mpsc::channel::<f64>(64);
        let relay_events = events.clone();
        let relay = tokio::spawn(async move {
            let mut last = 0.0f64;
            while let Some(raw) = progress_rx.recv().await {
                let percent = raw.clamp(0.0, 100.0);
                if percent >= last {
                    last = percent;
                    let _ = relay_events.send(WorkerEvent::Progress(percent)).await;
                }
            }
        });

        let profile = DownloadProfile::for_kind(request.kind, request.audio_bitrate_kbps);
        let result = self
            .extractor
            .download(&request.url, &template, &profile, progress_tx)
            .await;

        // The progress sender is gone once download returns; drain the
        // relay before the terminal event so ordering holds.
        let _ = relay.await;

        match result {
            Ok(()) => {
                debug!(worker = %self.id, path = %output_path.display(), "transfer complete");
                let _ = events.send(WorkerEvent::Progress(100.0)).await;
                let _ = events.send(WorkerEvent::Completed { output_path }).await;
                let _ = state.send(WorkerState::Succeeded);
            }
            Err(e) => {
                warn!(worker = %self.id, error = %e, "transfer failed");
                let _ = events
                    .send(WorkerEvent::Failed {
                        reason: e.to_string(),
                    })
                    .await;
                let _ = state.send(WorkerState::Failed);
            }
        }
    }
}
