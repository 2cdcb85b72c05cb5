//! Download worker module

pub mod worker;

pub use worker::{DownloadRequest, DownloadWorker, WorkerEvent, WorkerHandle, WorkerState};
