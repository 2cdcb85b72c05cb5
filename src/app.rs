//! Session state and application orchestration
//!
//! A single control thread owns the `App`; workers run in the background
//! and report back through channels. The session is an explicit value
//! here, not a process-wide singleton.

use crate::database::{
    Account, AccountStore, DownloadRecord, DownloadStats, HistoryStore, MediaKind,
};
use crate::downloader::{DownloadRequest, DownloadWorker, WorkerEvent};
use crate::extractor::{MediaExtractor, MediaInfo};
use crate::utils::{validators, AppSettings, TubevaultError};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// The currently-authenticated account, or none.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<Account>,
}

impl Session {
    pub fn account(&self) -> Option<&Account> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }
}

/// Which screen the UI should be showing. Kept consistent with the
/// session: no session means login/register only, a session means main.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Main,
}

/// Updates relayed to the caller while a download runs. `Completed`
/// carries the id of the history record written for it.
#[derive(Debug, Clone)]
pub enum DownloadUpdate {
    Metadata(MediaInfo),
    Progress(f64),
    Completed {
        record_id: i64,
        output_path: PathBuf,
    },
    Failed {
        reason: String,
    },
}

/// Application orchestrator: routes auth and download operations and
/// coordinates worker output into history writes.
pub struct App {
    accounts: AccountStore,
    history: HistoryStore,
    extractor: Option<Arc<dyn MediaExtractor>>,
    settings: AppSettings,
    session: Session,
    screen: Screen,
    // Policy: a single active download; starting another is rejected.
    download_active: Arc<AtomicBool>,
}

impl App {
    pub fn new(
        pool: Pool<Sqlite>,
        extractor: Option<Arc<dyn MediaExtractor>>,
        settings: AppSettings,
    ) -> Self {
        Self {
            accounts: AccountStore::new(pool.clone()),
            history: HistoryStore::new(pool),
            extractor,
            settings,
            session: Session::default(),
            screen: Screen::Login,
            download_active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Switch to the registration screen. Only reachable while logged out.
    pub fn show_register(&mut self) {
        if !self.session.is_authenticated() {
            self.screen = Screen::Register;
        }
    }

    pub fn show_login(&mut self) {
        if !self.session.is_authenticated() {
            self.screen = Screen::Login;
        }
    }

    /// Validate all fields, then create the account. The new user still
    /// has to log in afterwards; the session is untouched.
    pub async fn register_account(
        &mut self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<Account, TubevaultError> {
        validators::validate_username(username)?;
        validators::validate_password(password)?;
        validators::validate_email(email)?;

        let account = self.accounts.register(username, password, email).await?;
        info!(username, "account created");
        self.screen = Screen::Login;
        Ok(account)
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), TubevaultError> {
        let account = self.accounts.authenticate(username, password).await?;
        info!(username, "logged in");
        self.session.current = Some(account);
        self.screen = Screen::Main;
        Ok(())
    }

    pub fn logout(&mut self) {
        if let Some(account) = self.session.current.take() {
            info!(username = %account.username, "logged out");
        }
        self.screen = Screen::Login;
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), TubevaultError> {
        let account = self.require_session()?;
        validators::validate_password(new_password)?;
        self.accounts
            .change_password(account.id, old_password, new_password)
            .await
    }

    /// Start a download for the logged-in account.
    ///
    /// Rejected while another download is active. The returned channel
    /// yields metadata, progress and exactly one terminal update; on
    /// success the history record is written before `Completed` is
    /// reported, on failure nothing is written.
    pub fn start_download(
        &self,
        url: &str,
        kind: MediaKind,
    ) -> Result<mpsc::Receiver<DownloadUpdate>, TubevaultError> {
        let account = self.require_session()?;
        validators::validate_media_url(url)?;

        let extractor = self
            .extractor
            .clone()
            .ok_or(TubevaultError::YtDlpNotFound)?;

        if self.download_active.swap(true, Ordering::SeqCst) {
            return Err(TubevaultError::DownloadInProgress);
        }

        let worker = DownloadWorker::new(extractor);
        let (handle, mut events) = worker.spawn(DownloadRequest {
            url: url.to_string(),
            dest_dir: self.settings.download_dir.clone(),
            kind,
            audio_bitrate_kbps: self.settings.audio_bitrate_kbps,
        });
        info!(worker = %handle.id(), url, kind = %kind, "download started");

        let (update_tx, update_rx) = mpsc::channel(64);
        let history = self.history.clone();
        let active = Arc::clone(&self.download_active);
        let owner_id = account.id;
        let source_url = url.to_string();

        tokio::spawn(async move {
            let mut title: Option<String> = None;

            while let Some(event) = events.recv().await {
                match event {
                    WorkerEvent::MetadataResolved(info) => {
                        title = Some(info.title.clone());
                        let _ = update_tx.send(DownloadUpdate::Metadata(info)).await;
                    }
                    WorkerEvent::Progress(percent) => {
                        let _ = update_tx.send(DownloadUpdate::Progress(percent)).await;
                    }
                    WorkerEvent::Completed { output_path } => {
                        // Metadata always precedes the terminal event.
                        let title = title.clone().unwrap_or_else(|| "Untitled".to_string());
                        let saved = history
                            .add_record(owner_id, &title, &source_url, &output_path, kind)
                            .await;
                        let update = match saved {
                            Ok(record_id) => DownloadUpdate::Completed {
                                record_id,
                                output_path,
                            },
                            Err(e) => {
                                error!(error = %e, "failed to save download record");
                                DownloadUpdate::Failed {
                                    reason: e.to_string(),
                                }
                            }
                        };
                        let _ = update_tx.send(update).await;
                    }
                    WorkerEvent::Failed { reason } => {
                        let _ = update_tx.send(DownloadUpdate::Failed { reason }).await;
                    }
                }
            }

            active.store(false, Ordering::SeqCst);
        });

        Ok(update_rx)
    }

    /// The session account's downloads, newest first.
    pub async fn history(&self) -> Result<Vec<DownloadRecord>, TubevaultError> {
        let account = self.require_session()?;
        self.history.list_by_owner(account.id).await
    }

    /// Delete one of the session account's records; `false` when the id
    /// does not exist or belongs to someone else.
    pub async fn delete_history_record(&self, record_id: i64) -> Result<bool, TubevaultError> {
        let account = self.require_session()?;
        self.history.delete_record(record_id, account.id).await
    }

    pub async fn stats(&self) -> Result<DownloadStats, TubevaultError> {
        let account = self.require_session()?;
        self.history.stats_by_owner(account.id).await
    }

    fn require_session(&self) -> Result<&Account, TubevaultError> {
        self.session
            .account()
            .ok_or(TubevaultError::NotAuthenticated)
    }
}
