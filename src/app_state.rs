use std::sync::Arc;
use std::sync::mpsc::Receiver;

use eqlog_core::{AppConfig, AppConfigExt, GameSignal, ParsingSession, ReferenceError};
use tokio::sync::{Mutex, RwLock};

/// Shared state for the REPL. The session guards its own stores, so only the
/// config and the background tail need locking here.
pub struct AppState {
    pub config: RwLock<AppConfig>,
    pub session: Arc<ParsingSession>,
    /// Signals emitted since the last `signals` command
    pub signals: std::sync::Mutex<Receiver<GameSignal>>,
    pub tail_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl AppState {
    pub fn new() -> Result<Self, ReferenceError> {
        Self::with_config(AppConfig::load())
    }

    pub fn with_config(config: AppConfig) -> Result<Self, ReferenceError> {
        let session = Arc::new(ParsingSession::new(&config)?);
        let signals = std::sync::Mutex::new(session.signals());
        Ok(Self {
            config: RwLock::new(config),
            session,
            signals,
            tail_task: Mutex::new(None),
        })
    }

    /// Stop following a file, if one is being tailed
    pub async fn stop_tail(&self) {
        if let Some(task) = self.tail_task.lock().await.take() {
            task.abort();
        }
    }
}
