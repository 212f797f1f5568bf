use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::EngineConfig;
use crate::sync::SyncHub;

/// Application state containing shared resources
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database connection (absent only in tests that never touch storage)
    pub db: Option<DatabaseConnection>,
    /// Per-session change notifications
    pub hub: Arc<SyncHub>,
    pub engine: EngineConfig,
}

impl AppState {
    pub fn new(db: DatabaseConnection, engine: EngineConfig) -> Self {
        Self {
            db: Some(db),
            hub: Arc::new(SyncHub::new()),
            engine,
        }
    }

    pub fn new_without_db(engine: EngineConfig) -> Self {
        Self {
            db: None,
            hub: Arc::new(SyncHub::new()),
            engine,
        }
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }
}
