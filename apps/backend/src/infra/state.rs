use crate::config::db::DbKind;
use crate::config::EngineConfig;
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::state::app_state::AppState;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    engine: EngineConfig,
    db_kind: Option<DbKind>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            engine: EngineConfig::default(),
            db_kind: None,
        }
    }

    pub fn with_db(mut self, kind: DbKind) -> Self {
        self.db_kind = Some(kind);
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        self.engine.validate()?;
        if let Some(kind) = self.db_kind {
            // single entrypoint: connect + migrate
            let conn = bootstrap_db(kind).await?;
            Ok(AppState::new(conn, self.engine))
        } else {
            Ok(AppState::new_without_db(self.engine))
        }
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
