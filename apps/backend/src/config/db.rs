use std::env;

use crate::error::AppError;

/// Which database the process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// `DATABASE_URL`, or a URL assembled from `POSTGRES_*` variables
    Postgres,
    /// SQLite file at `SQLITE_PATH` (default `huddle.db`), created if missing
    SqliteFile,
    /// Private in-memory SQLite; used by tests
    SqliteMemory,
}

impl DbKind {
    /// Parse `HUDDLE_DB` (`postgres`, `sqlite-file`, `sqlite-memory`).
    pub fn from_env() -> Result<Self, AppError> {
        match env::var("HUDDLE_DB") {
            Err(_) => Ok(DbKind::Postgres),
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "postgres" => Ok(DbKind::Postgres),
                "sqlite-file" => Ok(DbKind::SqliteFile),
                "sqlite-memory" => Ok(DbKind::SqliteMemory),
                other => Err(AppError::config(format!(
                    "HUDDLE_DB must be postgres, sqlite-file or sqlite-memory, got '{other}'"
                ))),
            },
        }
    }
}

/// Build the connection URL for `kind` from the environment.
pub fn db_url(kind: DbKind) -> Result<String, AppError> {
    match kind {
        DbKind::Postgres => {
            if let Ok(url) = env::var("DATABASE_URL") {
                return Ok(url);
            }
            let host = env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string());
            let port = env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
            let db_name = must_var("POSTGRES_DB")?;
            let user = must_var("POSTGRES_USER")?;
            let password = must_var("POSTGRES_PASSWORD")?;
            Ok(format!("postgresql://{user}:{password}@{host}:{port}/{db_name}"))
        }
        DbKind::SqliteFile => {
            let path = env::var("SQLITE_PATH").unwrap_or_else(|_| "huddle.db".to_string());
            Ok(format!("sqlite://{path}?mode=rwc"))
        }
        DbKind::SqliteMemory => Ok("sqlite::memory:".to_string()),
    }
}

fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::config(format!("Required environment variable '{name}' is not set")))
}
