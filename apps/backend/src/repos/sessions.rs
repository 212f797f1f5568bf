//! Session repository functions for domain layer.

use sea_orm::ConnectionTrait;
use time::OffsetDateTime;

use crate::adapters::sessions_sea as sessions_adapter;
use crate::entities::sessions::{self, SessionStatus};
use crate::errors::domain::{DomainError, NotFoundKind};

/// Session domain model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub code: String,
    /// Participant who created the session
    pub host_id: String,
    pub current_round: i32,
    pub status: SessionStatus,
    pub started_at: Option<OffsetDateTime>,
    pub ended_at: Option<OffsetDateTime>,
}

impl Session {
    pub fn is_host(&self, participant_id: &str) -> bool {
        self.host_id == participant_id
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some() || self.status == SessionStatus::Completed
    }
}

impl From<sessions::Model> for Session {
    fn from(model: sessions::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            host_id: model.created_by,
            current_round: model.current_round,
            status: model.status,
            started_at: model.started_at,
            ended_at: model.ended_at,
        }
    }
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<Option<Session>, DomainError> {
    let session = sessions_adapter::find_by_id(conn, session_id).await?;
    Ok(session.map(Session::from))
}

/// Find a session or fail with `NotFound(Session)`.
pub async fn require_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<Session, DomainError> {
    find_by_id(conn, session_id).await?.ok_or_else(|| {
        DomainError::not_found(
            NotFoundKind::Session,
            format!("Session {session_id} not found"),
        )
    })
}

pub async fn find_by_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    code: &str,
) -> Result<Option<Session>, DomainError> {
    let session = sessions_adapter::find_by_code(conn, code).await?;
    Ok(session.map(Session::from))
}

pub async fn create_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: &str,
    code: &str,
    host_id: &str,
) -> Result<Session, DomainError> {
    let dto = sessions_adapter::SessionCreate::new(id, code, host_id);
    let session = sessions_adapter::create_session(conn, dto).await?;
    Ok(Session::from(session))
}

/// Returns `true` if this call started the session.
pub async fn mark_started<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<bool, DomainError> {
    Ok(sessions_adapter::mark_started(conn, session_id).await? == 1)
}

/// Returns `true` if the counter moved.
pub async fn advance_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    target_round: i32,
    status: SessionStatus,
) -> Result<bool, DomainError> {
    Ok(sessions_adapter::advance_round(conn, session_id, target_round, status).await? == 1)
}

/// Returns `true` if this call ended the session.
pub async fn mark_ended<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<bool, DomainError> {
    Ok(sessions_adapter::mark_ended(conn, session_id).await? == 1)
}
