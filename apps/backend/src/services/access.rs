//! Guards shared by the session services.
//!
//! Services are trust boundaries: they load what they check from storage
//! rather than relying on the caller.

use sea_orm::ConnectionTrait;

use crate::entities::sessions::SessionStatus;
use crate::errors::domain::{ConflictKind, DomainError, ValidationKind};
use crate::repos::participants;
use crate::repos::sessions::{self, Session};

/// Load the session and require `participant_id` on its roster.
pub async fn require_member<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
) -> Result<Session, DomainError> {
    let session = sessions::require_session(conn, session_id).await?;
    if !participants::is_member(conn, session_id, participant_id).await? {
        return Err(DomainError::validation(
            ValidationKind::NotAParticipant,
            format!("{participant_id} is not in session {session_id}"),
        ));
    }
    Ok(session)
}

/// Load the session and require `participant_id` to be its host.
pub async fn require_host<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
) -> Result<Session, DomainError> {
    let session = sessions::require_session(conn, session_id).await?;
    if !session.is_host(participant_id) {
        return Err(DomainError::validation(
            ValidationKind::NotHost,
            "Only the host can do this",
        ));
    }
    Ok(session)
}

/// Votes are only taken while swiping or voting.
pub fn require_accepting_votes(session: &Session) -> Result<(), DomainError> {
    if session.is_ended() {
        return Err(DomainError::conflict(
            ConflictKind::SessionEnded,
            format!("Session {} has ended", session.id),
        ));
    }
    match session.status {
        SessionStatus::Swiping | SessionStatus::Voting => Ok(()),
        SessionStatus::Lobby | SessionStatus::Completed => Err(DomainError::validation(
            ValidationKind::SessionNotStarted,
            format!("Session {} has not started", session.id),
        )),
    }
}

pub fn require_current_round(session: &Session, round_number: i32) -> Result<(), DomainError> {
    if session.current_round != round_number {
        return Err(DomainError::validation(
            ValidationKind::RoundMismatch,
            format!(
                "Round {round_number} is not the current round ({})",
                session.current_round
            ),
        ));
    }
    Ok(())
}
