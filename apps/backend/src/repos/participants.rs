//! Session roster repository functions.

use sea_orm::ConnectionTrait;

use crate::adapters::participants_sea as participants_adapter;
use crate::domain::ParticipantId;
use crate::errors::domain::DomainError;

/// Returns `true` when the participant was newly added.
pub async fn add_if_absent<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
) -> Result<bool, DomainError> {
    Ok(participants_adapter::insert_if_absent(conn, session_id, participant_id).await?)
}

pub async fn is_member<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
) -> Result<bool, DomainError> {
    Ok(participants_adapter::find_one(conn, session_id, participant_id)
        .await?
        .is_some())
}

/// Participant ids in join order.
pub async fn roster<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<Vec<ParticipantId>, DomainError> {
    let rows = participants_adapter::find_by_session(conn, session_id).await?;
    Ok(rows.into_iter().map(|m| m.participant_id).collect())
}

pub async fn count<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<u64, DomainError> {
    Ok(participants_adapter::count_by_session(conn, session_id).await?)
}
