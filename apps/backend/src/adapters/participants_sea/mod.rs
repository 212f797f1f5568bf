//! SeaORM adapter for the session roster.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::entities::session_participants;

/// Insert `(session_id, participant_id)` unless it is already on the roster.
/// Returns `true` when a row was written.
pub async fn insert_if_absent<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
) -> Result<bool, sea_orm::DbErr> {
    let participant_active = session_participants::ActiveModel {
        id: NotSet,
        session_id: Set(session_id.to_string()),
        participant_id: Set(participant_id.to_string()),
        joined_at: Set(time::OffsetDateTime::now_utc()),
    };

    let rows = session_participants::Entity::insert(participant_active)
        .on_conflict(
            OnConflict::columns([
                session_participants::Column::SessionId,
                session_participants::Column::ParticipantId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    Ok(rows == 1)
}

pub async fn find_one<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
) -> Result<Option<session_participants::Model>, sea_orm::DbErr> {
    session_participants::Entity::find()
        .filter(session_participants::Column::SessionId.eq(session_id))
        .filter(session_participants::Column::ParticipantId.eq(participant_id))
        .one(conn)
        .await
}

/// Roster in join order.
pub async fn find_by_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<Vec<session_participants::Model>, sea_orm::DbErr> {
    session_participants::Entity::find()
        .filter(session_participants::Column::SessionId.eq(session_id))
        .order_by_asc(session_participants::Column::JoinedAt)
        .order_by_asc(session_participants::Column::Id)
        .all(conn)
        .await
}

pub async fn count_by_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<u64, sea_orm::DbErr> {
    session_participants::Entity::find()
        .filter(session_participants::Column::SessionId.eq(session_id))
        .count(conn)
        .await
}
