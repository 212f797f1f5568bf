//! SeaORM adapter for sessions - generic over ConnectionTrait.
//!
//! Lifecycle writes are conditional updates: they report how many rows moved
//! and never overwrite a value that is already set.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};

use crate::entities::sessions::{self, SessionStatus};

pub mod dto;

pub use dto::SessionCreate;

// Adapter functions return DbErr; repos layer maps to DomainError via From<DbErr>.

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<Option<sessions::Model>, sea_orm::DbErr> {
    sessions::Entity::find_by_id(session_id.to_string())
        .one(conn)
        .await
}

pub async fn find_by_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    code: &str,
) -> Result<Option<sessions::Model>, sea_orm::DbErr> {
    sessions::Entity::find()
        .filter(sessions::Column::Code.eq(code))
        .one(conn)
        .await
}

pub async fn create_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: SessionCreate,
) -> Result<sessions::Model, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let session_active = sessions::ActiveModel {
        id: Set(dto.id),
        code: Set(dto.code),
        created_by: Set(dto.created_by),
        current_round: Set(1),
        status: Set(SessionStatus::Lobby),
        started_at: Set(None),
        ended_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    session_active.insert(conn).await
}

/// Set `started_at` and move to SWIPING, only if the session never started.
pub async fn mark_started<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<u64, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let result = sessions::Entity::update_many()
        .col_expr(sessions::Column::StartedAt, Expr::val(now).into())
        .col_expr(
            sessions::Column::Status,
            Expr::val(SessionStatus::Swiping.to_value()).into(),
        )
        .col_expr(sessions::Column::UpdatedAt, Expr::val(now).into())
        .filter(sessions::Column::Id.eq(session_id))
        .filter(sessions::Column::StartedAt.is_null())
        .filter(sessions::Column::EndedAt.is_null())
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Move the round counter forward to `target_round`. Never moves it back:
/// a duplicate or late request updates nothing.
pub async fn advance_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    target_round: i32,
    status: SessionStatus,
) -> Result<u64, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let result = sessions::Entity::update_many()
        .col_expr(sessions::Column::CurrentRound, Expr::val(target_round).into())
        .col_expr(sessions::Column::Status, Expr::val(status.to_value()).into())
        .col_expr(sessions::Column::UpdatedAt, Expr::val(now).into())
        .filter(sessions::Column::Id.eq(session_id))
        .filter(sessions::Column::CurrentRound.lt(target_round))
        .filter(sessions::Column::EndedAt.is_null())
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Set `ended_at` once and mark the session COMPLETED.
pub async fn mark_ended<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<u64, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let result = sessions::Entity::update_many()
        .col_expr(sessions::Column::EndedAt, Expr::val(now).into())
        .col_expr(
            sessions::Column::Status,
            Expr::val(SessionStatus::Completed.to_value()).into(),
        )
        .col_expr(sessions::Column::UpdatedAt, Expr::val(now).into())
        .filter(sessions::Column::Id.eq(session_id))
        .filter(sessions::Column::EndedAt.is_null())
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
