//! SeaORM adapter for a session's candidate pool.

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder, Set};

use crate::entities::session_candidates;

pub mod dto;

pub use dto::CandidateCreate;

/// Insert the pool in the given order; rows already present are left alone.
pub async fn insert_pool<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    pool: Vec<CandidateCreate>,
) -> Result<u64, sea_orm::DbErr> {
    if pool.is_empty() {
        return Ok(0);
    }

    let rows = pool
        .into_iter()
        .enumerate()
        .map(|(position, c)| session_candidates::ActiveModel {
            id: NotSet,
            session_id: Set(session_id.to_string()),
            candidate_id: Set(c.candidate_id),
            name: Set(c.name),
            category: Set(c.category),
            rating: Set(c.rating),
            address: Set(c.address),
            position: Set(position as i32),
        });

    session_candidates::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                session_candidates::Column::SessionId,
                session_candidates::Column::CandidateId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await
}

pub async fn find_pool<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<Vec<session_candidates::Model>, sea_orm::DbErr> {
    session_candidates::Entity::find()
        .filter(session_candidates::Column::SessionId.eq(session_id))
        .order_by_asc(session_candidates::Column::Position)
        .all(conn)
        .await
}
