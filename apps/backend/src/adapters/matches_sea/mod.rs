//! SeaORM adapter for matches.
//!
//! Matches are contended: any participant's evaluator or tally may write
//! them. Creation is insert-if-absent keyed by candidate, and the final
//! choice flag only ever goes from false to true, at most once per session.

use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder, Set};

use crate::entities::session_matches;

/// Returns `true` when a new match row was written.
pub async fn insert_if_absent<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    candidate_id: &str,
    round_number: i32,
) -> Result<bool, sea_orm::DbErr> {
    let match_active = session_matches::ActiveModel {
        id: NotSet,
        session_id: Set(session_id.to_string()),
        candidate_id: Set(candidate_id.to_string()),
        round_number: Set(round_number),
        is_final_choice: Set(false),
        created_at: Set(time::OffsetDateTime::now_utc()),
        finalized_at: Set(None),
    };

    let rows = session_matches::Entity::insert(match_active)
        .on_conflict(
            OnConflict::columns([
                session_matches::Column::SessionId,
                session_matches::Column::CandidateId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    Ok(rows == 1)
}

/// Flag `candidate_id` as the final choice unless the session already has one.
///
/// Returns the number of rows flagged (0 or 1). A concurrent writer that
/// slips past the `NOT EXISTS` guard is stopped by the partial unique index
/// and surfaces as a unique violation.
pub async fn mark_final_if_absent<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    candidate_id: &str,
) -> Result<u64, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();

    let existing_final = Query::select()
        .expr(Expr::val(1))
        .from(session_matches::Entity)
        .and_where(Expr::col(session_matches::Column::SessionId).eq(session_id))
        .and_where(Expr::col(session_matches::Column::IsFinalChoice).eq(true))
        .to_owned();

    let result = session_matches::Entity::update_many()
        .col_expr(session_matches::Column::IsFinalChoice, Expr::val(true).into())
        .col_expr(session_matches::Column::FinalizedAt, Expr::val(now).into())
        .filter(session_matches::Column::SessionId.eq(session_id))
        .filter(session_matches::Column::CandidateId.eq(candidate_id))
        .filter(Expr::exists(existing_final).not())
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

pub async fn find_by_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<Vec<session_matches::Model>, sea_orm::DbErr> {
    session_matches::Entity::find()
        .filter(session_matches::Column::SessionId.eq(session_id))
        .order_by_asc(session_matches::Column::RoundNumber)
        .order_by_asc(session_matches::Column::Id)
        .all(conn)
        .await
}

pub async fn find_final<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<Option<session_matches::Model>, sea_orm::DbErr> {
    session_matches::Entity::find()
        .filter(session_matches::Column::SessionId.eq(session_id))
        .filter(session_matches::Column::IsFinalChoice.eq(true))
        .one(conn)
        .await
}
