//! SeaORM adapter for per-round decks.
//!
//! A deck is written once per round; later writes for the same round are
//! absorbed by the unique key and leave the original order in place.

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder, Set};

use crate::entities::round_decks;

pub async fn insert_deck_if_absent<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    round_number: i32,
    candidate_ids: &[String],
) -> Result<u64, sea_orm::DbErr> {
    if candidate_ids.is_empty() {
        return Ok(0);
    }

    let now = time::OffsetDateTime::now_utc();
    let rows = candidate_ids
        .iter()
        .enumerate()
        .map(|(position, candidate_id)| round_decks::ActiveModel {
            id: NotSet,
            session_id: Set(session_id.to_string()),
            round_number: Set(round_number),
            candidate_id: Set(candidate_id.clone()),
            position: Set(position as i32),
            created_at: Set(now),
        });

    round_decks::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                round_decks::Column::SessionId,
                round_decks::Column::RoundNumber,
                round_decks::Column::CandidateId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await
}

/// Deck rows for one round in deck order.
pub async fn find_deck<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    round_number: i32,
) -> Result<Vec<round_decks::Model>, sea_orm::DbErr> {
    round_decks::Entity::find()
        .filter(round_decks::Column::SessionId.eq(session_id))
        .filter(round_decks::Column::RoundNumber.eq(round_number))
        .order_by_asc(round_decks::Column::Position)
        .order_by_asc(round_decks::Column::Id)
        .all(conn)
        .await
}
