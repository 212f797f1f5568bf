//! SeaORM adapter for votes. Votes are append-only.

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder, Set};

use crate::entities::session_votes;

pub mod dto;

pub use dto::VoteCreate;

/// Insert unless a vote already exists for
/// `(session, participant, candidate, round)`. Returns `true` when written.
pub async fn insert_if_absent<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: VoteCreate,
) -> Result<bool, sea_orm::DbErr> {
    let rows = session_votes::Entity::insert(active_model(dto))
        .on_conflict(
            OnConflict::columns([
                session_votes::Column::SessionId,
                session_votes::Column::ParticipantId,
                session_votes::Column::CandidateId,
                session_votes::Column::RoundNumber,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    Ok(rows == 1)
}

fn active_model(dto: VoteCreate) -> session_votes::ActiveModel {
    session_votes::ActiveModel {
        id: NotSet,
        session_id: Set(dto.session_id),
        participant_id: Set(dto.participant_id),
        candidate_id: Set(dto.candidate_id),
        round_number: Set(dto.round_number),
        direction: Set(dto.direction),
        is_final_vote: Set(dto.is_final_vote),
        created_at: Set(time::OffsetDateTime::now_utc()),
    }
}

/// Find the participant's final-vote accept for a round, if any.
pub async fn find_final_accept<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
    round_number: i32,
) -> Result<Option<session_votes::Model>, sea_orm::DbErr> {
    session_votes::Entity::find()
        .filter(session_votes::Column::SessionId.eq(session_id))
        .filter(session_votes::Column::ParticipantId.eq(participant_id))
        .filter(session_votes::Column::RoundNumber.eq(round_number))
        .filter(session_votes::Column::IsFinalVote.eq(true))
        .filter(session_votes::Column::Direction.eq(session_votes::VoteDirection::Accept))
        .one(conn)
        .await
}

pub async fn find_vote<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
    candidate_id: &str,
    round_number: i32,
) -> Result<Option<session_votes::Model>, sea_orm::DbErr> {
    session_votes::Entity::find()
        .filter(session_votes::Column::SessionId.eq(session_id))
        .filter(session_votes::Column::ParticipantId.eq(participant_id))
        .filter(session_votes::Column::CandidateId.eq(candidate_id))
        .filter(session_votes::Column::RoundNumber.eq(round_number))
        .one(conn)
        .await
}

pub async fn find_by_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    round_number: i32,
) -> Result<Vec<session_votes::Model>, sea_orm::DbErr> {
    session_votes::Entity::find()
        .filter(session_votes::Column::SessionId.eq(session_id))
        .filter(session_votes::Column::RoundNumber.eq(round_number))
        .order_by_asc(session_votes::Column::Id)
        .all(conn)
        .await
}

pub async fn find_by_participant_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
    round_number: i32,
) -> Result<Vec<session_votes::Model>, sea_orm::DbErr> {
    session_votes::Entity::find()
        .filter(session_votes::Column::SessionId.eq(session_id))
        .filter(session_votes::Column::ParticipantId.eq(participant_id))
        .filter(session_votes::Column::RoundNumber.eq(round_number))
        .order_by_asc(session_votes::Column::Id)
        .all(conn)
        .await
}
