//! Vote repository functions.

use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};

use crate::adapters::votes_sea::{self as votes_adapter, VoteCreate};
use crate::domain::{Ballot, CandidateId, ParticipantId, VoteDirection};
use crate::entities::session_votes;
use crate::errors::domain::{DomainError, InfraErrorKind};
use crate::infra::db_errors::is_unique_violation;

/// Vote domain model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub session_id: String,
    pub participant_id: ParticipantId,
    pub candidate_id: CandidateId,
    pub round_number: i32,
    pub direction: VoteDirection,
}

impl From<session_votes::Model> for Vote {
    fn from(model: session_votes::Model) -> Self {
        Self {
            session_id: model.session_id,
            participant_id: model.participant_id,
            candidate_id: model.candidate_id,
            round_number: model.round_number,
            direction: model.direction,
        }
    }
}

impl From<&Vote> for Ballot {
    fn from(vote: &Vote) -> Self {
        Ballot::new(
            vote.participant_id.clone(),
            vote.candidate_id.clone(),
            vote.direction,
        )
    }
}

/// Record a swipe, or return the one already stored for the same
/// `(participant, candidate, round)`. The flag is `true` when this call wrote it.
pub async fn record_if_absent<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    vote: Vote,
) -> Result<(Vote, bool), DomainError> {
    let inserted = votes_adapter::insert_if_absent(conn, create_dto(&vote, false)).await?;
    let stored = require_stored(conn, &vote).await?;
    Ok((stored, inserted))
}

/// Record a final vote. Besides the per-candidate key, storage holds at most
/// one final accept per participant and round: when another accept already
/// holds that slot, it is returned instead and nothing is written.
pub async fn record_final_if_absent<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    vote: Vote,
) -> Result<(Vote, bool), DomainError> {
    let inserted = match votes_adapter::insert_if_absent(conn, create_dto(&vote, true)).await {
        Ok(inserted) => inserted,
        Err(e) if is_unique_violation(&e) => false,
        Err(e) => return Err(e.into()),
    };
    if inserted {
        return Ok((require_stored(conn, &vote).await?, true));
    }

    if vote.direction == VoteDirection::Accept {
        if let Some(existing) = votes_adapter::find_final_accept(
            conn,
            &vote.session_id,
            &vote.participant_id,
            vote.round_number,
        )
        .await?
        {
            return Ok((Vote::from(existing), false));
        }
    }
    Ok((require_stored(conn, &vote).await?, false))
}

pub async fn final_accept<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
    round_number: i32,
) -> Result<Option<Vote>, DomainError> {
    let row =
        votes_adapter::find_final_accept(conn, session_id, participant_id, round_number).await?;
    Ok(row.map(Vote::from))
}

fn create_dto(vote: &Vote, is_final_vote: bool) -> VoteCreate {
    VoteCreate {
        session_id: vote.session_id.clone(),
        participant_id: vote.participant_id.clone(),
        candidate_id: vote.candidate_id.clone(),
        round_number: vote.round_number,
        direction: vote.direction,
        is_final_vote,
    }
}

async fn require_stored<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    vote: &Vote,
) -> Result<Vote, DomainError> {
    votes_adapter::find_vote(
        conn,
        &vote.session_id,
        &vote.participant_id,
        &vote.candidate_id,
        vote.round_number,
    )
    .await?
    .map(Vote::from)
    .ok_or_else(|| {
        DomainError::infra(
            InfraErrorKind::DataCorruption,
            "Vote missing after insert-if-absent",
        )
    })
}

pub async fn find<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
    candidate_id: &str,
    round_number: i32,
) -> Result<Option<Vote>, DomainError> {
    let row =
        votes_adapter::find_vote(conn, session_id, participant_id, candidate_id, round_number)
            .await?;
    Ok(row.map(Vote::from))
}

pub async fn for_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    round_number: i32,
) -> Result<Vec<Vote>, DomainError> {
    let rows = votes_adapter::find_by_round(conn, session_id, round_number).await?;
    Ok(rows.into_iter().map(Vote::from).collect())
}

pub async fn for_participant<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
    round_number: i32,
) -> Result<Vec<Vote>, DomainError> {
    let rows =
        votes_adapter::find_by_participant_round(conn, session_id, participant_id, round_number)
            .await?;
    Ok(rows.into_iter().map(Vote::from).collect())
}

/// Votes of one round as ballots for the pure evaluators.
pub async fn ballots_for_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    round_number: i32,
) -> Result<Vec<Ballot>, DomainError> {
    let votes = for_round(conn, session_id, round_number).await?;
    Ok(votes.iter().map(Ballot::from).collect())
}
