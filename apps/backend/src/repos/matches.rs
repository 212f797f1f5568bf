//! Match repository functions.

use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};

use crate::adapters::matches_sea as matches_adapter;
use crate::domain::{CandidateId, MatchView};
use crate::entities::session_matches;
use crate::errors::domain::DomainError;
use crate::infra::db_errors::is_unique_violation;

/// Match domain model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub session_id: String,
    pub candidate_id: CandidateId,
    pub round_number: i32,
    pub is_final_choice: bool,
}

impl From<session_matches::Model> for Match {
    fn from(model: session_matches::Model) -> Self {
        Self {
            session_id: model.session_id,
            candidate_id: model.candidate_id,
            round_number: model.round_number,
            is_final_choice: model.is_final_choice,
        }
    }
}

impl From<&Match> for MatchView {
    fn from(m: &Match) -> Self {
        MatchView {
            candidate_id: m.candidate_id.clone(),
            round_number: m.round_number,
            is_final_choice: m.is_final_choice,
        }
    }
}

/// Outcome of a set-if-absent finalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finalized {
    /// This call set the flag
    Set(Match),
    /// The session already had a final choice; it is returned unchanged
    AlreadyFinal(Match),
}

impl Finalized {
    pub fn into_match(self) -> Match {
        match self {
            Finalized::Set(m) | Finalized::AlreadyFinal(m) => m,
        }
    }
}

/// Returns `true` when the match was newly created.
pub async fn upsert<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    candidate_id: &str,
    round_number: i32,
) -> Result<bool, DomainError> {
    Ok(matches_adapter::insert_if_absent(conn, session_id, candidate_id, round_number).await?)
}

pub async fn for_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<Vec<Match>, DomainError> {
    let rows = matches_adapter::find_by_session(conn, session_id).await?;
    Ok(rows.into_iter().map(Match::from).collect())
}

pub async fn final_choice<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<Option<Match>, DomainError> {
    let row = matches_adapter::find_final(conn, session_id).await?;
    Ok(row.map(Match::from))
}

/// Make `candidate_id` the session's final choice unless one already exists.
///
/// Creates the match row first if needed. Never overwrites an earlier winner.
/// Must run outside a transaction: the losing side of a race sees a unique
/// violation, which would poison an open Postgres transaction.
pub async fn finalize_if_absent<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    candidate_id: &str,
    round_number: i32,
) -> Result<Finalized, DomainError> {
    matches_adapter::insert_if_absent(conn, session_id, candidate_id, round_number).await?;

    let flagged = match matches_adapter::mark_final_if_absent(conn, session_id, candidate_id).await
    {
        Ok(rows) => rows,
        // A concurrent finalize won the race on the partial unique index.
        Err(e) if is_unique_violation(&e) => 0,
        Err(e) => return Err(e.into()),
    };

    let current = matches_adapter::find_final(conn, session_id)
        .await?
        .map(Match::from)
        .ok_or_else(|| {
            DomainError::infra(
                crate::errors::domain::InfraErrorKind::DataCorruption,
                "Final choice missing after finalize",
            )
        })?;

    if flagged == 1 {
        Ok(Finalized::Set(current))
    } else {
        Ok(Finalized::AlreadyFinal(current))
    }
}
