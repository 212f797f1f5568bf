//! Candidate pool and per-round deck repository functions.

use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};

use crate::adapters::candidates_sea::{self as candidates_adapter, CandidateCreate};
use crate::adapters::decks_sea as decks_adapter;
use crate::domain::CandidateId;
use crate::entities::session_candidates;
use crate::errors::domain::DomainError;

/// A place (or anything else) the group is choosing between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub candidate_id: CandidateId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
}

impl From<session_candidates::Model> for Candidate {
    fn from(model: session_candidates::Model) -> Self {
        Self {
            candidate_id: model.candidate_id,
            name: model.name,
            category: model.category,
            rating: model.rating,
            address: model.address,
        }
    }
}

impl From<Candidate> for CandidateCreate {
    fn from(c: Candidate) -> Self {
        Self {
            candidate_id: c.candidate_id,
            name: c.name,
            category: c.category,
            rating: c.rating,
            address: c.address,
        }
    }
}

pub async fn save_pool<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    pool: Vec<Candidate>,
) -> Result<u64, DomainError> {
    let dtos = pool.into_iter().map(CandidateCreate::from).collect();
    Ok(candidates_adapter::insert_pool(conn, session_id, dtos).await?)
}

pub async fn pool<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<Vec<Candidate>, DomainError> {
    let rows = candidates_adapter::find_pool(conn, session_id).await?;
    Ok(rows.into_iter().map(Candidate::from).collect())
}

/// Write the deck for `round_number` unless that round already has one.
pub async fn save_deck<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    round_number: i32,
    candidate_ids: &[CandidateId],
) -> Result<u64, DomainError> {
    Ok(decks_adapter::insert_deck_if_absent(conn, session_id, round_number, candidate_ids).await?)
}

/// Candidate ids of one round's deck, in deck order. Empty if undefined.
pub async fn deck<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    round_number: i32,
) -> Result<Vec<CandidateId>, DomainError> {
    let rows = decks_adapter::find_deck(conn, session_id, round_number).await?;
    Ok(rows.into_iter().map(|m| m.candidate_id).collect())
}
