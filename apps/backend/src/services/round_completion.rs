//! RoundCompletionEvaluator over persisted votes.
//!
//! Each call reads the deck, roster and ballots, evaluates them with the
//! pure `domain::evaluate_round`, and upserts any unanimous candidates as
//! matches. Nothing is cached between calls; any number of participants may
//! run it at once and they all get the same answer while the rows are
//! written at most once. Every completed evaluation is broadcast so that
//! participants still mid-deck learn about it.

use std::sync::Arc;

use sea_orm::ConnectionTrait;
use tracing::{debug, info};

use crate::domain::{evaluate_round, finished_participants, CandidateId, RoundPolicy, RoundResult};
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::repos::{candidates, matches, participants, votes};
use crate::services::access::{require_host, require_member};
use crate::sync::{SyncEvent, SyncHub};

pub struct RoundCompletionService {
    hub: Arc<SyncHub>,
    policy: RoundPolicy,
}

impl RoundCompletionService {
    pub fn new(hub: Arc<SyncHub>, policy: RoundPolicy) -> Self {
        Self { hub, policy }
    }

    /// Is `round_number` complete?
    ///
    /// `deck_candidate_ids` is the caller's view of the deck. The persisted
    /// deck is authoritative; the caller's ids must all belong to it.
    pub async fn check_round<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        participant_id: &str,
        round_number: i32,
        deck_candidate_ids: &[CandidateId],
    ) -> Result<RoundResult, DomainError> {
        require_member(conn, session_id, participant_id).await?;
        let deck = load_deck(conn, session_id, round_number).await?;

        if let Some(stray) = deck_candidate_ids.iter().find(|c| !deck.contains(c)) {
            return Err(DomainError::validation(
                ValidationKind::CandidateNotInDeck,
                format!("{stray} is not in the deck of round {round_number}"),
            ));
        }

        self.evaluate(conn, session_id, round_number, &deck, false)
            .await
    }

    /// Host-only check that ignores participants who have not finished the
    /// deck. Unanimity is judged against those who have.
    pub async fn force_check_round<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        participant_id: &str,
        round_number: i32,
    ) -> Result<RoundResult, DomainError> {
        require_host(conn, session_id, participant_id).await?;
        let deck = load_deck(conn, session_id, round_number).await?;
        self.evaluate(conn, session_id, round_number, &deck, true)
            .await
    }

    /// Evaluate and persist; no membership checks. Used by the coordinator,
    /// which has already authorized the caller.
    pub(crate) async fn evaluate<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        round_number: i32,
        deck: &[CandidateId],
        forced: bool,
    ) -> Result<RoundResult, DomainError> {
        let roster = participants::roster(conn, session_id).await?;
        let ballots = votes::ballots_for_round(conn, session_id, round_number).await?;

        let roster = if forced {
            finished_participants(deck, &roster, &ballots)
        } else {
            roster
        };

        let result = evaluate_round(round_number, deck, &roster, &ballots, &self.policy);

        if !result.completed {
            debug!(
                session_id,
                round_number,
                forced,
                participant_count = result.participant_count,
                "round_incomplete"
            );
            return Ok(result);
        }

        self.persist_matches(conn, session_id, &result).await?;
        self.hub.publish(SyncEvent::RoundCompleted {
            session_id: session_id.to_string(),
            forced,
            result: result.clone(),
        });

        info!(
            session_id,
            round_number,
            forced,
            participant_count = result.participant_count,
            unanimous = result.unanimous.len(),
            advancing = result.advancing.len(),
            next_action = ?result.next_action,
            "round_complete"
        );
        Ok(result)
    }

    async fn persist_matches<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        result: &RoundResult,
    ) -> Result<(), DomainError> {
        for candidate_id in &result.unanimous {
            let created =
                matches::upsert(conn, session_id, candidate_id, result.round_number).await?;
            if created {
                info!(session_id, candidate_id, round_number = result.round_number, "match_created");
                self.hub.publish(SyncEvent::MatchUpserted {
                    session_id: session_id.to_string(),
                    candidate_id: candidate_id.clone(),
                    is_final_choice: false,
                });
            }
        }
        Ok(())
    }
}

async fn load_deck<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    round_number: i32,
) -> Result<Vec<CandidateId>, DomainError> {
    let deck = candidates::deck(conn, session_id, round_number).await?;
    if deck.is_empty() {
        return Err(DomainError::not_found(
            NotFoundKind::Deck,
            format!("No deck for round {round_number}"),
        ));
    }
    Ok(deck)
}
