//! SessionCoordinator: roster, host identity, round counter and lifecycle.
//!
//! Privileged writes (start, advance, end) are host-only by convention, and
//! each one is a conditional update, so a duplicated or late request from a
//! confused host changes nothing.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, TransactionTrait};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::db::txn::with_txn;
use crate::domain::{
    CandidateId, MatchView, NextAction, OwnVote, ParticipantId, RoundResult, SessionView,
};
use crate::entities::sessions::SessionStatus;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::repos::candidates::{self, Candidate};
use crate::repos::sessions::{self, Session};
use crate::repos::{matches, participants, votes};
use crate::services::access::{require_host, require_member};
use crate::services::round_completion::RoundCompletionService;
use crate::sync::{SyncEvent, SyncHub};
use crate::utils::join_code::{generate_join_code, normalize_join_code};

const JOIN_CODE_ATTEMPTS: usize = 5;

/// Result of a join: the session, and whether the roster changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub session: Session,
    pub joined: bool,
}

/// Result of a host advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceOutcome {
    pub session: Session,
    /// Evaluation of the round the host advanced from
    pub result: RoundResult,
    /// `false` when the session had already moved past `from_round`
    pub advanced: bool,
}

pub struct SessionCoordinator {
    hub: Arc<SyncHub>,
    engine: EngineConfig,
    completion: RoundCompletionService,
}

impl SessionCoordinator {
    pub fn new(hub: Arc<SyncHub>, engine: EngineConfig) -> Self {
        let completion = RoundCompletionService::new(hub.clone(), engine.round_policy());
        Self {
            hub,
            engine,
            completion,
        }
    }

    /// Create a session hosted by `host_id` with an ordered candidate pool.
    ///
    /// Duplicate candidate ids keep their first occurrence. Round 1's deck is
    /// the whole pool.
    pub async fn create<C>(
        &self,
        conn: &C,
        host_id: &str,
        pool: Vec<Candidate>,
    ) -> Result<Session, DomainError>
    where
        C: ConnectionTrait + TransactionTrait + Send + Sync,
    {
        let pool = dedup_pool(pool);
        if pool.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::EmptyCandidatePool,
                "A session needs at least one candidate",
            ));
        }

        let pool_size = pool.len();
        for attempt in 1..=JOIN_CODE_ATTEMPTS {
            let session_id = uuid::Uuid::new_v4().to_string();
            let code = generate_join_code();
            let host = host_id.to_string();
            let pool = pool.clone();

            let created = with_txn(conn, move |txn| {
                Box::pin(async move {
                    let deck: Vec<CandidateId> =
                        pool.iter().map(|c| c.candidate_id.clone()).collect();
                    let session = sessions::create_session(txn, &session_id, &code, &host).await?;
                    participants::add_if_absent(txn, &session_id, &host).await?;
                    candidates::save_pool(txn, &session_id, pool).await?;
                    candidates::save_deck(txn, &session_id, 1, &deck).await?;
                    Ok::<_, DomainError>(session)
                })
            })
            .await;

            match created {
                Ok(session) => {
                    info!(
                        session_id = %session.id,
                        host_id,
                        candidates = pool_size,
                        "session_created"
                    );
                    return Ok(session);
                }
                Err(DomainError::Conflict(ConflictKind::JoinCodeConflict, _)) => {
                    warn!(attempt, "join_code_collision");
                }
                Err(e) => return Err(e),
            }
        }

        Err(DomainError::conflict(
            ConflictKind::JoinCodeConflict,
            "Could not allocate a unique join code",
        ))
    }

    /// Add `participant_id` to the roster. Joining twice is a no-op.
    pub async fn join<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        participant_id: &str,
    ) -> Result<JoinOutcome, DomainError> {
        let session = sessions::require_session(conn, session_id).await?;

        if participants::is_member(conn, session_id, participant_id).await? {
            debug!(session_id, participant_id, "join_already_member");
            return Ok(JoinOutcome {
                session,
                joined: false,
            });
        }
        if session.is_ended() {
            return Err(DomainError::conflict(
                ConflictKind::SessionEnded,
                format!("Session {session_id} has ended"),
            ));
        }
        let count = participants::count(conn, session_id).await?;
        if count as usize >= self.engine.max_participants {
            return Err(DomainError::conflict(
                ConflictKind::SessionFull,
                format!(
                    "Session {session_id} is full ({} participants)",
                    self.engine.max_participants
                ),
            ));
        }

        let joined = participants::add_if_absent(conn, session_id, participant_id).await?;
        if joined {
            info!(session_id, participant_id, "participant_joined");
            self.hub.publish(SyncEvent::RosterChanged {
                session_id: session_id.to_string(),
                participant_count: count as u32 + 1,
            });
        }
        Ok(JoinOutcome { session, joined })
    }

    pub async fn join_by_code<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        code: &str,
        participant_id: &str,
    ) -> Result<JoinOutcome, DomainError> {
        let code = normalize_join_code(code);
        let session = sessions::find_by_code(conn, &code).await?.ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Session, format!("No session with code {code}"))
        })?;
        self.join(conn, &session.id, participant_id).await
    }

    pub async fn roster<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
    ) -> Result<Vec<ParticipantId>, DomainError> {
        sessions::require_session(conn, session_id).await?;
        participants::roster(conn, session_id).await
    }

    /// Host starts swiping. `started_at` is written once.
    pub async fn start<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        participant_id: &str,
    ) -> Result<Session, DomainError> {
        let session = require_host(conn, session_id, participant_id).await?;
        if session.is_ended() {
            return Err(DomainError::conflict(
                ConflictKind::SessionEnded,
                format!("Session {session_id} has ended"),
            ));
        }

        if sessions::mark_started(conn, session_id).await? {
            info!(session_id, "session_started");
            self.publish_session(conn, session_id).await
        } else {
            debug!(session_id, "session_already_started");
            sessions::require_session(conn, session_id).await
        }
    }

    /// Host moves the session past `from_round` according to that round's
    /// evaluation: another round, the final vote, or the end.
    pub async fn advance_round<C>(
        &self,
        conn: &C,
        session_id: &str,
        participant_id: &str,
        from_round: i32,
        forced: bool,
    ) -> Result<AdvanceOutcome, DomainError>
    where
        C: ConnectionTrait + TransactionTrait + Send + Sync,
    {
        let session = require_host(conn, session_id, participant_id).await?;
        if !session.is_started() {
            return Err(DomainError::validation(
                ValidationKind::SessionNotStarted,
                format!("Session {session_id} has not started"),
            ));
        }
        if from_round > session.current_round {
            return Err(DomainError::validation(
                ValidationKind::RoundMismatch,
                format!(
                    "Cannot advance from round {from_round}; current round is {}",
                    session.current_round
                ),
            ));
        }
        if from_round == session.current_round
            && session.status == SessionStatus::Voting
            && !session.is_ended()
        {
            return Err(DomainError::validation(
                ValidationKind::VotingRound,
                "The voting round ends through the tally",
            ));
        }

        let deck = candidates::deck(conn, session_id, from_round).await?;
        if deck.is_empty() {
            return Err(DomainError::not_found(
                NotFoundKind::Deck,
                format!("No deck for round {from_round}"),
            ));
        }
        let result = self
            .completion
            .evaluate(conn, session_id, from_round, &deck, forced)
            .await?;

        // Already past this round, or already over: absorb the duplicate.
        if from_round < session.current_round || session.is_ended() {
            debug!(session_id, from_round, current_round = session.current_round, "advance_already_applied");
            return Ok(AdvanceOutcome {
                session,
                result,
                advanced: false,
            });
        }

        let next_action = match (result.completed, result.next_action) {
            (true, Some(next_action)) => next_action,
            _ => {
                return Err(DomainError::validation(
                    ValidationKind::RoundNotComplete,
                    format!("Round {from_round} is not complete"),
                ))
            }
        };

        let advanced = match next_action {
            NextAction::End => sessions::mark_ended(conn, session_id).await?,
            NextAction::Vote | NextAction::NextRound => {
                let status = if next_action == NextAction::Vote {
                    SessionStatus::Voting
                } else {
                    SessionStatus::Swiping
                };
                let next_round = from_round + 1;
                let next_deck = result.advancing_ids();
                let sid = session_id.to_string();
                with_txn(conn, move |txn| {
                    Box::pin(async move {
                        candidates::save_deck(txn, &sid, next_round, &next_deck).await?;
                        sessions::advance_round(txn, &sid, next_round, status).await
                    })
                })
                .await?
            }
        };

        let session = if advanced {
            info!(session_id, from_round, forced, ?next_action, "round_advanced");
            self.publish_session(conn, session_id).await?
        } else {
            debug!(session_id, from_round, "advance_lost_race");
            sessions::require_session(conn, session_id).await?
        };

        Ok(AdvanceOutcome {
            session,
            result,
            advanced,
        })
    }

    /// Host closes the session. `ended_at` is written once.
    pub async fn end<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        participant_id: &str,
    ) -> Result<Session, DomainError> {
        require_host(conn, session_id, participant_id).await?;
        if sessions::mark_ended(conn, session_id).await? {
            info!(session_id, "session_ended");
            self.publish_session(conn, session_id).await
        } else {
            debug!(session_id, "session_already_ended");
            sessions::require_session(conn, session_id).await
        }
    }

    /// Authoritative view of the session for one participant.
    pub async fn snapshot<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        participant_id: &str,
    ) -> Result<SessionView, DomainError> {
        let session = require_member(conn, session_id, participant_id).await?;
        let round = session.current_round;

        let deck = candidates::deck(conn, session_id, round).await?;
        let participant_count = participants::count(conn, session_id).await? as u32;
        let my_votes = votes::for_participant(conn, session_id, participant_id, round)
            .await?
            .into_iter()
            .map(|v| OwnVote {
                candidate_id: v.candidate_id,
                direction: v.direction,
            })
            .collect();
        let all_matches = matches::for_session(conn, session_id).await?;
        let final_choice = all_matches
            .iter()
            .find(|m| m.is_final_choice)
            .map(|m| m.candidate_id.clone());

        Ok(SessionView {
            session_id: session.id.clone(),
            code: session.code.clone(),
            host_id: session.host_id.clone(),
            current_round: round,
            status: session.status,
            started: session.is_started(),
            deck,
            participant_count,
            my_votes,
            matches: all_matches.iter().map(MatchView::from).collect(),
            final_choice,
        })
    }

    async fn publish_session<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
    ) -> Result<Session, DomainError> {
        let session = sessions::require_session(conn, session_id).await?;
        self.hub.publish(SyncEvent::SessionUpdated {
            session_id: session.id.clone(),
            current_round: session.current_round,
            status: session.status,
        });
        Ok(session)
    }
}

fn dedup_pool(pool: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = std::collections::HashSet::new();
    pool.into_iter()
        .filter(|c| seen.insert(c.candidate_id.clone()))
        .collect()
}
