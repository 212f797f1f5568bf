//! VoteTallier over persisted final votes.

use std::sync::Arc;

use sea_orm::ConnectionTrait;
use tracing::{debug, info, warn};

use crate::domain::{tally_votes, voters_done, Ballot, ParticipantId, TallyOutcome};
use crate::entities::sessions::SessionStatus;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::repos::matches::{self, Finalized};
use crate::repos::{candidates, participants, votes};
use crate::services::access::require_member;
use crate::sync::{SyncEvent, SyncHub};

pub struct VoteTallyService {
    hub: Arc<SyncHub>,
}

impl VoteTallyService {
    pub fn new(hub: Arc<SyncHub>) -> Self {
        Self { hub }
    }

    /// Tally the voting round.
    ///
    /// Returns `Pending` until every participant has voted. A winner is
    /// written as the final choice with set-if-absent semantics; when another
    /// caller already finalized, the stored choice is reported.
    pub async fn tally<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        participant_id: &str,
    ) -> Result<TallyOutcome, DomainError> {
        let session = require_member(conn, session_id, participant_id).await?;

        if let Some(existing) = matches::final_choice(conn, session_id).await? {
            debug!(session_id, candidate_id = %existing.candidate_id, "tally_already_final");
            let (accept_votes, tie_broken) = self
                .recount(conn, session_id, existing.round_number, &existing.candidate_id)
                .await?;
            return Ok(TallyOutcome::Winner {
                candidate_id: existing.candidate_id,
                accept_votes,
                tie_broken,
            });
        }

        if session.status != SessionStatus::Voting {
            return Err(DomainError::validation(
                ValidationKind::NotVoting,
                format!("Session {session_id} is not in a voting round"),
            ));
        }

        let round_number = session.current_round;
        let finalists = candidates::deck(conn, session_id, round_number).await?;
        let roster = participants::roster(conn, session_id).await?;
        let ballots = roster_ballots(conn, session_id, round_number, &roster).await?;

        let participant_count = roster.len() as u32;
        let voted = voters_done(&finalists, &roster, &ballots);
        if participant_count == 0 || voted < participant_count {
            debug!(session_id, voted, participant_count, "tally_pending");
            return Ok(TallyOutcome::Pending {
                voted,
                participant_count,
            });
        }

        let (candidate_id, accept_votes, tie_broken) =
            match tally_votes(session_id, &finalists, &ballots) {
                TallyOutcome::Winner {
                    candidate_id,
                    accept_votes,
                    tie_broken,
                } => (candidate_id, accept_votes, tie_broken),
                other => {
                    info!(session_id, round_number, "tally_no_agreement");
                    return Ok(other);
                }
            };

        match matches::finalize_if_absent(conn, session_id, &candidate_id, round_number).await? {
            Finalized::Set(m) => {
                info!(session_id, candidate_id = %m.candidate_id, accept_votes, tie_broken, "final_choice_set");
                self.hub.publish(SyncEvent::MatchUpserted {
                    session_id: session_id.to_string(),
                    candidate_id: m.candidate_id.clone(),
                    is_final_choice: true,
                });
                Ok(TallyOutcome::Winner {
                    candidate_id: m.candidate_id,
                    accept_votes,
                    tie_broken,
                })
            }
            Finalized::AlreadyFinal(m) => {
                if m.candidate_id != candidate_id {
                    // Every tally runs the same deterministic tie-break, so this
                    // points at a bug rather than a race.
                    warn!(
                        session_id,
                        computed = %candidate_id,
                        stored = %m.candidate_id,
                        "tally_disagrees_with_stored_final_choice"
                    );
                }
                debug!(session_id, candidate_id = %m.candidate_id, "final_choice_already_set");
                Ok(TallyOutcome::Winner {
                    candidate_id: m.candidate_id,
                    accept_votes,
                    tie_broken,
                })
            }
        }
    }

    /// Vote counts behind an already stored final choice, as the tally that
    /// set it saw them.
    async fn recount<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        round_number: i32,
        candidate_id: &str,
    ) -> Result<(u32, bool), DomainError> {
        let finalists = candidates::deck(conn, session_id, round_number).await?;
        let roster = participants::roster(conn, session_id).await?;
        let ballots = roster_ballots(conn, session_id, round_number, &roster).await?;

        match tally_votes(session_id, &finalists, &ballots) {
            TallyOutcome::Winner {
                candidate_id: computed,
                accept_votes,
                tie_broken,
            } if computed == candidate_id => Ok((accept_votes, tie_broken)),
            _ => {
                warn!(session_id, candidate_id, "recount_disagrees_with_stored_final_choice");
                let accepts = ballots
                    .iter()
                    .filter(|b| b.is_accept() && b.candidate_id == candidate_id)
                    .count() as u32;
                Ok((accepts, false))
            }
        }
    }
}

async fn roster_ballots<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    round_number: i32,
    roster: &[ParticipantId],
) -> Result<Vec<Ballot>, DomainError> {
    Ok(votes::ballots_for_round(conn, session_id, round_number)
        .await?
        .into_iter()
        .filter(|b| roster.contains(&b.participant_id))
        .collect())
}
