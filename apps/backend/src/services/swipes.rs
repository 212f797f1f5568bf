//! SwipeRecorder: persists one participant's votes.
//!
//! Recording is idempotent on `(participant, candidate, round)`: a replay
//! gets the stored vote back and nothing new is written.

use std::sync::Arc;

use sea_orm::ConnectionTrait;
use tracing::{debug, info};

use crate::domain::{CandidateId, VoteDirection};
use crate::entities::sessions::SessionStatus;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::repos::votes::{self, Vote};
use crate::repos::{candidates, participants, sessions};
use crate::services::access::{require_accepting_votes, require_current_round, require_member};
use crate::sync::{SyncEvent, SyncHub};

/// A vote as stored, plus whether this call wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedVote {
    pub vote: Vote,
    pub created: bool,
}

pub struct SwipeRecorder {
    hub: Arc<SyncHub>,
}

impl SwipeRecorder {
    pub fn new(hub: Arc<SyncHub>) -> Self {
        Self { hub }
    }

    /// Record a swipe on one deck candidate.
    pub async fn record_vote<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        participant_id: &str,
        candidate_id: &str,
        round_number: i32,
        direction: VoteDirection,
    ) -> Result<RecordedVote, DomainError> {
        // A replay is answered before any rule check, so a retry that lands
        // after the round moved on still succeeds.
        if let Some(existing) =
            votes::find(conn, session_id, participant_id, candidate_id, round_number).await?
        {
            debug!(session_id, participant_id, candidate_id, round_number, "vote_replayed");
            return Ok(RecordedVote {
                vote: existing,
                created: false,
            });
        }

        let session = sessions::require_session(conn, session_id).await?;
        require_accepting_votes(&session)?;
        require_current_round(&session, round_number)?;
        if session.status == SessionStatus::Voting {
            return Err(DomainError::validation(
                ValidationKind::VotingRound,
                "The voting round takes final votes, not swipes",
            ));
        }
        if !participants::is_member(conn, session_id, participant_id).await? {
            return Err(DomainError::validation(
                ValidationKind::NotAParticipant,
                format!("{participant_id} is not in session {session_id}"),
            ));
        }
        let deck = candidates::deck(conn, session_id, round_number).await?;
        if !deck.iter().any(|c| c == candidate_id) {
            return Err(DomainError::validation(
                ValidationKind::CandidateNotInDeck,
                format!("{candidate_id} is not in the deck of round {round_number}"),
            ));
        }

        let (vote, created) = votes::record_if_absent(
            conn,
            Vote {
                session_id: session_id.to_string(),
                participant_id: participant_id.to_string(),
                candidate_id: candidate_id.to_string(),
                round_number,
                direction,
            },
        )
        .await?;
        self.announce(&vote, created);
        Ok(RecordedVote { vote, created })
    }

    /// Final vote: accept exactly one finalist. A participant who already
    /// accepted a finalist this round gets that vote back; storage keeps a
    /// single final accept per participant, so racing casts cannot both land.
    pub async fn cast_final_vote<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        participant_id: &str,
        candidate_id: &str,
    ) -> Result<RecordedVote, DomainError> {
        let (round_number, finalists) =
            voting_round(conn, session_id, participant_id).await?;

        if let Some(existing) =
            votes::final_accept(conn, session_id, participant_id, round_number).await?
        {
            debug!(session_id, participant_id, candidate = %existing.candidate_id, "final_vote_replayed");
            return Ok(RecordedVote {
                vote: existing,
                created: false,
            });
        }

        if !finalists.iter().any(|c| c == candidate_id) {
            return Err(DomainError::validation(
                ValidationKind::CandidateNotInDeck,
                format!("{candidate_id} is not a finalist"),
            ));
        }

        let recorded = self
            .write_final(
                conn,
                session_id,
                participant_id,
                candidate_id,
                round_number,
                VoteDirection::Accept,
            )
            .await?;
        if recorded.created {
            info!(session_id, participant_id, candidate_id, round_number, "final_vote_cast");
        } else {
            debug!(session_id, participant_id, stored = %recorded.vote.candidate_id, "final_vote_lost_race");
        }
        Ok(recorded)
    }

    /// Pass on the final vote by rejecting every finalist. No-op for a
    /// participant who already accepted one.
    pub async fn abstain_final_vote<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        participant_id: &str,
    ) -> Result<Vec<Vote>, DomainError> {
        let (round_number, finalists) =
            voting_round(conn, session_id, participant_id).await?;

        if votes::final_accept(conn, session_id, participant_id, round_number)
            .await?
            .is_some()
        {
            debug!(session_id, participant_id, "abstain_after_accept_ignored");
            return votes::for_participant(conn, session_id, participant_id, round_number).await;
        }

        let mut recorded = Vec::with_capacity(finalists.len());
        for candidate_id in &finalists {
            let r = self
                .write_final(
                    conn,
                    session_id,
                    participant_id,
                    candidate_id,
                    round_number,
                    VoteDirection::Reject,
                )
                .await?;
            recorded.push(r.vote);
        }
        info!(session_id, participant_id, round_number, "final_vote_abstained");
        Ok(recorded)
    }

    async fn write_final<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        session_id: &str,
        participant_id: &str,
        candidate_id: &str,
        round_number: i32,
        direction: VoteDirection,
    ) -> Result<RecordedVote, DomainError> {
        let (vote, created) = votes::record_final_if_absent(
            conn,
            Vote {
                session_id: session_id.to_string(),
                participant_id: participant_id.to_string(),
                candidate_id: candidate_id.to_string(),
                round_number,
                direction,
            },
        )
        .await?;
        self.announce(&vote, created);
        Ok(RecordedVote { vote, created })
    }

    fn announce(&self, vote: &Vote, created: bool) {
        if !created {
            return;
        }
        debug!(
            session_id = %vote.session_id,
            participant_id = %vote.participant_id,
            candidate_id = %vote.candidate_id,
            round_number = vote.round_number,
            direction = ?vote.direction,
            "vote_recorded"
        );
        self.hub.publish(SyncEvent::VoteRecorded {
            session_id: vote.session_id.clone(),
            round_number: vote.round_number,
        });
    }
}

/// Check the session is in its voting round and return (round, finalists).
async fn voting_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
    participant_id: &str,
) -> Result<(i32, Vec<CandidateId>), DomainError> {
    let session = require_member(conn, session_id, participant_id).await?;
    require_accepting_votes(&session)?;
    if session.status != SessionStatus::Voting {
        return Err(DomainError::validation(
            ValidationKind::NotVoting,
            format!("Session {session_id} is not in a voting round"),
        ));
    }
    let finalists = candidates::deck(conn, session_id, session.current_round).await?;
    Ok((session.current_round, finalists))
}
