//! Authoritative session snapshot as seen by one participant.

use serde::{Deserialize, Serialize};

use crate::domain::votes::{CandidateId, ParticipantId, VoteDirection};
use crate::entities::sessions::SessionStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchView {
    pub candidate_id: CandidateId,
    pub round_number: i32,
    pub is_final_choice: bool,
}

/// A vote the viewing participant has cast in the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnVote {
    pub candidate_id: CandidateId,
    pub direction: VoteDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub code: String,
    pub host_id: ParticipantId,
    pub current_round: i32,
    pub status: SessionStatus,
    pub started: bool,
    /// Deck of the current round, in deck order
    pub deck: Vec<CandidateId>,
    pub participant_count: u32,
    pub my_votes: Vec<OwnVote>,
    pub matches: Vec<MatchView>,
    pub final_choice: Option<CandidateId>,
}

impl SessionView {
    pub fn is_host(&self, participant_id: &str) -> bool {
        self.host_id == participant_id
    }

    pub fn has_voted_on(&self, candidate_id: &str) -> bool {
        self.my_votes.iter().any(|v| v.candidate_id == candidate_id)
    }

    /// First deck position without a vote from the viewer.
    pub fn resume_position(&self) -> usize {
        self.deck
            .iter()
            .position(|c| !self.has_voted_on(c))
            .unwrap_or(self.deck.len())
    }
}
