//! DTOs for votes_sea adapter.

use crate::entities::session_votes::VoteDirection;

/// DTO for recording one vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteCreate {
    pub session_id: String,
    pub participant_id: String,
    pub candidate_id: String,
    pub round_number: i32,
    pub direction: VoteDirection,
    /// Cast in a voting round through the final-vote path
    pub is_final_vote: bool,
}
