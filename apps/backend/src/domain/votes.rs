//! Vote primitives shared by the evaluator and the tallier.

pub use crate::entities::session_votes::VoteDirection;

pub type ParticipantId = String;
pub type CandidateId = String;

/// One recorded vote, reduced to what the pure logic needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ballot {
    pub participant_id: ParticipantId,
    pub candidate_id: CandidateId,
    pub direction: VoteDirection,
}

impl Ballot {
    pub fn new(
        participant_id: impl Into<ParticipantId>,
        candidate_id: impl Into<CandidateId>,
        direction: VoteDirection,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            candidate_id: candidate_id.into(),
            direction,
        }
    }

    pub fn accept(participant_id: impl Into<ParticipantId>, candidate_id: impl Into<CandidateId>) -> Self {
        Self::new(participant_id, candidate_id, VoteDirection::Accept)
    }

    pub fn reject(participant_id: impl Into<ParticipantId>, candidate_id: impl Into<CandidateId>) -> Self {
        Self::new(participant_id, candidate_id, VoteDirection::Reject)
    }

    pub fn is_accept(&self) -> bool {
        self.direction == VoteDirection::Accept
    }
}

/// Drop repeated ids, keeping first occurrences in order.
pub(crate) fn dedup_ordered(ids: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
