//! Final-vote tally with a deterministic tie-break.
//!
//! Every participant can run the tally and must reach the same answer
//! without talking to the others. Ties are settled by a hash of the session
//! id, never by randomness.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::votes::{dedup_ordered, Ballot, CandidateId, ParticipantId, VoteDirection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TallyOutcome {
    /// Not everyone has voted yet
    Pending { voted: u32, participant_count: u32 },
    Winner {
        candidate_id: CandidateId,
        accept_votes: u32,
        /// More than one finalist shared the top count
        tie_broken: bool,
    },
    /// Nobody accepted any finalist
    NoAgreement,
}

impl TallyOutcome {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, TallyOutcome::Pending { .. })
    }
}

/// Sum of the session id's character codes.
pub fn session_hash(session_id: &str) -> u64 {
    session_id.chars().map(|c| u64::from(u32::from(c))).sum()
}

/// Pick one of `winners`: sort by candidate id ascending, then index with
/// `session_hash % len`. Returns `None` for an empty set.
pub fn break_tie(session_id: &str, winners: &[CandidateId]) -> Option<CandidateId> {
    let mut sorted = dedup_ordered(winners);
    if sorted.is_empty() {
        return None;
    }
    sorted.sort();
    let index = (session_hash(session_id) % sorted.len() as u64) as usize;
    sorted.into_iter().nth(index)
}

/// Participants who are done with the final vote: they accepted a finalist,
/// or they rejected every finalist.
pub fn voters_done(
    finalists: &[CandidateId],
    roster: &[ParticipantId],
    ballots: &[Ballot],
) -> u32 {
    let finalists = dedup_ordered(finalists);
    let finalist_set: HashSet<&str> = finalists.iter().map(String::as_str).collect();

    dedup_ordered(roster)
        .iter()
        .filter(|p| {
            let mine = ballots.iter().filter(|b| {
                b.participant_id == **p && finalist_set.contains(b.candidate_id.as_str())
            });
            let mut rejected: HashSet<&str> = HashSet::new();
            for ballot in mine {
                match ballot.direction {
                    VoteDirection::Accept => return true,
                    VoteDirection::Reject => {
                        rejected.insert(ballot.candidate_id.as_str());
                    }
                }
            }
            !finalist_set.is_empty() && rejected.len() == finalist_set.len()
        })
        .count() as u32
}

/// Count accepts per finalist and pick the winner.
///
/// Each participant backs at most one finalist: their earliest accept in
/// `ballots` order. Later accepts from the same participant are ignored.
pub fn tally_votes(
    session_id: &str,
    finalists: &[CandidateId],
    ballots: &[Ballot],
) -> TallyOutcome {
    let finalists = dedup_ordered(finalists);

    // BTreeMap keeps candidate ids ascending, which the tie-break relies on.
    let mut accepts: BTreeMap<&str, HashSet<&str>> = finalists
        .iter()
        .map(|c| (c.as_str(), HashSet::new()))
        .collect();
    let mut counted: HashSet<&str> = HashSet::new();
    for ballot in ballots.iter().filter(|b| b.is_accept()) {
        let Some(voters) = accepts.get_mut(ballot.candidate_id.as_str()) else {
            continue;
        };
        if counted.insert(ballot.participant_id.as_str()) {
            voters.insert(ballot.participant_id.as_str());
        }
    }

    let max_votes = accepts.values().map(HashSet::len).max().unwrap_or(0);
    if max_votes == 0 {
        return TallyOutcome::NoAgreement;
    }

    let winners: Vec<CandidateId> = accepts
        .iter()
        .filter(|(_, voters)| voters.len() == max_votes)
        .map(|(c, _)| c.to_string())
        .collect();

    let tie_broken = winners.len() > 1;
    match break_tie(session_id, &winners) {
        Some(candidate_id) => TallyOutcome::Winner {
            candidate_id,
            accept_votes: max_votes as u32,
            tie_broken,
        },
        None => TallyOutcome::NoAgreement,
    }
}
