//! Round completion: quorum, unanimity, advancing set and next action.
//!
//! Everything here is a pure function of (deck, roster, ballots). The result
//! is recomputed on every check and never cached, so any number of clients
//! evaluating the same votes get identical answers.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::votes::{dedup_ordered, Ballot, CandidateId, ParticipantId, VoteDirection};

/// What the session does after a completed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NextAction {
    /// No candidates left to decide on
    End,
    /// Few enough advancing candidates for a final vote
    Vote,
    /// Narrow the advancing set with another round
    NextRound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancingCandidate {
    pub candidate_id: CandidateId,
    #[serde(rename = "like_count")]
    pub accept_count: u32,
}

/// Derived round outcome. Field names on the wire follow the evaluator
/// response contract (`unanimous_matches`, `advancing_places`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_number: i32,
    pub completed: bool,
    pub participant_count: u32,
    #[serde(rename = "unanimous_matches", default)]
    pub unanimous: Vec<CandidateId>,
    #[serde(rename = "advancing_places", default)]
    pub advancing: Vec<AdvancingCandidate>,
    #[serde(default)]
    pub next_action: Option<NextAction>,
}

impl RoundResult {
    /// Quorum not reached: no partial results are reported.
    pub fn incomplete(round_number: i32, participant_count: u32) -> Self {
        Self {
            round_number,
            completed: false,
            participant_count,
            unanimous: Vec::new(),
            advancing: Vec::new(),
            next_action: None,
        }
    }

    pub fn advancing_ids(&self) -> Vec<CandidateId> {
        self.advancing
            .iter()
            .map(|a| a.candidate_id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundPolicy {
    /// Largest advancing set that still goes to a final vote
    pub max_vote_finalists: usize,
}

impl Default for RoundPolicy {
    fn default() -> Self {
        Self {
            max_vote_finalists: crate::config::engine::DEFAULT_MAX_VOTE_FINALISTS,
        }
    }
}

/// Decide the next action from the sizes of the unanimous and advancing sets.
///
/// Order matters: nothing at all means `End`; a small advancing set means
/// `Vote`; a large one means `NextRound`; and only-unanimous means `End`.
pub fn classify_next_action(
    unanimous: usize,
    advancing: usize,
    max_vote_finalists: usize,
) -> NextAction {
    if advancing == 0 && unanimous == 0 {
        NextAction::End
    } else if (1..=max_vote_finalists).contains(&advancing) {
        NextAction::Vote
    } else if advancing > max_vote_finalists {
        NextAction::NextRound
    } else {
        NextAction::End
    }
}

/// Index ballots as participant -> candidate -> direction, restricted to the
/// given roster and deck. The first ballot for a pair wins; the store's
/// unique key means there is only ever one.
fn index_ballots<'a>(
    deck: &HashSet<&'a str>,
    roster: &HashSet<&'a str>,
    ballots: &'a [Ballot],
) -> HashMap<&'a str, HashMap<&'a str, VoteDirection>> {
    let mut by_participant: HashMap<&str, HashMap<&str, VoteDirection>> = HashMap::new();
    for ballot in ballots {
        let (p, c) = (ballot.participant_id.as_str(), ballot.candidate_id.as_str());
        if !roster.contains(p) || !deck.contains(c) {
            continue;
        }
        by_participant
            .entry(p)
            .or_default()
            .entry(c)
            .or_insert(ballot.direction);
    }
    by_participant
}

/// Roster members who have voted on every deck candidate.
pub fn finished_participants(
    deck: &[CandidateId],
    roster: &[ParticipantId],
    ballots: &[Ballot],
) -> Vec<ParticipantId> {
    let deck = dedup_ordered(deck);
    let roster = dedup_ordered(roster);
    if deck.is_empty() {
        return Vec::new();
    }
    let deck_set: HashSet<&str> = deck.iter().map(String::as_str).collect();
    let roster_set: HashSet<&str> = roster.iter().map(String::as_str).collect();
    let indexed = index_ballots(&deck_set, &roster_set, ballots);

    roster
        .iter()
        .filter(|p| {
            indexed
                .get(p.as_str())
                .is_some_and(|votes| votes.len() == deck.len())
        })
        .cloned()
        .collect()
}

/// Evaluate one round.
///
/// `completed` is true iff every roster member has a vote for every deck
/// candidate. An empty deck or roster never completes.
pub fn evaluate_round(
    round_number: i32,
    deck: &[CandidateId],
    roster: &[ParticipantId],
    ballots: &[Ballot],
    policy: &RoundPolicy,
) -> RoundResult {
    let deck = dedup_ordered(deck);
    let roster = dedup_ordered(roster);
    let participant_count = roster.len() as u32;

    if deck.is_empty() || roster.is_empty() {
        return RoundResult::incomplete(round_number, participant_count);
    }

    let deck_set: HashSet<&str> = deck.iter().map(String::as_str).collect();
    let roster_set: HashSet<&str> = roster.iter().map(String::as_str).collect();
    let indexed = index_ballots(&deck_set, &roster_set, ballots);

    let quorum = roster.iter().all(|p| {
        indexed
            .get(p.as_str())
            .is_some_and(|votes| votes.len() == deck.len())
    });
    if !quorum {
        return RoundResult::incomplete(round_number, participant_count);
    }

    let accept_count = |candidate: &str| -> u32 {
        indexed
            .values()
            .filter(|votes| votes.get(candidate) == Some(&VoteDirection::Accept))
            .count() as u32
    };

    let counts: Vec<(CandidateId, u32)> = deck
        .iter()
        .map(|c| (c.clone(), accept_count(c)))
        .collect();

    let unanimous: Vec<CandidateId> = counts
        .iter()
        .filter(|(_, n)| *n == participant_count)
        .map(|(c, _)| c.clone())
        .collect();

    let mut advancing: Vec<AdvancingCandidate> = counts
        .into_iter()
        .filter(|(_, n)| *n > 0 && *n < participant_count)
        .map(|(candidate_id, accept_count)| AdvancingCandidate {
            candidate_id,
            accept_count,
        })
        .collect();
    // Stable: equal counts keep deck order. Cosmetic only.
    advancing.sort_by(|a, b| b.accept_count.cmp(&a.accept_count));

    let next_action =
        classify_next_action(unanimous.len(), advancing.len(), policy.max_vote_finalists);

    RoundResult {
        round_number,
        completed: true,
        participant_count,
        unanimous,
        advancing,
        next_action: Some(next_action),
    }
}
