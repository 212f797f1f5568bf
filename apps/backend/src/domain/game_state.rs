//! Per-participant game state machine.
//!
//! `reduce` is the only way the state changes. It never performs I/O: it
//! returns the next state plus the effects the caller must run (record a
//! vote, schedule a completion check, advance the round...). Inbound data is
//! treated as a cue and the authoritative snapshot decides what round we
//! are in.

use serde::{Deserialize, Serialize};

use crate::domain::round_eval::{AdvancingCandidate, NextAction, RoundResult};
use crate::domain::session_view::SessionView;
use crate::domain::tally::TallyOutcome;
use crate::domain::votes::{CandidateId, VoteDirection};
use crate::entities::sessions::SessionStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "candidate_id", rename_all = "snake_case")]
pub enum FinalVote {
    Accepted(CandidateId),
    Abstained,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GameState {
    Swiping {
        round: i32,
        deck: Vec<CandidateId>,
        position: usize,
    },
    WaitingForQuorum {
        round: i32,
        deck: Vec<CandidateId>,
    },
    RoundSummary {
        round: i32,
        unanimous: Vec<CandidateId>,
        advancing: Vec<AdvancingCandidate>,
        next_action: NextAction,
        /// Completed through the host's forced check
        forced: bool,
    },
    Voting {
        round: i32,
        candidates: Vec<CandidateId>,
        voted: Option<FinalVote>,
    },
    Ended {
        winner: Option<CandidateId>,
    },
}

/// Everything that can happen to a participant.
#[derive(Debug, Clone, PartialEq)]
pub enum GameInput {
    /// Local swipe on the current card
    Swipe(VoteDirection),
    /// Local final vote for one finalist
    CastFinalVote(CandidateId),
    /// Local final-vote pass: reject every finalist
    Abstain,
    /// Local "continue" from the round summary
    Proceed,
    /// Host asks for a completion check against present votes
    ForceAdvance,
    /// A completion check answered
    RoundEvaluated { result: RoundResult, forced: bool },
    /// A vote this participant sent was refused by the store
    VoteRejected { round: i32, candidate_id: CandidateId },
    /// Fresh authoritative snapshot
    SnapshotObserved(SessionView),
    /// A tally answered
    TallyResolved(TallyOutcome),
}

/// Work the caller performs after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RecordVote {
        round: i32,
        candidate_id: CandidateId,
        direction: VoteDirection,
    },
    /// Schedule a (debounced) completion check
    CheckCompletion { round: i32, deck: Vec<CandidateId> },
    /// Host only: immediate forced completion check
    ForceCheck { round: i32 },
    /// Host only
    AdvanceRound { from_round: i32, forced: bool },
    CastFinalVote { round: i32, candidate_id: CandidateId },
    Abstain { round: i32 },
    /// Schedule a (debounced) tally
    RequestTally { round: i32 },
    /// Host only
    EndSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReducerContext {
    pub is_host: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: GameState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: &GameState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }

    fn to(state: GameState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

impl GameState {
    /// Placeholder before the first snapshot: round 0 sorts before every real round.
    fn bootstrap() -> Self {
        GameState::Swiping {
            round: 0,
            deck: Vec::new(),
            position: 0,
        }
    }

    /// Build the starting state from a snapshot, resuming mid-deck if needed.
    pub fn initial(view: SessionView, ctx: &ReducerContext) -> Transition {
        reduce(&Self::bootstrap(), ctx, GameInput::SnapshotObserved(view))
    }

    pub fn round(&self) -> Option<i32> {
        match self {
            GameState::Swiping { round, .. }
            | GameState::WaitingForQuorum { round, .. }
            | GameState::RoundSummary { round, .. }
            | GameState::Voting { round, .. } => Some(*round),
            GameState::Ended { .. } => None,
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, GameState::Ended { .. })
    }

    /// Candidate under the local participant's thumb, if swiping.
    pub fn current_card(&self) -> Option<&CandidateId> {
        match self {
            GameState::Swiping { deck, position, .. } => deck.get(*position),
            _ => None,
        }
    }
}

fn end(ctx: &ReducerContext, winner: Option<CandidateId>, session_closed: bool) -> Transition {
    let effects = if ctx.is_host && !session_closed {
        vec![Effect::EndSession]
    } else {
        Vec::new()
    };
    Transition::to(GameState::Ended { winner }, effects)
}

/// Enter swiping for `round`, skipping cards already voted on.
fn enter_round(view: &SessionView) -> Transition {
    let round = view.current_round;
    let deck = view.deck.clone();
    let position = view.resume_position();

    if position >= deck.len() {
        Transition::to(
            GameState::WaitingForQuorum {
                round,
                deck: deck.clone(),
            },
            vec![Effect::CheckCompletion { round, deck }],
        )
    } else {
        Transition::to(
            GameState::Swiping {
                round,
                deck,
                position,
            },
            Vec::new(),
        )
    }
}

fn enter_voting(view: &SessionView) -> Transition {
    let round = view.current_round;
    let candidates = view.deck.clone();

    let accepted = view
        .my_votes
        .iter()
        .find(|v| v.direction == VoteDirection::Accept && candidates.contains(&v.candidate_id));
    let rejected_all = !candidates.is_empty()
        && candidates.iter().all(|c| {
            view.my_votes
                .iter()
                .any(|v| &v.candidate_id == c && v.direction == VoteDirection::Reject)
        });

    let voted = match accepted {
        Some(v) => Some(FinalVote::Accepted(v.candidate_id.clone())),
        None if rejected_all => Some(FinalVote::Abstained),
        None => None,
    };
    let effects = if voted.is_some() {
        vec![Effect::RequestTally { round }]
    } else {
        Vec::new()
    };

    Transition::to(
        GameState::Voting {
            round,
            candidates,
            voted,
        },
        effects,
    )
}

fn observe_snapshot(state: &GameState, ctx: &ReducerContext, view: SessionView) -> Transition {
    let closed = view.status == SessionStatus::Completed;

    if let Some(winner) = view.final_choice.clone() {
        return end(ctx, Some(winner), closed);
    }
    if closed {
        return end(ctx, None, true);
    }

    let local_round = state.round().unwrap_or(i32::MAX);

    if view.current_round > local_round {
        return match view.status {
            SessionStatus::Voting => enter_voting(&view),
            SessionStatus::Lobby | SessionStatus::Swiping | SessionStatus::Completed => {
                enter_round(&view)
            }
        };
    }

    if view.current_round < local_round {
        // Snapshot older than what we already observed
        return Transition::stay(state);
    }

    // Same round: nothing moved, but it is worth asking again.
    match state {
        GameState::WaitingForQuorum { round, deck } => Transition::to(
            state.clone(),
            vec![Effect::CheckCompletion {
                round: *round,
                deck: deck.clone(),
            }],
        ),
        GameState::Voting {
            round,
            voted: Some(_),
            ..
        } => Transition::to(state.clone(), vec![Effect::RequestTally { round: *round }]),
        _ => Transition::stay(state),
    }
}

fn on_round_evaluated(state: &GameState, result: RoundResult, forced: bool) -> Transition {
    if !result.completed {
        return Transition::stay(state);
    }
    // A completed result without a next action is malformed; treat as not completed.
    let Some(next_action) = result.next_action else {
        return Transition::stay(state);
    };

    match state {
        GameState::Swiping { round, .. } | GameState::WaitingForQuorum { round, .. }
            if *round == result.round_number =>
        {
            Transition::to(
                GameState::RoundSummary {
                    round: *round,
                    unanimous: result.unanimous,
                    advancing: result.advancing,
                    next_action,
                    forced,
                },
                Vec::new(),
            )
        }
        _ => Transition::stay(state),
    }
}

/// Apply one input.
pub fn reduce(state: &GameState, ctx: &ReducerContext, input: GameInput) -> Transition {
    // Ended is terminal.
    if state.is_ended() {
        return Transition::stay(state);
    }

    match input {
        GameInput::Swipe(direction) => match state {
            GameState::Swiping {
                round,
                deck,
                position,
            } if *position < deck.len() => {
                let round = *round;
                let candidate_id = deck[*position].clone();
                let next = position + 1;
                let mut effects = vec![Effect::RecordVote {
                    round,
                    candidate_id,
                    direction,
                }];
                let state = if next == deck.len() {
                    effects.push(Effect::CheckCompletion {
                        round,
                        deck: deck.clone(),
                    });
                    GameState::WaitingForQuorum {
                        round,
                        deck: deck.clone(),
                    }
                } else {
                    GameState::Swiping {
                        round,
                        deck: deck.clone(),
                        position: next,
                    }
                };
                Transition::to(state, effects)
            }
            _ => Transition::stay(state),
        },

        GameInput::VoteRejected {
            round: rejected_round,
            candidate_id,
        } => match state {
            GameState::Swiping { round, deck, .. } | GameState::WaitingForQuorum { round, deck }
                if *round == rejected_round =>
            {
                match deck.iter().position(|c| *c == candidate_id) {
                    Some(position) => Transition::to(
                        GameState::Swiping {
                            round: *round,
                            deck: deck.clone(),
                            position,
                        },
                        Vec::new(),
                    ),
                    None => Transition::stay(state),
                }
            }
            _ => Transition::stay(state),
        },

        GameInput::ForceAdvance => match state {
            GameState::Swiping { round, .. } | GameState::WaitingForQuorum { round, .. }
                if ctx.is_host =>
            {
                Transition::to(state.clone(), vec![Effect::ForceCheck { round: *round }])
            }
            _ => Transition::stay(state),
        },

        GameInput::RoundEvaluated { result, forced } => on_round_evaluated(state, result, forced),

        GameInput::Proceed => match state {
            GameState::RoundSummary {
                next_action: NextAction::End,
                ..
            } => end(ctx, None, false),
            GameState::RoundSummary { round, forced, .. } if ctx.is_host => Transition::to(
                state.clone(),
                vec![Effect::AdvanceRound {
                    from_round: *round,
                    forced: *forced,
                }],
            ),
            // Non-hosts wait for the host's advance to show up in a snapshot.
            _ => Transition::stay(state),
        },

        GameInput::CastFinalVote(candidate_id) => match state {
            GameState::Voting {
                round,
                candidates,
                voted: None,
            } if candidates.contains(&candidate_id) => Transition::to(
                GameState::Voting {
                    round: *round,
                    candidates: candidates.clone(),
                    voted: Some(FinalVote::Accepted(candidate_id.clone())),
                },
                vec![
                    Effect::CastFinalVote {
                        round: *round,
                        candidate_id,
                    },
                    Effect::RequestTally { round: *round },
                ],
            ),
            _ => Transition::stay(state),
        },

        GameInput::Abstain => match state {
            GameState::Voting {
                round,
                candidates,
                voted: None,
            } => Transition::to(
                GameState::Voting {
                    round: *round,
                    candidates: candidates.clone(),
                    voted: Some(FinalVote::Abstained),
                },
                vec![
                    Effect::Abstain { round: *round },
                    Effect::RequestTally { round: *round },
                ],
            ),
            _ => Transition::stay(state),
        },

        GameInput::TallyResolved(outcome) => match outcome {
            TallyOutcome::Winner { candidate_id, .. } => end(ctx, Some(candidate_id), false),
            TallyOutcome::NoAgreement => end(ctx, None, false),
            TallyOutcome::Pending { .. } => Transition::stay(state),
        },

        GameInput::SnapshotObserved(view) => observe_snapshot(state, ctx, view),
    }
}
