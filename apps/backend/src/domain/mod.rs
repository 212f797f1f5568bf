//! Domain layer: pure consensus logic, no I/O.

pub mod game_state;
pub mod round_eval;
pub mod session_view;
pub mod tally;
pub mod votes;

#[cfg(test)]
mod test_gens;
#[cfg(test)]
mod tests_game_state;
#[cfg(test)]
mod tests_round_eval;

// Re-exports for ergonomics
pub use game_state::{Effect, FinalVote, GameInput, GameState, ReducerContext, Transition};
pub use round_eval::{
    classify_next_action, evaluate_round, finished_participants, AdvancingCandidate, NextAction,
    RoundPolicy, RoundResult,
};
pub use session_view::{MatchView, OwnVote, SessionView};
pub use tally::{break_tie, session_hash, tally_votes, voters_done, TallyOutcome};
pub use votes::{Ballot, CandidateId, ParticipantId, VoteDirection};
