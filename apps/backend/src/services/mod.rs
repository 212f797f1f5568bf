//! Session services: the trust boundary between transport and storage.

pub mod access;
pub mod round_completion;
pub mod sessions;
pub mod swipes;
pub mod tally;

pub use round_completion::RoundCompletionService;
pub use sessions::{AdvanceOutcome, JoinOutcome, SessionCoordinator};
pub use swipes::{RecordedVote, SwipeRecorder};
pub use tally::VoteTallyService;
