//! Change notifications pushed to session subscribers.
//!
//! Events are cues: a receiver re-reads the snapshot instead of applying the
//! payload. `RoundCompleted` is the exception, it carries the evaluated round
//! so participants who have not finished the deck can show the summary.
//! Delivery order across sessions and participants is not guaranteed and
//! duplicates are possible.

use serde::{Deserialize, Serialize};

use crate::domain::RoundResult;
use crate::entities::sessions::SessionStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// Round counter, status, start or end changed
    SessionUpdated {
        session_id: String,
        current_round: i32,
        status: SessionStatus,
    },
    /// A match was created or became the final choice
    MatchUpserted {
        session_id: String,
        candidate_id: String,
        is_final_choice: bool,
    },
    RosterChanged {
        session_id: String,
        participant_count: u32,
    },
    VoteRecorded {
        session_id: String,
        round_number: i32,
    },
    /// An evaluation found the round complete
    RoundCompleted {
        session_id: String,
        forced: bool,
        result: RoundResult,
    },
}

impl SyncEvent {
    pub fn session_id(&self) -> &str {
        match self {
            SyncEvent::SessionUpdated { session_id, .. }
            | SyncEvent::MatchUpserted { session_id, .. }
            | SyncEvent::RosterChanged { session_id, .. }
            | SyncEvent::VoteRecorded { session_id, .. }
            | SyncEvent::RoundCompleted { session_id, .. } => session_id,
        }
    }

    /// A final choice appeared; every client should end.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            SyncEvent::MatchUpserted {
                is_final_choice: true,
                ..
            }
        )
    }
}
