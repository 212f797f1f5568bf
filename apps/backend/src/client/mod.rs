//! Participant-side runtime: drives one participant's reducer against a backend.

pub mod backend;
pub mod check_gate;
pub mod participant;

pub use backend::{LocalBackend, SessionBackend};
pub use check_gate::{CheckGate, CheckKind, CheckTicket};
pub use participant::{ClientError, LocalAction, ParticipantDriver, ParticipantHandle};
