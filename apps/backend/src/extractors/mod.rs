pub mod json_body;
pub mod participant;
pub mod session_id;

pub use json_body::JsonBody;
pub use participant::{Participant, PARTICIPANT_HEADER};
pub use session_id::SessionId;
