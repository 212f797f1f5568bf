pub mod round_decks;
pub mod session_candidates;
pub mod session_matches;
pub mod session_participants;
pub mod session_votes;
pub mod sessions;

pub use round_decks::Entity as RoundDecks;
pub use session_candidates::Entity as SessionCandidates;
pub use session_matches::Entity as SessionMatches;
pub use session_participants::Entity as SessionParticipants;
pub use session_votes::Entity as SessionVotes;
pub use sessions::Entity as Sessions;
