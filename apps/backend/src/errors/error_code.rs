//! Error codes for the huddle backend API.
//!
//! Every code that can appear in a problem-details response lives here;
//! never pass ad-hoc strings as error codes. Codes are SCREAMING_SNAKE_CASE
//! and map 1:1 to the strings in HTTP responses.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Identity & privileges
    /// Request carried no participant identity
    MissingParticipant,
    /// Caller is not in the session roster
    NotAParticipant,
    /// Operation is reserved for the session host
    NotHost,

    // Request validation
    InvalidSessionId,
    InvalidHeader,
    ValidationError,
    BadRequest,
    /// Vote or check addressed a round that is not the current one
    RoundMismatch,
    /// Advance requested before the round reached quorum
    RoundNotComplete,
    CandidateNotInDeck,
    SessionNotStarted,
    /// Final vote outside the voting round
    NotVoting,
    /// Swipe or advance attempted in the voting round
    VotingRound,
    EmptyCandidatePool,

    // Resource not found
    SessionNotFound,
    CandidateNotFound,
    DeckNotFound,
    ParticipantNotFound,
    NotFound,

    // Conflicts
    SessionFull,
    SessionEnded,
    JoinCodeConflict,
    UniqueViolation,
    Conflict,

    // System errors
    DbError,
    DbUnavailable,
    DbTimeout,
    DataCorruption,
    Internal,
    ConfigError,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingParticipant => "MISSING_PARTICIPANT",
            Self::NotAParticipant => "NOT_A_PARTICIPANT",
            Self::NotHost => "NOT_HOST",

            Self::InvalidSessionId => "INVALID_SESSION_ID",
            Self::InvalidHeader => "INVALID_HEADER",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::RoundMismatch => "ROUND_MISMATCH",
            Self::RoundNotComplete => "ROUND_NOT_COMPLETE",
            Self::CandidateNotInDeck => "CANDIDATE_NOT_IN_DECK",
            Self::SessionNotStarted => "SESSION_NOT_STARTED",
            Self::NotVoting => "NOT_VOTING",
            Self::VotingRound => "VOTING_ROUND",
            Self::EmptyCandidatePool => "EMPTY_CANDIDATE_POOL",

            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::CandidateNotFound => "CANDIDATE_NOT_FOUND",
            Self::DeckNotFound => "DECK_NOT_FOUND",
            Self::ParticipantNotFound => "PARTICIPANT_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::SessionFull => "SESSION_FULL",
            Self::SessionEnded => "SESSION_ENDED",
            Self::JoinCodeConflict => "JOIN_CODE_CONFLICT",
            Self::UniqueViolation => "UNIQUE_VIOLATION",
            Self::Conflict => "CONFLICT",

            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DbTimeout => "DB_TIMEOUT",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
