//! Repository functions for the domain layer.

pub mod candidates;
pub mod matches;
pub mod participants;
pub mod sessions;
pub mod votes;
