//! Adapters for external dependencies.

pub mod candidates_sea;
pub mod decks_sea;
pub mod matches_sea;
pub mod participants_sea;
pub mod sessions_sea;
pub mod votes_sea;
