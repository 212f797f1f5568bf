//! Shared helpers for the huddle backend test suites.

pub mod logging;
pub mod problem_details;
pub mod unique_helpers;
