//! Tunables for the consensus engine and the participant driver.

use std::env;
use std::time::Duration;

use crate::domain::RoundPolicy;
use crate::error::AppError;

/// Engine settings. Defaults match the product rules; every field can be
/// overridden from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Largest advancing set that goes straight to a final vote; anything
    /// larger plays another round (`HUDDLE_MAX_VOTE_FINALISTS`).
    pub max_vote_finalists: usize,
    /// Roster cap including the host (`HUDDLE_MAX_PARTICIPANTS`).
    pub max_participants: usize,
    /// Window in which completion-check triggers collapse into one request
    /// (`HUDDLE_CHECK_DEBOUNCE_MS`).
    pub check_debounce: Duration,
    /// Fallback re-check cadence while waiting on others (`HUDDLE_POLL_INTERVAL_MS`).
    pub poll_interval: Duration,
}

pub const DEFAULT_MAX_VOTE_FINALISTS: usize = 2;
pub const DEFAULT_MAX_PARTICIPANTS: usize = 10;
pub const DEFAULT_CHECK_DEBOUNCE_MS: u64 = 250;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_vote_finalists: DEFAULT_MAX_VOTE_FINALISTS,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            check_debounce: Duration::from_millis(DEFAULT_CHECK_DEBOUNCE_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        let config = Self {
            max_vote_finalists: parse_var(
                "HUDDLE_MAX_VOTE_FINALISTS",
                defaults.max_vote_finalists,
            )?,
            max_participants: parse_var("HUDDLE_MAX_PARTICIPANTS", defaults.max_participants)?,
            check_debounce: Duration::from_millis(parse_var(
                "HUDDLE_CHECK_DEBOUNCE_MS",
                DEFAULT_CHECK_DEBOUNCE_MS,
            )?),
            poll_interval: Duration::from_millis(parse_var(
                "HUDDLE_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_vote_finalists == 0 {
            return Err(AppError::config("max_vote_finalists must be at least 1"));
        }
        if self.max_participants == 0 {
            return Err(AppError::config("max_participants must be at least 1"));
        }
        if self.poll_interval.is_zero() {
            return Err(AppError::config("poll_interval must be positive"));
        }
        Ok(())
    }

    /// Evaluation thresholds derived from this config.
    pub fn round_policy(&self) -> RoundPolicy {
        RoundPolicy {
            max_vote_finalists: self.max_vote_finalists,
        }
    }

    pub fn with_max_vote_finalists(mut self, n: usize) -> Self {
        self.max_vote_finalists = n;
        self
    }

    pub fn with_max_participants(mut self, n: usize) -> Self {
        self.max_participants = n;
        self
    }

    pub fn with_check_debounce(mut self, d: Duration) -> Self {
        self.check_debounce = d;
        self
    }

    pub fn with_poll_interval(mut self, d: Duration) -> Self {
        self.poll_interval = d;
        self
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{name} is not a valid number: '{raw}'"))),
    }
}
