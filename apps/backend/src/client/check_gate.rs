//! Coalescing and supersession for completion and tally checks.
//!
//! Correctness never depends on this gate; the checks themselves are
//! idempotent. It only bounds request volume: triggers inside the debounce
//! window collapse into one check, and every check carries a generation so
//! the driver can drop answers that a newer check has replaced.

use std::time::Duration;

use tokio::time::Instant;

use crate::domain::CandidateId;

/// What a check asks the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckKind {
    Completion { round: i32, deck: Vec<CandidateId> },
    Tally { round: i32 },
}

/// Permission to run one check. Answers are only applied while
/// `CheckGate::is_current(ticket.generation)` holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    pub generation: u64,
    pub kind: CheckKind,
}

#[derive(Debug)]
pub struct CheckGate {
    debounce: Duration,
    pending: Option<(CheckKind, Instant)>,
    generation: u64,
}

impl CheckGate {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: None,
            generation: 0,
        }
    }

    /// Ask for a check. The first trigger opens the window; later triggers
    /// inside it replace the request but keep the deadline.
    pub fn trigger(&mut self, kind: CheckKind, now: Instant) -> Instant {
        let deadline = match self.pending.take() {
            Some((_, deadline)) => deadline,
            None => now + self.debounce,
        };
        self.pending = Some((kind, deadline));
        deadline
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Hand out the pending check once its window has closed. Issuing a
    /// ticket supersedes every earlier one.
    pub fn take_due(&mut self, now: Instant) -> Option<CheckTicket> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => {}
            _ => return None,
        }
        let (kind, _) = self.pending.take()?;
        self.generation += 1;
        Some(CheckTicket {
            generation: self.generation,
            kind,
        })
    }

    /// Ticket for a check that must run now (a host's forced check).
    pub fn issue_now(&mut self, kind: CheckKind) -> CheckTicket {
        self.pending = None;
        self.generation += 1;
        CheckTicket {
            generation: self.generation,
            kind,
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Drop anything pending and orphan the outstanding ticket.
    pub fn invalidate(&mut self) {
        self.pending = None;
        self.generation += 1;
    }
}
