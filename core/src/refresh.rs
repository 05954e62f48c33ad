//! Schedule bookkeeping for live refresh.
//!
//! The loop itself does no I/O: the host asks for a ticket on every timer
//! tick, performs the fetch, and hands the result back to [`RefreshLoop::complete`],
//! which decides whether the records may replace what is on screen.

use crate::geo::GeoRecord;
use std::time::Duration;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Active,
}

/// Identifies one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTicket {
    epoch: u64,
    sequence: u64,
}

impl TickTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The loop was stopped after the fetch was issued.
    Stopped,
    /// A later fetch has already been applied.
    Stale,
    /// The fetch produced no records; the current set stays.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickDecision {
    Apply(Vec<GeoRecord>),
    Discard(DiscardReason),
}

/// Idle/Active state machine with per-tick sequence numbers.
#[derive(Debug, Clone)]
pub struct RefreshLoop {
    state: RefreshState,
    interval: Duration,
    epoch: u64,
    next_sequence: u64,
    last_applied: Option<u64>,
}

impl Default for RefreshLoop {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl RefreshLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: RefreshState::Idle,
            interval,
            epoch: 0,
            next_sequence: 0,
            last_applied: None,
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == RefreshState::Active
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Idle → Active. Returns `false` if the loop was already running.
    pub fn start(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        self.state = RefreshState::Active;
        true
    }

    /// Active → Idle. Fetches already in flight will be discarded on completion.
    pub fn stop(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = RefreshState::Idle;
        self.epoch += 1;
        true
    }

    /// Issues a ticket for the next fetch, or `None` while idle.
    pub fn begin_tick(&mut self) -> Option<TickTicket> {
        if !self.is_active() {
            return None;
        }
        Some(self.issue())
    }

    /// Issues a ticket regardless of state, for one-shot loads.
    pub fn begin_one_shot(&mut self) -> TickTicket {
        self.issue()
    }

    fn issue(&mut self) -> TickTicket {
        self.next_sequence += 1;
        TickTicket {
            epoch: self.epoch,
            sequence: self.next_sequence,
        }
    }

    /// Decides what to do with the records fetched for `ticket`.
    pub fn complete(&mut self, ticket: TickTicket, records: Vec<GeoRecord>) -> TickDecision {
        self.settle(ticket, records, true)
    }

    /// Like [`complete`](Self::complete) but ignores the Idle/Active state.
    pub fn complete_one_shot(&mut self, ticket: TickTicket, records: Vec<GeoRecord>) -> TickDecision {
        self.settle(ticket, records, false)
    }

    fn settle(&mut self, ticket: TickTicket, records: Vec<GeoRecord>, scheduled: bool) -> TickDecision {
        if scheduled && (!self.is_active() || ticket.epoch != self.epoch) {
            return TickDecision::Discard(DiscardReason::Stopped);
        }
        if self.last_applied.is_some_and(|last| ticket.sequence <= last) {
            return TickDecision::Discard(DiscardReason::Stale);
        }
        if records.is_empty() {
            return TickDecision::Discard(DiscardReason::Empty);
        }
        self.last_applied = Some(ticket.sequence);
        TickDecision::Apply(records)
    }
}
