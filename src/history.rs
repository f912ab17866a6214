//! ═══════════════════════════════════════════════════════════════════════════════
//! HISTORY — Bounded Rolling Window of Observed Rounds
//! ═══════════════════════════════════════════════════════════════════════════════
//! Newest-first, capacity-bounded, refreshed wholesale from the feed each
//! cycle. Invariants: no duplicate round ids, strictly decreasing ids from
//! index 0. The window is the only input most detectors see.
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::event::{Event, Outcome};

pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// Read-only ordered view over the most recent rounds, newest first
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    events: Vec<Event>,
    capacity: usize,
}

impl HistoryWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Vec::new(),
            capacity,
        }
    }

    /// Replace the window contents with a fresh newest-first snapshot.
    ///
    /// Incoming data is sanitized: entries whose round id does not strictly
    /// decrease are dropped, and the result is truncated to capacity. An empty
    /// input leaves the previous window untouched (feed-failure fallback).
    pub fn refresh(&mut self, incoming: Vec<Event>) {
        if incoming.is_empty() {
            return;
        }

        let mut cleaned: Vec<Event> = Vec::with_capacity(incoming.len().min(self.capacity));
        let mut last_round: Option<u64> = None;
        for event in incoming {
            if let Some(prev) = last_round {
                if event.round >= prev {
                    continue;
                }
            }
            last_round = Some(event.round);
            cleaned.push(event);
            if cleaned.len() == self.capacity {
                break;
            }
        }

        self.events = cleaned;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Most recent round, if any
    pub fn newest(&self) -> Option<&Event> {
        self.events.first()
    }

    /// Event at newest-first index
    pub fn get(&self, idx: usize) -> Option<&Event> {
        self.events.get(idx)
    }

    /// Outcome at newest-first index
    pub fn outcome(&self, idx: usize) -> Option<Outcome> {
        self.events.get(idx).map(|e| e.outcome)
    }

    /// Full newest-first slice
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The newest `n` rounds (fewer if the window is shorter)
    pub fn recent(&self, n: usize) -> &[Event] {
        &self.events[..n.min(self.events.len())]
    }
}
