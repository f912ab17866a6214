//! ═══════════════════════════════════════════════════════════════════════════════
//! LEDGER — Issued Predictions and Their Lifecycle
//! ═══════════════════════════════════════════════════════════════════════════════
//! Ordered list of forecasts, newest first, capacity bounded. Each entry is
//! created Pending for a specific target round and resolved exactly once when
//! that round's event arrives; resolution is terminal. The ledger drives both
//! the learning table and the break estimator.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anomaly::BreakAssessment;
use crate::detectors::{DetectorId, Vote};
use crate::event::{Event, Outcome};

pub const DEFAULT_LEDGER_CAPACITY: usize = 500;

/// Lifecycle state of one prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Pending,
    Correct,
    Incorrect,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Pending)
    }
}

/// The real result stamped onto an entry at resolution time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedResult {
    pub outcome: Outcome,
    pub dice: [Option<u8>; 3],
    pub total: Option<i32>,
}

/// One issued forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionEntry {
    /// The round this entry predicts
    pub target_round: u64,
    pub outcome: Outcome,
    /// Final ensemble confidence, already clamped to [55, 85]
    pub confidence: i32,
    /// Winning detector and its rationale
    pub detector: DetectorId,
    pub rationale: String,
    /// Top-5 adjusted votes at issue time
    pub top_votes: Vec<Vote>,
    /// Break assessment at issue time
    pub break_snapshot: BreakAssessment,
    /// House-intervention vote at issue time, if it fired
    pub house_snapshot: Option<Vote>,
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed: Option<ObservedResult>,
    pub resolution: Resolution,
}

/// Summary handed back to the caller when an entry resolves
#[derive(Debug, Clone, Copy)]
pub struct ResolvedOutcome {
    pub target_round: u64,
    pub detector: DetectorId,
    pub correct: bool,
    pub confidence: i32,
}

/// Bounded most-recent-N list of predictions, newest first
#[derive(Debug, Clone)]
pub struct PredictionLedger {
    entries: VecDeque<PredictionEntry>,
    capacity: usize,
}

impl PredictionLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a freshly issued entry at the front, dropping the oldest on
    /// overflow
    pub fn issue(&mut self, entry: PredictionEntry) {
        self.entries.push_front(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// The most recently issued prediction
    pub fn current(&self) -> Option<&PredictionEntry> {
        self.entries.front()
    }

    /// True when an entry (pending or resolved) already targets this round
    pub fn has_target(&self, round: u64) -> bool {
        self.entries.iter().any(|e| e.target_round == round)
    }

    /// Resolve the pending entry whose target round just arrived. At most one
    /// entry resolves per event; an already-resolved entry is never touched.
    pub fn resolve_against(&mut self, event: &Event) -> Option<ResolvedOutcome> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.target_round == event.round && e.resolution == Resolution::Pending)?;

        let correct = entry.outcome == event.outcome;
        entry.observed = Some(ObservedResult {
            outcome: event.outcome,
            dice: event.dice,
            total: event.total,
        });
        entry.resolution = if correct {
            Resolution::Correct
        } else {
            Resolution::Incorrect
        };

        Some(ResolvedOutcome {
            target_round: entry.target_round,
            detector: entry.detector,
            correct,
            confidence: entry.confidence,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &PredictionEntry> {
        self.entries.iter()
    }

    /// Resolved entries, newest first
    pub fn resolved(&self) -> impl Iterator<Item = &PredictionEntry> {
        self.entries.iter().filter(|e| e.resolution.is_resolved())
    }

    /// The newest `n` resolved entries
    pub fn recent_resolved(&self, n: usize) -> Vec<&PredictionEntry> {
        self.resolved().take(n).collect()
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved().count()
    }

    pub fn correct_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.resolution == Resolution::Correct)
            .count()
    }

    /// Lifetime hit rate over resolved entries, if any exist
    pub fn accuracy(&self) -> Option<f64> {
        let resolved = self.resolved_count();
        if resolved == 0 {
            None
        } else {
            Some(self.correct_count() as f64 / resolved as f64)
        }
    }

    /// (total, correct) resolved counts per winning detector, catalogue order
    pub fn per_detector(&self) -> Vec<(DetectorId, u32, u32)> {
        DetectorId::ALL
            .into_iter()
            .filter_map(|id| {
                let mut total = 0;
                let mut correct = 0;
                for entry in self.resolved().filter(|e| e.detector == id) {
                    total += 1;
                    if entry.resolution == Resolution::Correct {
                        correct += 1;
                    }
                }
                (total > 0).then_some((id, total, correct))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::BreakAssessment;

    pub(crate) fn entry(target: u64, outcome: Outcome, confidence: i32) -> PredictionEntry {
        PredictionEntry {
            target_round: target,
            outcome,
            confidence,
            detector: DetectorId::Streak,
            rationale: "test".to_string(),
            top_votes: Vec::new(),
            break_snapshot: BreakAssessment::default(),
            house_snapshot: None,
            issued_at: Utc::now(),
            observed: None,
            resolution: Resolution::Pending,
        }
    }

    #[test]
    fn test_resolution_matches_outcome() {
        let mut ledger = PredictionLedger::new(10);
        ledger.issue(entry(5, Outcome::Big, 60));

        let event = Event::new(5, Outcome::Big, [5, 5, 4]);
        let resolved = ledger.resolve_against(&event).expect("entry resolves");
        assert!(resolved.correct);
        assert_eq!(resolved.target_round, 5);

        let stored = ledger.current().unwrap();
        assert_eq!(stored.resolution, Resolution::Correct);
        assert_eq!(stored.observed.as_ref().unwrap().total, Some(14));
    }

    #[test]
    fn test_resolution_is_terminal() {
        let mut ledger = PredictionLedger::new(10);
        ledger.issue(entry(5, Outcome::Big, 60));

        let wrong = Event::new(5, Outcome::Small, [2, 2, 3]);
        assert!(ledger.resolve_against(&wrong).is_some());
        assert_eq!(ledger.current().unwrap().resolution, Resolution::Incorrect);

        // A second event for the same round must not flip the state
        let flip = Event::new(5, Outcome::Big, [6, 6, 5]);
        assert!(ledger.resolve_against(&flip).is_none());
        assert_eq!(ledger.current().unwrap().resolution, Resolution::Incorrect);
    }

    #[test]
    fn test_at_most_one_resolution_per_event() {
        let mut ledger = PredictionLedger::new(10);
        ledger.issue(entry(5, Outcome::Big, 60));
        ledger.issue(entry(6, Outcome::Small, 62));

        let event = Event::new(6, Outcome::Small, [1, 2, 3]);
        assert!(ledger.resolve_against(&event).is_some());
        assert_eq!(ledger.resolved_count(), 1);

        // The round-5 entry stays pending; its event never arrived
        let pending: Vec<u64> = ledger
            .entries()
            .filter(|e| e.resolution == Resolution::Pending)
            .map(|e| e.target_round)
            .collect();
        assert_eq!(pending, vec![5]);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut ledger = PredictionLedger::new(3);
        for round in 1..=5 {
            ledger.issue(entry(round, Outcome::Big, 60));
        }
        assert_eq!(ledger.len(), 3);
        let targets: Vec<u64> = ledger.entries().map(|e| e.target_round).collect();
        assert_eq!(targets, vec![5, 4, 3]);
    }

    #[test]
    fn test_accuracy_and_per_detector() {
        let mut ledger = PredictionLedger::new(10);
        ledger.issue(entry(1, Outcome::Big, 60));
        ledger.issue(entry(2, Outcome::Big, 60));
        ledger.resolve_against(&Event::new(1, Outcome::Big, [5, 5, 4]));
        ledger.resolve_against(&Event::new(2, Outcome::Small, [2, 2, 3]));

        assert_eq!(ledger.accuracy(), Some(0.5));
        let stats = ledger.per_detector();
        assert_eq!(stats, vec![(DetectorId::Streak, 2, 1)]);
    }

    #[test]
    fn test_has_target() {
        let mut ledger = PredictionLedger::new(10);
        ledger.issue(entry(7, Outcome::Big, 60));
        assert!(ledger.has_target(7));
        assert!(!ledger.has_target(8));
    }
}
