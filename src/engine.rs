//! ═══════════════════════════════════════════════════════════════════════════════
//! ENGINE — Cycle Owner and Query Surface
//! ═══════════════════════════════════════════════════════════════════════════════
//! Owns all mutable core state (window, ledger, learning table, anomaly
//! counters) and runs one cycle to completion:
//!
//!   refresh → resolve → detect → ensemble → break score → issue
//!
//! Single logical writer, no locking inside; the serving layer wraps the
//! engine and publishes consistent snapshots between cycles.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use crate::anomaly::{self, AnomalyState, BreakAssessment};
use crate::detectors::{DetectorContext, DetectorId, Panel};
use crate::ensemble;
use crate::event::{Event, Outcome};
use crate::history::{HistoryWindow, DEFAULT_HISTORY_CAPACITY};
use crate::learning::{LearningRecord, LearningTable};
use crate::ledger::{
    PredictionEntry, PredictionLedger, Resolution, ResolvedOutcome, DEFAULT_LEDGER_CAPACITY,
};

/// Engine sizing and persistence cadence
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub history_capacity: usize,
    pub ledger_capacity: usize,
    /// Mark the learning table dirty every N resolved attempts per detector
    pub save_every: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            ledger_capacity: DEFAULT_LEDGER_CAPACITY,
            save_every: 5,
        }
    }
}

/// What a single cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    /// No history at all - insufficient data, not an error
    NoData,
    /// Newest round already handled; nothing issued (idempotent no-op)
    NoNewRound,
    /// A new round arrived but no detector fired
    NoPattern,
    /// A new prediction was issued
    Issued,
}

/// Outcome of one cycle, for the caller's logging
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub status: CycleStatus,
    pub resolved: Option<ResolvedOutcome>,
}

/// Aggregate accuracy figures for the query surface
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub latest_round: Option<u64>,
    pub last20_big: usize,
    pub last20_small: usize,
    pub total_resolved: usize,
    pub correct: usize,
    pub wrong: usize,
    pub accuracy: Option<f64>,
    pub per_detector: Vec<DetectorStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectorStats {
    pub detector: DetectorId,
    pub total: u32,
    pub correct: u32,
    pub accuracy: f64,
}

/// The prediction core. All state is owned here; cycles are synchronous.
pub struct Engine {
    panel: Panel,
    history: HistoryWindow,
    ledger: PredictionLedger,
    learning: LearningTable,
    anomaly: AnomalyState,
    last_break: BreakAssessment,
    last_issued_for: Option<u64>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_learning(config, HashMap::new())
    }

    /// Build with a persisted learning snapshot; missing detectors start from
    /// the zero record.
    pub fn with_learning(
        config: EngineConfig,
        records: HashMap<DetectorId, LearningRecord>,
    ) -> Self {
        Self {
            panel: Panel::standard(),
            history: HistoryWindow::new(config.history_capacity),
            ledger: PredictionLedger::new(config.ledger_capacity),
            learning: LearningTable::from_records(records, config.save_every),
            anomaly: AnomalyState::default(),
            last_break: BreakAssessment::default(),
            last_issued_for: None,
        }
    }

    /// Run one full cycle over a fresh newest-first feed snapshot. An empty
    /// snapshot (feed failure) leaves the previous window in place.
    pub fn cycle(&mut self, feed: Vec<Event>) -> CycleReport {
        self.history.refresh(feed);

        let newest = match self.history.newest() {
            Some(event) => event.clone(),
            None => {
                return CycleReport {
                    status: CycleStatus::NoData,
                    resolved: None,
                }
            }
        };

        // Resolve the pending prediction for this round, if one exists, and
        // feed the outcome back into learning and the anomaly counter
        let resolved = self.ledger.resolve_against(&newest);
        if let Some(r) = resolved {
            self.learning.record_outcome(r.detector, r.correct);
            self.anomaly.record_resolution(r.correct);
        }

        // Repeated polling before a new round arrives must not create
        // duplicate entries or re-run detection
        if self.last_issued_for == Some(newest.round) {
            return CycleReport {
                status: CycleStatus::NoNewRound,
                resolved,
            };
        }

        let ctx = DetectorContext {
            history: &self.history,
            ledger: &self.ledger,
        };
        let votes = self.panel.run(&ctx, &self.learning);
        let house = votes
            .iter()
            .find(|v| v.detector == DetectorId::HouseIntervention)
            .cloned();
        let final_prediction = ensemble::resolve(votes);

        let assessment = anomaly::assess(&self.history, &self.ledger, self.anomaly.consecutive_wrong);
        self.anomaly.remember(&assessment);
        self.last_break = assessment.clone();

        let Some(prediction) = final_prediction else {
            return CycleReport {
                status: CycleStatus::NoPattern,
                resolved,
            };
        };

        self.ledger.issue(PredictionEntry {
            target_round: newest.round + 1,
            outcome: prediction.outcome,
            confidence: prediction.confidence,
            detector: prediction.detector,
            rationale: prediction.rationale,
            top_votes: prediction.top_votes,
            break_snapshot: assessment,
            house_snapshot: house,
            issued_at: Utc::now(),
            observed: None,
            resolution: Resolution::Pending,
        });
        self.last_issued_for = Some(newest.round);

        CycleReport {
            status: CycleStatus::Issued,
            resolved,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // QUERY SURFACE (read-only snapshots for the serving layer)
    // ═══════════════════════════════════════════════════════════════════════

    /// The most recently issued prediction, resolved or not
    pub fn current_prediction(&self) -> Option<&PredictionEntry> {
        self.ledger.current()
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    pub fn ledger(&self) -> &PredictionLedger {
        &self.ledger
    }

    pub fn learning(&self) -> &LearningTable {
        &self.learning
    }

    pub fn anomaly_state(&self) -> &AnomalyState {
        &self.anomaly
    }

    /// Break assessment from the last completed cycle
    pub fn break_assessment(&self) -> &BreakAssessment {
        &self.last_break
    }

    /// True when the learning table wants a snapshot written; clears the flag
    pub fn take_learning_dirty(&mut self) -> bool {
        self.learning.take_dirty()
    }

    pub fn stats(&self) -> StatsReport {
        let last20 = self.history.recent(20);
        let last20_big = last20.iter().filter(|e| e.outcome == Outcome::Big).count();
        let last20_small = last20.len() - last20_big;

        let total_resolved = self.ledger.resolved_count();
        let correct = self.ledger.correct_count();

        let per_detector = self
            .ledger
            .per_detector()
            .into_iter()
            .map(|(detector, total, correct)| DetectorStats {
                detector,
                total,
                correct,
                accuracy: correct as f64 / total as f64,
            })
            .collect();

        StatsReport {
            latest_round: self.history.newest().map(|e| e.round),
            last20_big,
            last20_small,
            total_resolved,
            correct,
            wrong: total_resolved - correct,
            accuracy: self.ledger.accuracy(),
            per_detector,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Newest-first feed ending (oldest side) in alternation, led by a streak
    /// long enough to make the streak detector fire
    fn streak_feed(newest_round: u64, run: usize) -> Vec<Event> {
        let mut events = Vec::new();
        let mut round = newest_round;
        for _ in 0..run {
            events.push(Event::new(round, Outcome::Big, [5, 5, 4]));
            round -= 1;
        }
        let mut outcome = Outcome::Small;
        while round > 0 && events.len() < 30 {
            events.push(Event::new(round, outcome, [3, 4, 4]));
            outcome = outcome.flip();
            round -= 1;
        }
        events
    }

    #[test]
    fn test_empty_feed_no_data() {
        let mut engine = Engine::new(EngineConfig::default());
        let report = engine.cycle(Vec::new());
        assert_eq!(report.status, CycleStatus::NoData);
        assert!(engine.current_prediction().is_none());
    }

    #[test]
    fn test_issue_and_idempotence() {
        let mut engine = Engine::new(EngineConfig::default());
        let feed = streak_feed(50, 4);

        let report = engine.cycle(feed.clone());
        assert_eq!(report.status, CycleStatus::Issued);
        let entry = engine.current_prediction().expect("entry issued");
        assert_eq!(entry.target_round, 51);
        assert_eq!(entry.resolution, Resolution::Pending);

        // Same feed again: no new entry, no learning mutation
        let attempts_before = engine.learning().total_attempts();
        let report = engine.cycle(feed);
        assert_eq!(report.status, CycleStatus::NoNewRound);
        assert_eq!(engine.ledger().len(), 1);
        assert_eq!(engine.learning().total_attempts(), attempts_before);
    }

    #[test]
    fn test_resolution_feeds_learning_and_anomaly() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.cycle(streak_feed(50, 4));
        let predicted = engine.current_prediction().unwrap().outcome;
        let winning = engine.current_prediction().unwrap().detector;

        // Round 51 arrives and contradicts the prediction
        let mut feed = streak_feed(50, 4);
        feed.insert(0, Event::new(51, predicted.flip(), [2, 3, 3]));
        let report = engine.cycle(feed);

        let resolved = report.resolved.expect("round 51 resolves the entry");
        assert!(!resolved.correct);
        assert_eq!(resolved.detector, winning);
        assert_eq!(engine.learning().record(winning).unwrap().attempts, 1);
        assert_eq!(engine.anomaly_state().consecutive_wrong, 1);

        // The resolved entry is terminal
        let entry = engine
            .ledger()
            .entries()
            .find(|e| e.target_round == 51)
            .unwrap();
        assert_eq!(entry.resolution, Resolution::Incorrect);
    }

    #[test]
    fn test_feed_failure_falls_back_to_cached_window() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.cycle(streak_feed(50, 4));
        assert_eq!(engine.history().newest().unwrap().round, 50);

        // Empty snapshot: window survives, cycle is a no-op on the ledger
        let report = engine.cycle(Vec::new());
        assert_eq!(report.status, CycleStatus::NoNewRound);
        assert_eq!(engine.history().newest().unwrap().round, 50);
        assert_eq!(engine.ledger().len(), 1);
    }

    #[test]
    fn test_stats_report() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.cycle(streak_feed(50, 4));
        let predicted = engine.current_prediction().unwrap().outcome;

        let mut feed = streak_feed(50, 4);
        feed.insert(0, Event::new(51, predicted, [5, 5, 5]));
        engine.cycle(feed);

        let stats = engine.stats();
        assert_eq!(stats.latest_round, Some(51));
        assert_eq!(stats.total_resolved, 1);
        assert_eq!(stats.correct, 1);
        assert_eq!(stats.accuracy, Some(1.0));
        assert_eq!(stats.per_detector.len(), 1);
    }
}
