//! ═══════════════════════════════════════════════════════════════════════════════
//! ANOMALY — Break-Probability Estimator
//! ═══════════════════════════════════════════════════════════════════════════════
//! Estimates the probability that the outcome generator has shifted away from
//! recent statistical norms ("break" risk). Additive multi-factor score over
//! the history window and the resolved side of the prediction ledger, mapped
//! to a five-tier advisory. This is a heuristic alarm, not a statistical test.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

use crate::history::HistoryWindow;
use crate::ledger::{PredictionLedger, Resolution};

/// Probability cap reported to callers
const PROBABILITY_CAP: i32 = 98;

/// Score at which the advisory says stop
const STOP_THRESHOLD: i32 = 65;

/// Five-step risk ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Safe,
    LowWarning,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    /// Tier bands over the raw (pre-cap) score
    pub fn from_score(score: i32) -> Self {
        if score >= 65 {
            RiskTier::Critical
        } else if score >= 50 {
            RiskTier::High
        } else if score >= 35 {
            RiskTier::Medium
        } else if score >= 20 {
            RiskTier::LowWarning
        } else {
            RiskTier::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Safe => "safe",
            RiskTier::LowWarning => "low_warning",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        }
    }

    pub fn advisory(&self) -> &'static str {
        match self {
            RiskTier::Critical => "EXTREMELY DANGEROUS - STOP IMMEDIATELY",
            RiskTier::High => "Dangerous - pause play or drop to the minimum stake",
            RiskTier::Medium => "Warning - cut the stake to 50%",
            RiskTier::LowWarning => "Caution - watch closely and play carefully",
            RiskTier::Safe => "Safe - carry on as normal",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One break assessment, snapshotted onto every issued prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakAssessment {
    pub tier: RiskTier,
    /// Capped additive score, 0-98
    pub probability: i32,
    pub signals: Vec<String>,
    pub advisory: String,
    pub should_stop: bool,
}

impl Default for BreakAssessment {
    fn default() -> Self {
        Self {
            tier: RiskTier::Safe,
            probability: 0,
            signals: Vec::new(),
            advisory: RiskTier::Safe.advisory().to_string(),
            should_stop: false,
        }
    }
}

/// Running anomaly counters, mutated by resolution and by each assessment
#[derive(Debug, Clone)]
pub struct AnomalyState {
    /// Straight misses since the last correct resolution
    pub consecutive_wrong: u32,
    pub last_tier: RiskTier,
    pub last_signals: Vec<String>,
}

impl Default for AnomalyState {
    fn default() -> Self {
        Self {
            consecutive_wrong: 0,
            last_tier: RiskTier::Safe,
            last_signals: Vec::new(),
        }
    }
}

impl AnomalyState {
    /// Fold one resolution into the running counter
    pub fn record_resolution(&mut self, correct: bool) {
        if correct {
            self.consecutive_wrong = 0;
        } else {
            self.consecutive_wrong += 1;
        }
    }

    /// Remember the latest assessment for the query surface
    pub fn remember(&mut self, assessment: &BreakAssessment) {
        self.last_tier = assessment.tier;
        self.last_signals = assessment.signals.clone();
    }
}

/// Compute the break assessment for the current cycle. Pure over its inputs;
/// the caller stores the result into [`AnomalyState`].
pub fn assess(
    history: &HistoryWindow,
    ledger: &PredictionLedger,
    consecutive_wrong: u32,
) -> BreakAssessment {
    let mut score = 0;
    let mut signals = Vec::new();

    // Consecutive misses. The two bands stack: a 5-miss run scores 48.
    if consecutive_wrong >= 5 {
        signals.push(format!(
            "{} straight misses - the table is running against us",
            consecutive_wrong
        ));
        score += 30;
    }
    if consecutive_wrong >= 3 {
        score += 18;
    }

    // Rolling accuracy over the last 10 resolved predictions
    let recent10 = ledger.recent_resolved(10);
    if recent10.len() >= 10 {
        let correct = recent10
            .iter()
            .filter(|e| e.resolution == Resolution::Correct)
            .count();
        let accuracy = correct as f64 / 10.0 * 100.0;
        if accuracy < 35.0 {
            signals.push(format!("10-round accuracy {:.0}% - critically low", accuracy));
            score += 25;
        } else if accuracy < 50.0 {
            signals.push(format!("10-round accuracy {:.0}% - below normal", accuracy));
            score += 15;
        }
    }

    // Five identical outcomes in a row
    if history.len() >= 5 {
        let recent5 = history.recent(5);
        if recent5.iter().all(|e| e.outcome == recent5[0].outcome) {
            signals.push("5 identical outcomes in a row - highly unusual".to_string());
            score += 18;
        }
    }

    // 7-of-8 imbalance
    if history.len() >= 8 {
        let big = history
            .recent(8)
            .iter()
            .filter(|e| e.outcome == crate::event::Outcome::Big)
            .count();
        let small = 8 - big;
        if big >= 7 || small >= 7 {
            signals.push("Severe imbalance across the last 8 rounds".to_string());
            score += 12;
        }
    }

    // Extreme totals clustering in the last 15
    if history.len() >= 15 {
        let extremes = history
            .recent(15)
            .iter()
            .filter(|e| e.has_extreme_total())
            .count();
        if extremes >= 4 {
            signals.push(format!("{} extreme totals within 15 rounds", extremes));
            score += 20;
        }
    }

    // High-confidence misses among the last 20 resolved predictions
    let recent20 = ledger.recent_resolved(20);
    if recent20.len() >= 15 {
        let high_conf_wrong = recent20
            .iter()
            .filter(|e| e.confidence >= 75 && e.resolution == Resolution::Incorrect)
            .count();
        if high_conf_wrong >= 5 {
            signals.push(format!(
                "{} high-confidence predictions missed - intervention suspected",
                high_conf_wrong
            ));
            score += 22;
        }
    }

    let tier = RiskTier::from_score(score);
    BreakAssessment {
        tier,
        probability: score.min(PROBABILITY_CAP),
        signals,
        advisory: tier.advisory().to_string(),
        should_stop: score >= STOP_THRESHOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::DetectorId;
    use crate::event::{Event, Outcome};
    use crate::ledger::{PredictionEntry, PredictionLedger, Resolution};
    use chrono::Utc;

    fn pending(target: u64, outcome: Outcome, confidence: i32) -> PredictionEntry {
        PredictionEntry {
            target_round: target,
            outcome,
            confidence,
            detector: DetectorId::Streak,
            rationale: String::new(),
            top_votes: Vec::new(),
            break_snapshot: BreakAssessment::default(),
            house_snapshot: None,
            issued_at: Utc::now(),
            observed: None,
            resolution: Resolution::Pending,
        }
    }

    /// Ledger with `n` resolved entries, `correct` of them hits, at the given
    /// stated confidence
    fn resolved_ledger(n: u64, correct: u64, confidence: i32) -> PredictionLedger {
        let mut ledger = PredictionLedger::new(500);
        for round in 1..=n {
            ledger.issue(pending(round, Outcome::Big, confidence));
            let actual = if round <= correct {
                Outcome::Big
            } else {
                Outcome::Small
            };
            ledger.resolve_against(&Event::new(round, actual, [3, 3, 3]));
        }
        ledger
    }

    fn balanced_history(n: u64) -> HistoryWindow {
        let mut window = HistoryWindow::new(500);
        let events = (1..=n)
            .rev()
            .map(|round| {
                let outcome = if round % 2 == 0 {
                    Outcome::Big
                } else {
                    Outcome::Small
                };
                Event::new(round, outcome, [3, 4, 4])
            })
            .collect();
        window.refresh(events);
        window
    }

    #[test]
    fn test_quiet_table_is_safe() {
        let history = balanced_history(30);
        let ledger = PredictionLedger::new(500);
        let assessment = assess(&history, &ledger, 0);
        assert_eq!(assessment.tier, RiskTier::Safe);
        assert_eq!(assessment.probability, 0);
        assert!(!assessment.should_stop);
        assert!(assessment.signals.is_empty());
    }

    #[test]
    fn test_consecutive_wrong_bands_stack() {
        // 5 straight misses, nothing else firing: 30 + 18 = 48
        let history = balanced_history(30);
        let ledger = PredictionLedger::new(500);
        let assessment = assess(&history, &ledger, 5);
        assert_eq!(assessment.probability, 48);
        assert_eq!(assessment.tier, RiskTier::Medium);
        assert!(!assessment.should_stop);
    }

    #[test]
    fn test_three_wrong_scores_lower_band_only() {
        let history = balanced_history(30);
        let ledger = PredictionLedger::new(500);
        let assessment = assess(&history, &ledger, 3);
        assert_eq!(assessment.probability, 18);
        assert_eq!(assessment.tier, RiskTier::Safe);
    }

    #[test]
    fn test_low_accuracy_bands() {
        let history = balanced_history(30);

        // 3/10 correct → <35% → +25
        let ledger = resolved_ledger(10, 3, 60);
        let assessment = assess(&history, &ledger, 0);
        assert_eq!(assessment.probability, 25);

        // 4/10 correct → <50% → +15
        let ledger = resolved_ledger(10, 4, 60);
        let assessment = assess(&history, &ledger, 0);
        assert_eq!(assessment.probability, 15);
    }

    #[test]
    fn test_identical_run_and_imbalance() {
        let mut window = HistoryWindow::new(500);
        let events = (1..=20u64)
            .rev()
            .map(|round| Event::new(round, Outcome::Big, [4, 5, 5]))
            .collect();
        window.refresh(events);

        let ledger = PredictionLedger::new(500);
        let assessment = assess(&window, &ledger, 0);
        // 5 identical (+18) and 7-of-8 imbalance (+12)
        assert_eq!(assessment.probability, 30);
        assert_eq!(assessment.tier, RiskTier::LowWarning);
    }

    #[test]
    fn test_high_confidence_misses() {
        // 15 resolved, all misses at confidence 80
        let history = balanced_history(30);
        let ledger = resolved_ledger(15, 0, 80);
        let assessment = assess(&history, &ledger, 0);
        // <35% accuracy (+25) and ≥5 high-confidence misses (+22)
        assert_eq!(assessment.probability, 47);
        assert_eq!(assessment.tier, RiskTier::Medium);
    }

    #[test]
    fn test_probability_capped_and_stop_flag() {
        // Stack everything: 6 straight misses, dead accuracy at high stated
        // confidence, frozen identical history with extreme totals
        let mut window = HistoryWindow::new(500);
        let events = (1..=20u64)
            .rev()
            .map(|round| Event::new(round, Outcome::Big, [6, 6, 6]))
            .collect();
        window.refresh(events);

        let ledger = resolved_ledger(20, 0, 80);
        let assessment = assess(&window, &ledger, 6);
        // 30+18 +25 +18 +12 +20 +22 = 145 → capped at 98
        assert_eq!(assessment.probability, PROBABILITY_CAP);
        assert_eq!(assessment.tier, RiskTier::Critical);
        assert!(assessment.should_stop);
    }

    #[test]
    fn test_anomaly_state_counter() {
        let mut state = AnomalyState::default();
        state.record_resolution(false);
        state.record_resolution(false);
        assert_eq!(state.consecutive_wrong, 2);
        state.record_resolution(true);
        assert_eq!(state.consecutive_wrong, 0);
    }
}
