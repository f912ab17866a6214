//! ═══════════════════════════════════════════════════════════════════════════════
//! DETECTORS — Pattern Detector Panel
//! ═══════════════════════════════════════════════════════════════════════════════
//! A fixed ordered registry of independent, stateless detector units. Each
//! inspects only the history window (two also read the prediction ledger) and
//! returns an optional vote: candidate outcome, base confidence, rationale.
//!
//! The catalogue order is contractual — the ensemble's stable sort falls back
//! to it on confidence ties. Thresholds and confidence formulas are literal;
//! the shape detectors encode enumerated positional patterns with no general
//! grammar behind them.
//! ═══════════════════════════════════════════════════════════════════════════════

mod house;
mod shapes;
mod streaks;
mod sums;
mod tilt;

pub use house::HouseIntervention;
pub use shapes::{OneTwoThree, ThreeTwoOne, TwoOneTwo, TwoTwo};
pub use streaks::{Alternation, Chop, Martingale, Streak};
pub use sums::{DiceParity, SumAverage, SumParity, SumTrend};
pub use tilt::{FibonacciGap, StrongTrend, Tilt5, Tilt7};

use serde::{Deserialize, Serialize};

use crate::event::Outcome;
use crate::history::HistoryWindow;
use crate::learning::LearningTable;
use crate::ledger::PredictionLedger;

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTITY & VOTE
// ═══════════════════════════════════════════════════════════════════════════════

/// Stable identity of every detector in the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorId {
    Streak,
    Alternation,
    OneTwoThree,
    ThreeTwoOne,
    TwoTwo,
    TwoOneTwo,
    Tilt5,
    Tilt7,
    SumAverage,
    DiceParity,
    StrongTrend,
    Chop,
    Martingale,
    FibonacciGap,
    SumParity,
    SumTrend,
    HouseIntervention,
}

impl DetectorId {
    /// Catalogue order; the house detector is always last
    pub const ALL: [DetectorId; 17] = [
        DetectorId::Streak,
        DetectorId::Alternation,
        DetectorId::OneTwoThree,
        DetectorId::ThreeTwoOne,
        DetectorId::TwoTwo,
        DetectorId::TwoOneTwo,
        DetectorId::Tilt5,
        DetectorId::Tilt7,
        DetectorId::SumAverage,
        DetectorId::DiceParity,
        DetectorId::StrongTrend,
        DetectorId::Chop,
        DetectorId::Martingale,
        DetectorId::FibonacciGap,
        DetectorId::SumParity,
        DetectorId::SumTrend,
        DetectorId::HouseIntervention,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorId::Streak => "streak",
            DetectorId::Alternation => "alternation",
            DetectorId::OneTwoThree => "one_two_three",
            DetectorId::ThreeTwoOne => "three_two_one",
            DetectorId::TwoTwo => "two_two",
            DetectorId::TwoOneTwo => "two_one_two",
            DetectorId::Tilt5 => "tilt5",
            DetectorId::Tilt7 => "tilt7",
            DetectorId::SumAverage => "sum_average",
            DetectorId::DiceParity => "dice_parity",
            DetectorId::StrongTrend => "strong_trend",
            DetectorId::Chop => "chop",
            DetectorId::Martingale => "martingale",
            DetectorId::FibonacciGap => "fibonacci_gap",
            DetectorId::SumParity => "sum_parity",
            DetectorId::SumTrend => "sum_trend",
            DetectorId::HouseIntervention => "house_intervention",
        }
    }
}

impl std::fmt::Display for DetectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detector's ephemeral vote for the next round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub detector: DetectorId,
    pub outcome: Outcome,
    /// Base score when produced; learning-adjusted by the panel runner
    pub confidence: i32,
    pub rationale: String,
    /// Auxiliary trigger descriptions (house detector only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<String>,
}

impl Vote {
    pub fn new(detector: DetectorId, outcome: Outcome, confidence: i32, rationale: String) -> Self {
        Self {
            detector,
            outcome,
            confidence,
            rationale,
            signals: Vec::new(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DETECTOR CAPABILITY & PANEL
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-only view a detector evaluates against
pub struct DetectorContext<'a> {
    pub history: &'a HistoryWindow,
    pub ledger: &'a PredictionLedger,
}

/// A single detector unit. Pure function of the context; returns None when its
/// minimum history is unmet or its trigger condition does not hold.
pub trait Detector: Send + Sync {
    fn id(&self) -> DetectorId;
    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote>;
}

/// The fixed ordered panel
pub struct Panel {
    detectors: Vec<Box<dyn Detector>>,
}

impl Panel {
    /// The full catalogue in contractual order, house detector last
    pub fn standard() -> Self {
        Self {
            detectors: vec![
                Box::new(Streak),
                Box::new(Alternation),
                Box::new(OneTwoThree),
                Box::new(ThreeTwoOne),
                Box::new(TwoTwo),
                Box::new(TwoOneTwo),
                Box::new(Tilt5),
                Box::new(Tilt7),
                Box::new(SumAverage),
                Box::new(DiceParity),
                Box::new(StrongTrend),
                Box::new(Chop),
                Box::new(Martingale),
                Box::new(FibonacciGap),
                Box::new(SumParity),
                Box::new(SumTrend),
                Box::new(HouseIntervention),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Run every detector over the context and adjust each vote's confidence
    /// through the learning table. Output preserves catalogue order.
    pub fn run(&self, ctx: &DetectorContext<'_>, learning: &LearningTable) -> Vec<Vote> {
        let mut votes = Vec::new();
        for detector in &self.detectors {
            if let Some(mut vote) = detector.evaluate(ctx) {
                vote.confidence = learning.apply(vote.detector, vote.confidence);
                votes.push(vote);
            }
        }
        votes
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Length of the leading equal-outcome run, scanning at most `depth` rounds
pub(crate) fn leading_run(history: &HistoryWindow, depth: usize) -> Option<(Outcome, usize)> {
    let lead = history.outcome(0)?;
    let mut run = 1;
    for event in history.recent(depth).iter().skip(1) {
        if event.outcome == lead {
            run += 1;
        } else {
            break;
        }
    }
    Some((lead, run))
}

/// Big/Small split over the newest `n` rounds
pub(crate) fn split(history: &HistoryWindow, n: usize) -> (usize, usize) {
    let mut big = 0;
    let mut small = 0;
    for event in history.recent(n) {
        match event.outcome {
            Outcome::Big => big += 1,
            Outcome::Small => small += 1,
        }
    }
    (big, small)
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::event::{Event, Outcome};
    use crate::history::HistoryWindow;
    use crate::ledger::PredictionLedger;

    /// Build a window from newest-first outcome chars ('B'/'S')
    pub fn window(pattern: &str) -> HistoryWindow {
        let outcomes: Vec<Outcome> = pattern
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                'B' => Outcome::Big,
                'S' => Outcome::Small,
                other => panic!("bad outcome char {:?}", other),
            })
            .collect();
        let n = outcomes.len() as u64;
        let events = outcomes
            .into_iter()
            .enumerate()
            .map(|(i, outcome)| {
                let dice = match outcome {
                    Outcome::Big => [4, 5, 5],
                    Outcome::Small => [2, 3, 3],
                };
                Event::new(n - i as u64, outcome, dice)
            })
            .collect();
        let mut w = HistoryWindow::new(500);
        w.refresh(events);
        w
    }

    /// Same, with explicit totals (newest-first); dice derived crudely
    pub fn window_with_totals(pairs: &[(char, i32)]) -> HistoryWindow {
        let n = pairs.len() as u64;
        let events = pairs
            .iter()
            .enumerate()
            .map(|(i, &(c, total))| {
                let outcome = if c == 'B' { Outcome::Big } else { Outcome::Small };
                let mut event = Event::new(n - i as u64, outcome, [1, 1, 1]);
                event.total = Some(total);
                event
            })
            .collect();
        let mut w = HistoryWindow::new(500);
        w.refresh(events);
        w
    }

    pub fn empty_ledger() -> PredictionLedger {
        PredictionLedger::new(500)
    }
}
