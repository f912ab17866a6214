//! ═══════════════════════════════════════════════════════════════════════════════
//! SUMS — Dice-Total and Parity Detectors
//! ═══════════════════════════════════════════════════════════════════════════════
//! Detectors over the numeric side of each round: total averages, total
//! parity, total trend, and per-die parity. Rounds whose numeric fields failed
//! to parse are skipped from the statistic, never an error.
//! ═══════════════════════════════════════════════════════════════════════════════

use super::{Detector, DetectorContext, DetectorId, Vote};
use crate::event::Outcome;

fn totals(ctx: &DetectorContext<'_>, n: usize) -> Vec<i32> {
    ctx.history
        .recent(n)
        .iter()
        .filter_map(|e| e.total)
        .collect()
}

/// Mean of the five newest totals: ≥12 leans Big, ≤9 leans Small.
/// Requires all five totals to be numeric.
pub struct SumAverage;

impl Detector for SumAverage {
    fn id(&self) -> DetectorId {
        DetectorId::SumAverage
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 5 {
            return None;
        }
        let totals = totals(ctx, 5);
        if totals.len() != 5 {
            return None;
        }
        let avg = totals.iter().sum::<i32>() as f64 / totals.len() as f64;

        let outcome = if avg >= 12.0 {
            Outcome::Big
        } else if avg <= 9.0 {
            Outcome::Small
        } else {
            return None;
        };
        Some(Vote::new(
            self.id(),
            outcome,
            59,
            format!("Average total {:.1} over 5 rounds", avg),
        ))
    }
}

/// Even-majority dice: classify each of the newest 10 rounds by whether at
/// least 2 of its 3 dice are even; a 7-of-10 skew picks a side
pub struct DiceParity;

impl Detector for DiceParity {
    fn id(&self) -> DetectorId {
        DetectorId::DiceParity
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 10 {
            return None;
        }
        let mut even_majority = 0;
        let mut odd_majority = 0;
        for event in ctx.history.recent(10) {
            match event.dice_even_majority() {
                Some(true) => even_majority += 1,
                Some(false) => odd_majority += 1,
                None => {} // unparseable dice are left out of the statistic
            }
        }

        if even_majority >= 7 {
            Some(Vote::new(
                self.id(),
                Outcome::Big,
                58,
                format!("Even-heavy dice: {}/10 rounds", even_majority),
            ))
        } else if odd_majority >= 7 {
            Some(Vote::new(
                self.id(),
                Outcome::Small,
                58,
                format!("Odd-heavy dice: {}/10 rounds", odd_majority),
            ))
        } else {
            None
        }
    }
}

/// Total parity over the newest 8 rounds: 6+ even totals lean Big, 6+ odd
/// totals lean Small
pub struct SumParity;

impl Detector for SumParity {
    fn id(&self) -> DetectorId {
        DetectorId::SumParity
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 8 {
            return None;
        }
        let totals = totals(ctx, 8);
        let even = totals.iter().filter(|t| *t % 2 == 0).count();
        let odd = totals.len() - even;

        if even >= 6 {
            Some(Vote::new(
                self.id(),
                Outcome::Big,
                59,
                format!("Even totals dominate: {}/8 rounds", even),
            ))
        } else if odd >= 6 {
            Some(Vote::new(
                self.id(),
                Outcome::Small,
                59,
                format!("Odd totals dominate: {}/8 rounds", odd),
            ))
        } else {
            None
        }
    }
}

/// Direction of the totals across the newest 6 rounds (newest-first order):
/// 4+ rising transitions lean Big, 4+ falling lean Small. Requires all six
/// totals to be numeric.
pub struct SumTrend;

impl Detector for SumTrend {
    fn id(&self) -> DetectorId {
        DetectorId::SumTrend
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 6 {
            return None;
        }
        let totals = totals(ctx, 6);
        if totals.len() != 6 {
            return None;
        }

        let mut rising = 0;
        let mut falling = 0;
        for pair in totals.windows(2) {
            if pair[1] > pair[0] {
                rising += 1;
            }
            if pair[1] < pair[0] {
                falling += 1;
            }
        }

        if rising >= 4 {
            Some(Vote::new(
                self.id(),
                Outcome::Big,
                61,
                format!("Totals rising: {}/5 transitions", rising),
            ))
        } else if falling >= 4 {
            Some(Vote::new(
                self.id(),
                Outcome::Small,
                61,
                format!("Totals falling: {}/5 transitions", falling),
            ))
        } else {
            None
        }
    }
}
