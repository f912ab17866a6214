//! ═══════════════════════════════════════════════════════════════════════════════
//! TILT — Majority-Lean and Spacing Detectors
//! ═══════════════════════════════════════════════════════════════════════════════
//! Windowed majority leans at three horizons (5, 7, 15 rounds) plus the
//! position-spacing check that looks for a label recurring at a steady gap.
//! ═══════════════════════════════════════════════════════════════════════════════

use super::{split, Detector, DetectorContext, DetectorId, Vote};
use crate::event::Outcome;

/// 4-of-5 lean toward one side
pub struct Tilt5;

impl Detector for Tilt5 {
    fn id(&self) -> DetectorId {
        DetectorId::Tilt5
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 5 {
            return None;
        }
        let (big, small) = split(ctx.history, 5);
        let outcome = match (big, small) {
            (4, 1) => Outcome::Big,
            (1, 4) => Outcome::Small,
            _ => return None,
        };
        Some(Vote::new(
            self.id(),
            outcome,
            61,
            format!("Tilt 5: 4/5 rounds {}", outcome),
        ))
    }
}

/// 5-or-more-of-7 lean; confidence grows with the margin
pub struct Tilt7;

impl Detector for Tilt7 {
    fn id(&self) -> DetectorId {
        DetectorId::Tilt7
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 7 {
            return None;
        }
        let (big, small) = split(ctx.history, 7);
        let (outcome, majority) = if big >= 5 {
            (Outcome::Big, big)
        } else if small >= 5 {
            (Outcome::Small, small)
        } else {
            return None;
        };
        let confidence = 64 + 2 * (majority as i32 - 5);
        Some(Vote::new(
            self.id(),
            outcome,
            confidence,
            format!("Tilt 7: {}/7 rounds {}", majority, outcome),
        ))
    }
}

/// 11-or-more-of-15 lean: the strongest trend signal in the panel
pub struct StrongTrend;

impl Detector for StrongTrend {
    fn id(&self) -> DetectorId {
        DetectorId::StrongTrend
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 15 {
            return None;
        }
        let (big, small) = split(ctx.history, 15);
        let (outcome, majority) = if big >= 11 {
            (Outcome::Big, big)
        } else if small >= 11 {
            (Outcome::Small, small)
        } else {
            return None;
        };
        let confidence = 66 + 2 * (majority as i32 - 11);
        Some(Vote::new(
            self.id(),
            outcome,
            confidence,
            format!("Strong trend: {}/15 rounds {}", majority, outcome),
        ))
    }
}

/// Steady-gap recurrence: a label whose last two position gaps in the newest
/// 10 rounds differ by at most 2 is expected to recur
pub struct FibonacciGap;

impl FibonacciGap {
    fn steady_gaps(positions: &[usize]) -> bool {
        if positions.len() < 3 {
            return false;
        }
        let gaps: Vec<i64> = positions
            .windows(2)
            .map(|pair| pair[1] as i64 - pair[0] as i64)
            .collect();
        let last = gaps[gaps.len() - 1];
        let prev = gaps[gaps.len() - 2];
        (last - prev).abs() <= 2
    }
}

impl Detector for FibonacciGap {
    fn id(&self) -> DetectorId {
        DetectorId::FibonacciGap
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 10 {
            return None;
        }
        let recent = ctx.history.recent(10);
        let mut big_positions = Vec::new();
        let mut small_positions = Vec::new();
        for (idx, event) in recent.iter().enumerate() {
            match event.outcome {
                Outcome::Big => big_positions.push(idx),
                Outcome::Small => small_positions.push(idx),
            }
        }

        for (positions, outcome) in [
            (&big_positions, Outcome::Big),
            (&small_positions, Outcome::Small),
        ] {
            if Self::steady_gaps(positions) {
                return Some(Vote::new(
                    self.id(),
                    outcome,
                    60,
                    format!("Steady-gap recurrence for {}", outcome),
                ));
            }
        }
        None
    }
}
