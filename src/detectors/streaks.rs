//! ═══════════════════════════════════════════════════════════════════════════════
//! STREAKS — Run-Based Detectors
//! ═══════════════════════════════════════════════════════════════════════════════
//! Four detectors built on consecutive-run structure: the flat streak (ride it,
//! or bet the reversal once it stretches), strict alternation, the progressive
//! same-side bet, and the choppy-table contrarian.
//! ═══════════════════════════════════════════════════════════════════════════════

use super::{leading_run, Detector, DetectorContext, DetectorId, Vote};

/// Leading equal-outcome run. Rides runs of 3-5; bets the reversal at 6+.
pub struct Streak;

impl Detector for Streak {
    fn id(&self) -> DetectorId {
        DetectorId::Streak
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 3 {
            return None;
        }
        let (lead, run) = leading_run(ctx.history, 20)?;
        if run < 3 {
            return None;
        }

        let (outcome, confidence) = if run >= 6 {
            // Long streak: reversal bet, confidence grows with overextension
            (lead.flip(), (62 + (run as i32 - 6) * 2).min(72))
        } else {
            (lead, 56 + run as i32)
        };

        Some(Vote::new(
            self.id(),
            outcome,
            confidence,
            format!("Flat streak: {} straight {}", run, lead),
        ))
    }
}

/// Strict alternation among the newest 10; predicts the flip continues
pub struct Alternation;

impl Detector for Alternation {
    fn id(&self) -> DetectorId {
        DetectorId::Alternation
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 3 {
            return None;
        }
        let recent = ctx.history.recent(10);
        let mut run = 0;
        for pair in recent.windows(2) {
            if pair[0].outcome != pair[1].outcome {
                run += 1;
            } else {
                break;
            }
        }
        if run < 3 {
            return None;
        }

        let newest = recent[0].outcome;
        let confidence = 58 + 2 * (run as i32 - 3).min(5);
        Some(Vote::new(
            self.id(),
            newest.flip(),
            confidence,
            format!("1-1 alternation held for {} flips", run),
        ))
    }
}

/// Progressive same-side bet: any leading run of 2+ keeps the same label
pub struct Martingale;

impl Detector for Martingale {
    fn id(&self) -> DetectorId {
        DetectorId::Martingale
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 5 {
            return None;
        }
        let (lead, run) = leading_run(ctx.history, 15)?;
        if run < 2 {
            return None;
        }

        let confidence = (57 + 2 * (run as i32 - 2)).min(70);
        Some(Vote::new(
            self.id(),
            lead,
            confidence,
            format!("Progressive: {} straight {}, stay on it", run, lead),
        ))
    }
}

/// Choppy table: 7+ outcome swings in the newest 10 rounds, bet the next swing
pub struct Chop;

impl Detector for Chop {
    fn id(&self) -> DetectorId {
        DetectorId::Chop
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 10 {
            return None;
        }
        let recent = ctx.history.recent(10);
        let changes = recent
            .windows(2)
            .filter(|pair| pair[0].outcome != pair[1].outcome)
            .count();
        if changes < 7 {
            return None;
        }

        let newest = recent[0].outcome;
        Some(Vote::new(
            self.id(),
            newest.flip(),
            58,
            format!("Choppy table: {}/9 swings", changes),
        ))
    }
}
