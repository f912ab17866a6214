//! ═══════════════════════════════════════════════════════════════════════════════
//! HOUSE — Intervention Detector
//! ═══════════════════════════════════════════════════════════════════════════════
//! Detector-shaped, but with a multi-signal scoring body: four independent
//! suspicion signals over the last 20 rounds and the resolved ledger. When the
//! additive score clears the firing threshold it votes against the most recent
//! outcome and surfaces the triggered signals.
//! ═══════════════════════════════════════════════════════════════════════════════

use super::{Detector, DetectorContext, DetectorId, Vote};
use crate::event::Outcome;
use crate::ledger::Resolution;

/// Minimum history and resolved-prediction depth before the detector runs
const MIN_HISTORY: usize = 20;
const MIN_RESOLVED: usize = 10;

/// Additive score needed to emit a vote
const FIRE_THRESHOLD: i32 = 50;

pub struct HouseIntervention;

impl HouseIntervention {
    /// Any run of 8+ equal outcomes within the window, found by scanning
    /// backward from each position (scan depth capped at 10)
    fn has_extended_streak(recent: &[crate::event::Event]) -> bool {
        for idx in 1..recent.len() {
            let anchor = recent[idx].outcome;
            let mut streak = 1;
            let floor = idx.saturating_sub(10);
            for i in (floor..idx).rev() {
                if recent[i].outcome == anchor {
                    streak += 1;
                } else {
                    break;
                }
            }
            if streak >= 8 {
                return true;
            }
        }
        false
    }
}

impl Detector for HouseIntervention {
    fn id(&self) -> DetectorId {
        DetectorId::HouseIntervention
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < MIN_HISTORY || ctx.ledger.resolved_count() < MIN_RESOLVED {
            return None;
        }

        let recent20 = ctx.history.recent(20);
        let mut score = 0;
        let mut signals = Vec::new();

        if Self::has_extended_streak(recent20) {
            score += 30;
            signals.push("Abnormally long streak (8+ rounds) - intervention suspected".to_string());
        }

        let extremes = recent20.iter().filter(|e| e.has_extreme_total()).count();
        if extremes >= 5 {
            score += 25;
            signals.push(format!("Extreme totals showed up {}/20 rounds", extremes));
        }

        let recent_resolved = ctx.ledger.recent_resolved(10);
        if recent_resolved.len() >= 8 {
            let wrong = recent_resolved
                .iter()
                .filter(|e| e.resolution == Resolution::Incorrect)
                .count();
            let wrong_rate = wrong as f64 / recent_resolved.len() as f64 * 100.0;
            if wrong_rate >= 70.0 {
                score += 35;
                signals.push(format!("Unusually high miss rate: {:.0}%", wrong_rate));
            }
        }

        let big = recent20
            .iter()
            .take(10)
            .filter(|e| e.outcome == Outcome::Big)
            .count();
        let small = 10 - big;
        if big >= 9 || small >= 9 {
            score += 20;
            signals.push("Severe imbalance across the last 10 rounds".to_string());
        }

        if score < FIRE_THRESHOLD {
            return None;
        }

        let newest = recent20[0].outcome;
        let confidence = (58 + score / 8).min(72);
        let mut vote = Vote::new(
            self.id(),
            newest.flip(),
            confidence,
            format!("House intervention suspected - suspicion {}/100", score),
        );
        vote.signals = signals;
        Some(vote)
    }
}
