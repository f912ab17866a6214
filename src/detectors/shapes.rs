//! ═══════════════════════════════════════════════════════════════════════════════
//! SHAPES — Enumerated Positional Pattern Detectors
//! ═══════════════════════════════════════════════════════════════════════════════
//! Five- and six-round shape checks over the newest rounds (newest-first
//! positions). These are literal enumerated rules; there is no general pattern
//! grammar behind them, so no attempt is made to derive one.
//! ═══════════════════════════════════════════════════════════════════════════════

use super::{Detector, DetectorContext, DetectorId, Vote};
use crate::event::Outcome;

fn outcomes6(ctx: &DetectorContext<'_>) -> Option<[Outcome; 6]> {
    if ctx.history.len() < 6 {
        return None;
    }
    let r = ctx.history.recent(6);
    Some([
        r[0].outcome,
        r[1].outcome,
        r[2].outcome,
        r[3].outcome,
        r[4].outcome,
        r[5].outcome,
    ])
}

/// "1-2-3" shape: pair, then a triple of the other side still running
/// (r0=r1 ≠ r2, r2=r3=r4 ≠ r5); predicts the triple's side
pub struct OneTwoThree;

impl Detector for OneTwoThree {
    fn id(&self) -> DetectorId {
        DetectorId::OneTwoThree
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        let r = outcomes6(ctx)?;
        if r[0] == r[1] && r[0] != r[2] && r[2] == r[3] && r[2] == r[4] && r[2] != r[5] {
            Some(Vote::new(
                self.id(),
                r[2],
                63,
                "1-2-3 shape in play".to_string(),
            ))
        } else {
            None
        }
    }
}

/// "3-2-1" shape: fresh triple over a pair over a single
/// (r0=r1=r2 ≠ r3, r3=r4 ≠ r5); predicts the opposite of the single
pub struct ThreeTwoOne;

impl Detector for ThreeTwoOne {
    fn id(&self) -> DetectorId {
        DetectorId::ThreeTwoOne
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        let r = outcomes6(ctx)?;
        if r[0] == r[1] && r[0] == r[2] && r[0] != r[3] && r[3] == r[4] && r[3] != r[5] {
            Some(Vote::new(
                self.id(),
                r[5].flip(),
                62,
                "3-2-1 shape in play".to_string(),
            ))
        } else {
            None
        }
    }
}

/// "2-2" shape, two strengths. Strong: fresh pair against an older block of
/// the same side (r0=r1 ≠ r2, r2=r3, r0=r4=r5) at 65; forming: just the two
/// pairs (r0=r1 ≠ r2, r2=r3) at 62. Both predict the indicated flip.
pub struct TwoTwo;

impl Detector for TwoTwo {
    fn id(&self) -> DetectorId {
        DetectorId::TwoTwo
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        let r = outcomes6(ctx)?;
        if r[0] == r[1] && r[0] != r[2] && r[2] == r[3] && r[0] == r[4] && r[0] == r[5] {
            return Some(Vote::new(
                self.id(),
                r[0].flip(),
                65,
                "2-2 shape running strong".to_string(),
            ));
        }
        if r[0] == r[1] && r[0] != r[2] && r[2] == r[3] {
            return Some(Vote::new(
                self.id(),
                r[2].flip(),
                62,
                "2-2 shape forming".to_string(),
            ));
        }
        None
    }
}

/// "2-1-2" shape over five rounds: pair, lone opposite, pair of the first side
/// (r0=r1 ≠ r2 ≠ r3=r4, r0=r3); predicts the opposite of the pairs' side
pub struct TwoOneTwo;

impl Detector for TwoOneTwo {
    fn id(&self) -> DetectorId {
        DetectorId::TwoOneTwo
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>) -> Option<Vote> {
        if ctx.history.len() < 5 {
            return None;
        }
        let r = ctx.history.recent(5);
        let (a, b, c, d, e) = (
            r[0].outcome,
            r[1].outcome,
            r[2].outcome,
            r[3].outcome,
            r[4].outcome,
        );
        if a == b && a != c && c != d && d == e && a == d {
            Some(Vote::new(
                self.id(),
                a.flip(),
                64,
                "2-1-2 shape in play".to_string(),
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{empty_ledger, window};
    use super::*;

    fn eval<D: Detector>(detector: D, pattern: &str) -> Option<Vote> {
        let history = window(pattern);
        let ledger = empty_ledger();
        let ctx = DetectorContext {
            history: &history,
            ledger: &ledger,
        };
        detector.evaluate(&ctx)
    }

    #[test]
    fn test_one_two_three() {
        // newest-first: B B | S S S | B
        let vote = eval(OneTwoThree, "BB SSS B").expect("shape matches");
        assert_eq!(vote.outcome, Outcome::Small);
        assert_eq!(vote.confidence, 63);

        assert!(eval(OneTwoThree, "BB SSS S").is_none()); // r5 breaks it
        assert!(eval(OneTwoThree, "BS SSS B").is_none()); // r0 != r1
    }

    #[test]
    fn test_three_two_one() {
        // newest-first: B B B | S S | B  → predicts flip of r5 = Small
        let vote = eval(ThreeTwoOne, "BBB SS B").expect("shape matches");
        assert_eq!(vote.outcome, Outcome::Small);
        assert_eq!(vote.confidence, 62);

        assert!(eval(ThreeTwoOne, "BBB SS S").is_none());
    }

    #[test]
    fn test_two_two_strong_beats_forming() {
        // Strong: B B | S S | B B → flip of r0 = Small at 65
        let vote = eval(TwoTwo, "BB SS BB").expect("strong match");
        assert_eq!(vote.outcome, Outcome::Small);
        assert_eq!(vote.confidence, 65);

        // Forming only: B B | S S | S B → flip of r2 = Big at 62
        let vote = eval(TwoTwo, "BB SS SB").expect("forming match");
        assert_eq!(vote.outcome, Outcome::Big);
        assert_eq!(vote.confidence, 62);

        assert!(eval(TwoTwo, "BS SS BB").is_none());
    }

    #[test]
    fn test_two_one_two() {
        // newest-first: B B | S | B B → a == d, predicts Small
        let vote = eval(TwoOneTwo, "BB S BB").expect("shape matches");
        assert_eq!(vote.outcome, Outcome::Small);
        assert_eq!(vote.confidence, 64);

        // Broken middle: the lone round must sit between two equal pairs
        assert!(eval(TwoOneTwo, "BB S SB").is_none());
    }
}
