//! ═══════════════════════════════════════════════════════════════════════════════
//! ENSEMBLE — Vote Combination
//! ═══════════════════════════════════════════════════════════════════════════════
//! Collapses the panel's adjusted votes into one final forecast: highest
//! confidence wins (stable on ties, preserving catalogue order), with a small
//! bonus when a clear cross-detector majority agrees. Zero firing detectors
//! means no forecast — a normal cycle outcome, not an error.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

use crate::detectors::{DetectorId, Vote};
use crate::event::Outcome;
use crate::learning::{CONFIDENCE_CEILING, CONFIDENCE_FLOOR};

/// Firing detectors needed before the majority override is considered
const MAJORITY_MIN_VOTES: usize = 3;

/// Confidence bonus when the majority override triggers
const MAJORITY_BONUS: i32 = 2;

/// Votes kept in the issued snapshot
const TOP_VOTES: usize = 5;

/// The combined forecast for the next round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalPrediction {
    pub outcome: Outcome,
    /// Clamped to [55, 85]
    pub confidence: i32,
    /// The detector whose vote won the sort
    pub detector: DetectorId,
    pub rationale: String,
    pub votes_cast: usize,
    pub big_votes: usize,
    pub small_votes: usize,
    /// Top-5 votes after sorting, for the ledger snapshot
    pub top_votes: Vec<Vote>,
}

/// Combine the panel's votes. `votes` must already be learning-adjusted and
/// in catalogue order.
pub fn resolve(mut votes: Vec<Vote>) -> Option<FinalPrediction> {
    if votes.is_empty() {
        return None;
    }

    // Stable sort: catalogue order breaks confidence ties
    votes.sort_by(|a, b| b.confidence.cmp(&a.confidence));

    let big_votes = votes.iter().filter(|v| v.outcome == Outcome::Big).count();
    let small_votes = votes.len() - big_votes;

    let best = &votes[0];
    let mut outcome = best.outcome;
    let mut confidence = best.confidence;

    if votes.len() >= MAJORITY_MIN_VOTES {
        if big_votes > small_votes * 2 {
            outcome = Outcome::Big;
            confidence = (confidence + MAJORITY_BONUS).min(CONFIDENCE_CEILING);
        } else if small_votes > big_votes * 2 {
            outcome = Outcome::Small;
            confidence = (confidence + MAJORITY_BONUS).min(CONFIDENCE_CEILING);
        }
    }

    confidence = confidence.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING);

    Some(FinalPrediction {
        outcome,
        confidence,
        detector: best.detector,
        rationale: best.rationale.clone(),
        votes_cast: votes.len(),
        big_votes,
        small_votes,
        top_votes: votes.into_iter().take(TOP_VOTES).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(detector: DetectorId, outcome: Outcome, confidence: i32) -> Vote {
        Vote::new(detector, outcome, confidence, format!("{}", detector))
    }

    #[test]
    fn test_no_votes_no_prediction() {
        assert!(resolve(Vec::new()).is_none());
    }

    #[test]
    fn test_top_confidence_wins() {
        let final_p = resolve(vec![
            vote(DetectorId::Streak, Outcome::Big, 60),
            vote(DetectorId::Tilt7, Outcome::Small, 66),
        ])
        .expect("prediction");
        assert_eq!(final_p.outcome, Outcome::Small);
        assert_eq!(final_p.confidence, 66);
        assert_eq!(final_p.detector, DetectorId::Tilt7);
    }

    #[test]
    fn test_tie_keeps_catalogue_order() {
        let final_p = resolve(vec![
            vote(DetectorId::Streak, Outcome::Big, 60),
            vote(DetectorId::Chop, Outcome::Small, 60),
        ])
        .expect("prediction");
        assert_eq!(final_p.detector, DetectorId::Streak);
        assert_eq!(final_p.outcome, Outcome::Big);
    }

    #[test]
    fn test_majority_override_adds_bonus() {
        // 3 Big vs 1 Small, top confidence 60: override fires, Big at 62
        let final_p = resolve(vec![
            vote(DetectorId::Streak, Outcome::Big, 60),
            vote(DetectorId::Tilt5, Outcome::Big, 58),
            vote(DetectorId::SumParity, Outcome::Big, 57),
            vote(DetectorId::Chop, Outcome::Small, 58),
        ])
        .expect("prediction");
        assert_eq!(final_p.outcome, Outcome::Big);
        assert_eq!(final_p.confidence, 62);
        assert_eq!(final_p.big_votes, 3);
        assert_eq!(final_p.small_votes, 1);
    }

    #[test]
    fn test_majority_can_override_the_top_vote() {
        // Small holds the top confidence, but 3-of-4 Big flips the label
        let final_p = resolve(vec![
            vote(DetectorId::Tilt7, Outcome::Small, 70),
            vote(DetectorId::Streak, Outcome::Big, 60),
            vote(DetectorId::Tilt5, Outcome::Big, 58),
            vote(DetectorId::SumParity, Outcome::Big, 57),
        ])
        .expect("prediction");
        assert_eq!(final_p.outcome, Outcome::Big);
        assert_eq!(final_p.confidence, 72); // 70 + 2
        // The winning detector is still the top of the sort
        assert_eq!(final_p.detector, DetectorId::Tilt7);
    }

    #[test]
    fn test_two_to_one_is_not_a_majority() {
        // 2 > 2*1 is false: no override below a strict doubling
        let final_p = resolve(vec![
            vote(DetectorId::Streak, Outcome::Big, 60),
            vote(DetectorId::Tilt5, Outcome::Big, 58),
            vote(DetectorId::Chop, Outcome::Small, 59),
        ])
        .expect("prediction");
        assert_eq!(final_p.outcome, Outcome::Big);
        assert_eq!(final_p.confidence, 60); // no bonus
    }

    #[test]
    fn test_confidence_clamped_at_ceiling() {
        let final_p = resolve(vec![
            vote(DetectorId::Streak, Outcome::Big, 85),
            vote(DetectorId::Tilt5, Outcome::Big, 84),
            vote(DetectorId::SumParity, Outcome::Big, 83),
        ])
        .expect("prediction");
        assert_eq!(final_p.confidence, 85);
    }

    #[test]
    fn test_top_votes_snapshot_capped_at_five() {
        let votes: Vec<Vote> = DetectorId::ALL
            .into_iter()
            .take(7)
            .map(|id| vote(id, Outcome::Big, 60))
            .collect();
        let final_p = resolve(votes).expect("prediction");
        assert_eq!(final_p.top_votes.len(), 5);
        assert_eq!(final_p.votes_cast, 7);
    }
}
