//! ═══════════════════════════════════════════════════════════════════════════════
//! EVENT — Observed Round Records
//! ═══════════════════════════════════════════════════════════════════════════════
//! One event per settled round: a binary outcome plus the three dice that
//! produced it. Events are immutable once observed; the upstream feed sometimes
//! delivers numeric fields as strings or placeholders, so dice and total are
//! optional and parsed leniently at the boundary.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

/// The two mutually exclusive round outcomes (high total vs low total)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Big,
    Small,
}

impl Outcome {
    /// The opposite label
    pub fn flip(self) -> Self {
        match self {
            Outcome::Big => Outcome::Small,
            Outcome::Small => Outcome::Big,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Big => "Big",
            Outcome::Small => "Small",
        }
    }

    /// Lenient parse of feed outcome labels. Accepts the English labels and
    /// the upstream Tai/Xiu spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "big" | "tai" | "tài" => Some(Outcome::Big),
            "small" | "xiu" | "xỉu" => Some(Outcome::Small),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single settled round as observed from the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic round id (newest round has the largest id)
    pub round: u64,
    pub outcome: Outcome,
    /// The three dice; None where the feed delivered a non-numeric field
    pub dice: [Option<u8>; 3],
    /// Sum of the three dice; None where the feed delivered a non-numeric field
    pub total: Option<i32>,
}

impl Event {
    pub fn new(round: u64, outcome: Outcome, dice: [u8; 3]) -> Self {
        let total = dice.iter().map(|&d| d as i32).sum();
        Self {
            round,
            outcome,
            dice: [Some(dice[0]), Some(dice[1]), Some(dice[2])],
            total: Some(total),
        }
    }

    /// Total ≤4 or ≥17: near the edge of the dice distribution
    pub fn has_extreme_total(&self) -> bool {
        matches!(self.total, Some(t) if t <= 4 || t >= 17)
    }

    /// True when at least 2 of the 3 dice are even; None when any die is missing
    pub fn dice_even_majority(&self) -> Option<bool> {
        let mut even = 0;
        for d in &self.dice {
            match d {
                Some(v) if v % 2 == 0 => even += 1,
                Some(_) => {}
                None => return None,
            }
        }
        Some(even >= 2)
    }
}
