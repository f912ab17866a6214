//! ═══════════════════════════════════════════════════════════════════════════════
//! LEARNING — Adaptive Confidence Table
//! ═══════════════════════════════════════════════════════════════════════════════
//! Per-detector hit-rate counters and the derived confidence adjustment.
//! Blends lifetime accuracy with a harmonically weighted recent window so a
//! detector that has gone cold loses its bonus quickly. Only the detector
//! whose vote won the ensemble learns from a resolution.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::detectors::DetectorId;

/// Confidence floor/ceiling applied whenever an adjustment is taken
pub const CONFIDENCE_FLOOR: i32 = 55;
pub const CONFIDENCE_CEILING: i32 = 85;

/// Resolutions required before the adjustment is trusted at all
const MIN_ATTEMPTS: u32 = 3;

/// Recent-outcome window size
const RECENT_CAP: usize = 20;

/// Recent entries required before the weighted recent accuracy kicks in
const RECENT_MIN: usize = 5;

/// Counters for one detector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearningRecord {
    pub attempts: u32,
    pub correct: u32,
    /// Most-recent-first resolution outcomes, capacity 20
    #[serde(default)]
    pub recent: VecDeque<bool>,
    /// Signed confidence adjustment in [-8, +8]
    #[serde(default)]
    pub adjustment: i32,
}

impl LearningRecord {
    pub fn lifetime_accuracy(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.correct as f64 / self.attempts as f64
        }
    }

    /// Harmonically weighted accuracy over the recent window: the i-th
    /// most-recent outcome carries weight 1/(i+1). Falls back to lifetime
    /// accuracy until 5 recent entries exist.
    pub fn recent_accuracy(&self) -> f64 {
        if self.recent.len() < RECENT_MIN {
            return self.lifetime_accuracy();
        }
        let mut weighted = 0.0;
        let mut weight_total = 0.0;
        for (idx, &hit) in self.recent.iter().enumerate() {
            let weight = 1.0 / (idx as f64 + 1.0);
            if hit {
                weighted += weight;
            }
            weight_total += weight;
        }
        weighted / weight_total
    }

    /// 40% lifetime, 60% recent
    pub fn blended_accuracy(&self) -> f64 {
        0.4 * self.lifetime_accuracy() + 0.6 * self.recent_accuracy()
    }

    fn reband(&mut self) {
        if self.attempts < MIN_ATTEMPTS {
            return;
        }
        let acc = self.blended_accuracy();
        self.adjustment = if acc >= 0.75 {
            8
        } else if acc >= 0.65 {
            5
        } else if acc >= 0.58 {
            3
        } else if acc >= 0.52 {
            0
        } else if acc >= 0.45 {
            -3
        } else if acc >= 0.38 {
            -5
        } else {
            -8
        };
    }
}

/// The full learning table, one record per detector
#[derive(Debug, Clone)]
pub struct LearningTable {
    records: HashMap<DetectorId, LearningRecord>,
    /// Snapshot trigger: mark dirty whenever a record's attempts hits a
    /// multiple of this
    save_every: u32,
    dirty: bool,
}

impl LearningTable {
    pub fn new(save_every: u32) -> Self {
        Self::from_records(HashMap::new(), save_every)
    }

    /// Build from a persisted snapshot; detectors missing from the snapshot
    /// start from the zero record.
    pub fn from_records(records: HashMap<DetectorId, LearningRecord>, save_every: u32) -> Self {
        let mut table = Self {
            records,
            save_every: save_every.max(1),
            dirty: false,
        };
        for id in DetectorId::ALL {
            table.records.entry(id).or_default();
        }
        table
    }

    /// Confidence adjustment for a base score: clamp(base + adjustment, 55, 85).
    /// The adjustment is taken only after 3 resolved attempts; the clamp is
    /// applied regardless.
    pub fn apply(&self, id: DetectorId, base: i32) -> i32 {
        let adjusted = match self.records.get(&id) {
            Some(rec) if rec.attempts >= MIN_ATTEMPTS => base + rec.adjustment,
            _ => base,
        };
        adjusted.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
    }

    /// Fold one resolved prediction into the winning detector's record
    pub fn record_outcome(&mut self, id: DetectorId, correct: bool) {
        let rec = self.records.entry(id).or_default();
        rec.attempts += 1;
        if correct {
            rec.correct += 1;
        }
        rec.recent.push_front(correct);
        if rec.recent.len() > RECENT_CAP {
            rec.recent.pop_back();
        }
        rec.reband();

        if rec.attempts % self.save_every == 0 {
            self.dirty = true;
        }
    }

    pub fn record(&self, id: DetectorId) -> Option<&LearningRecord> {
        self.records.get(&id)
    }

    pub fn records(&self) -> &HashMap<DetectorId, LearningRecord> {
        &self.records
    }

    /// Total resolved attempts across all detectors
    pub fn total_attempts(&self) -> u32 {
        self.records.values().map(|r| r.attempts).sum()
    }

    /// True when a snapshot is due; clears the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
