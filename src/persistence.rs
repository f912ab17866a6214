//! ═══════════════════════════════════════════════════════════════════════════════
//! PERSISTENCE — Learning Table Snapshots
//! ═══════════════════════════════════════════════════════════════════════════════
//! Reads and writes the per-detector learning records as a pretty-printed JSON
//! file keyed by detector id. Load failures degrade to an empty table so a
//! missing or corrupt snapshot never blocks startup; save failures are
//! reported but never abort a cycle.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::detectors::DetectorId;
use crate::error::{AugurResult, PersistenceError};
use crate::learning::{LearningRecord, LearningTable};

/// File-backed store for the learning table
pub struct LearningStore {
    path: PathBuf,
}

impl LearningStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load persisted records. A missing file is a normal first run; a corrupt
    /// file is reported and treated as empty. Learning restarts from zero in
    /// both cases.
    pub fn load(&self) -> HashMap<DetectorId, LearningRecord> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                println!(
                    "[learning] no snapshot at {}, starting fresh",
                    self.path.display()
                );
                return HashMap::new();
            }
            Err(e) => {
                eprintln!(
                    "[learning] could not read {}: {}, starting fresh",
                    self.path.display(),
                    e
                );
                return HashMap::new();
            }
        };

        match serde_json::from_str::<HashMap<DetectorId, LearningRecord>>(&text) {
            Ok(records) => {
                println!(
                    "[learning] loaded {} detector records from {}",
                    records.len(),
                    self.path.display()
                );
                records
            }
            Err(e) => {
                eprintln!(
                    "[learning] snapshot {} is corrupt ({}), starting fresh",
                    self.path.display(),
                    e
                );
                HashMap::new()
            }
        }
    }

    /// Write the current table. The caller decides the cadence via the
    /// table's dirty flag.
    pub fn save(&self, table: &LearningTable) -> AugurResult<()> {
        let json =
            serde_json::to_string_pretty(table.records()).map_err(|e| PersistenceError::Save {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        fs::write(&self.path, json).map_err(|e| PersistenceError::Save {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("augur-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let store = LearningStore::new(temp_path("missing.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let path = temp_path("corrupt.json");
        fs::write(&path, "{not json").unwrap();
        let store = LearningStore::new(&path);
        assert!(store.load().is_empty());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let path = temp_path("roundtrip.json");
        let mut table = LearningTable::new(5);
        table.record_outcome(DetectorId::Streak, true);
        table.record_outcome(DetectorId::Streak, false);
        table.record_outcome(DetectorId::Chop, true);

        let store = LearningStore::new(&path);
        store.save(&table).expect("save succeeds");

        let records = store.load();
        let streak = records.get(&DetectorId::Streak).expect("streak persisted");
        assert_eq!(streak.attempts, 2);
        assert_eq!(streak.correct, 1);
        fs::remove_file(&path).ok();
    }
}
