//! ═══════════════════════════════════════════════════════════════════════════════
//! AUGUR — Dice Round Prediction Engine
//! ═══════════════════════════════════════════════════════════════════════════════
//! Predicts the binary outcome (Big/Small) of the next dice round from a
//! rolling history window. A fixed panel of pattern detectors votes each
//! cycle; per-detector adaptive learning reweights the votes; an ensemble
//! picks the forecast; an anomaly engine scores the risk that the table has
//! shifted away from recent statistical norms.
//!
//! Module map:
//! - `event` / `history` — observed rounds and the rolling window
//! - `detectors` — the pattern catalogue and the house-intervention monitor
//! - `learning` — adaptive per-detector confidence
//! - `ensemble` — vote combination and the majority override
//! - `anomaly` — break-probability estimation
//! - `ledger` — issued predictions and their lifecycle
//! - `engine` — the cycle owner tying it all together
//! - `feed` / `persistence` / `server` — boundary collaborators
//! ═══════════════════════════════════════════════════════════════════════════════

#![allow(clippy::too_many_arguments)]
#![allow(clippy::single_match)]

pub mod anomaly;
pub mod detectors;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod event;
pub mod feed;
pub mod history;
pub mod learning;
pub mod ledger;
pub mod persistence;
pub mod server;

pub use engine::{CycleReport, CycleStatus, Engine, EngineConfig};
pub use error::{AugurError, AugurResult};
pub use event::{Event, Outcome};
