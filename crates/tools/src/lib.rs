//! Developer tooling: maze inspection, path solving and a scripted driver.
//!
//! # Invariants
//! - Tools only read game state; the autopilot acts through intents alone.

pub mod autopilot;
pub mod inspector;

pub use autopilot::Autopilot;
pub use inspector::{MazeInspector, MazeReport, SessionSummary, TopologyError};

pub fn crate_info() -> &'static str {
    "ratmaze-tools v0.1.0"
}
