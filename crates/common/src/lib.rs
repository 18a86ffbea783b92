//! Shared plain types for the ratmaze crates.
//!
//! # Invariants
//! - Positions are in grid units: 1.0 is one cell width.
//! - Headings are in degrees, counter-clockwise from +X.

pub mod types;

pub use types::{CellCoord, MoveIntent, Pose, Side, heading_vector};

pub fn crate_info() -> &'static str {
    "ratmaze-common v0.1.0"
}
