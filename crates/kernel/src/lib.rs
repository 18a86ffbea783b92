//! Ratmaze kernel: maze generation, grid collision, rat movement and the
//! per-tick game session.
//!
//! # Invariants
//! - The maze is a perfect maze: every cell reachable, exactly one path
//!   between any two cells, wall flags mirrored between neighbours.
//! - Topology is fixed after generation; nothing mutates walls afterwards.
//! - A committed rat position always satisfies `MazeGrid::is_safe` at the
//!   rat radius.
//! - Generation and stepping are deterministic for a given seed and input
//!   sequence.

pub mod collider;
pub mod config;
pub mod maze;
pub mod objects;
pub mod rat;
pub mod rng;
pub mod session;
pub mod spatial;

pub use collider::{CapsuleCollider, WallHit};
pub use config::{ConfigError, GameConfig, MAX_DIMENSION, RatTuning};
pub use maze::{Cell, MazeGrid};
pub use objects::{Collectible, ExitPortal};
pub use rat::{MoveOutcome, Rat};
pub use rng::SeededRandom;
pub use session::{GameEvent, GameSession, GameStatus, StepReport};

pub fn crate_info() -> &'static str {
    "ratmaze-kernel v0.1.0"
}
