//! Input mapping: key names bound to shared actions, and held-key state
//! reduced to one [`MoveIntent`] per tick.
//!
//! # Invariants
//! - The kernel never sees raw key events, only intents.
//! - A movement action stays held while any key pressed for it is down.

pub mod action;

pub use action::{Action, BindingError, InputMap, InputState};
pub use ratmaze_common::MoveIntent;

pub fn crate_info() -> &'static str {
    "ratmaze-input v0.1.0"
}
