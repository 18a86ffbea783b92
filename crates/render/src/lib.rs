//! Rendering adapter: renderer-agnostic scene building for the maze.
//!
//! # Invariants
//! - Renderers cannot mutate game truth.
//! - Everything drawn derives from the session and a camera.
//!
//! The GPU backend is out of tree. [`SceneBuilder`] feeds any [`DrawSink`];
//! [`AsciiRenderer`] stands in for terminals and tests.

pub mod camera;
mod renderer;
pub mod scene;

pub use camera::{Camera, CameraRig, Projection, ViewMode};
pub use renderer::{AsciiRenderer, Renderer};
pub use scene::{DrawSink, Material, Prop, Quad, RecordingSink, SceneBuilder, SceneStats};

pub fn crate_info() -> &'static str {
    "ratmaze-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
