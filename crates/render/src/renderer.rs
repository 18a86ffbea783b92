use ratmaze_common::{CellCoord, Side};
use ratmaze_kernel::GameSession;

use crate::camera::Camera;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads session state and a camera, then produces output. It
/// never mutates the session; game truth is kernel-owned.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given session and camera.
    fn render(&self, session: &GameSession, camera: &Camera) -> Self::Output;
}

/// Overhead text renderer for terminals, logs and tests.
///
/// Each cell is one character with walls drawn between them. North is up.
/// `R` marks the rat, `c` an uncollected cheese, `E` the closed exit and `@`
/// the open one.
#[derive(Debug, Default)]
pub struct AsciiRenderer {
    /// Include the status header above the map.
    pub header: bool,
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self { header: true }
    }

    pub fn map_only() -> Self {
        Self { header: false }
    }

    fn cell_glyph(session: &GameSession, c: CellCoord) -> char {
        if session.rat().pose().cell() == c {
            'R'
        } else if session
            .collectibles()
            .iter()
            .any(|item| item.cell == c && !item.is_collected())
        {
            'c'
        } else if session.portal().cell == c {
            if session.portal().is_active() { '@' } else { 'E' }
        } else {
            ' '
        }
    }
}

impl Renderer for AsciiRenderer {
    type Output = String;

    fn render(&self, session: &GameSession, camera: &Camera) -> String {
        let maze = session.maze();
        let (w, h) = (maze.width(), maze.height());
        let mut out = String::new();

        if self.header {
            let status = session.status();
            let rat = session.rat();
            out.push_str(&format!(
                "=== Ratmaze (tick={}, seed={}) ===\n",
                status.tick,
                session.seed()
            ));
            out.push_str(&format!(
                "Rat: pos=({:.2}, {:.2}) heading={:.1} speed={:.2}\n",
                rat.x(),
                rat.y(),
                rat.heading(),
                rat.speed()
            ));
            out.push_str(&format!(
                "Cheese: {}/{}  Exit: {}{}\n",
                status.collected,
                status.total,
                if status.portal_active { "open" } else { "closed" },
                if status.complete { "  ESCAPED" } else { "" }
            ));
            out.push_str(&format!(
                "Camera: {} eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1})\n",
                camera.mode.label(),
                camera.eye.x,
                camera.eye.y,
                camera.eye.z,
                camera.target.x,
                camera.target.y,
                camera.target.z
            ));
        }

        // Character grid, row 0 at the bottom.
        let mut grid = vec![vec![' '; 2 * w + 1]; 2 * h + 1];
        for gy in (0..=2 * h).step_by(2) {
            for gx in (0..=2 * w).step_by(2) {
                grid[gy][gx] = '+';
            }
        }
        for (c, cell) in maze.iter_cells() {
            let (cx, cy) = (2 * c.x as usize + 1, 2 * c.y as usize + 1);
            grid[cy][cx] = Self::cell_glyph(session, c);
            if cell.has_wall(Side::Left) {
                grid[cy][cx - 1] = '|';
            }
            if cell.has_wall(Side::Right) {
                grid[cy][cx + 1] = '|';
            }
            if cell.has_wall(Side::Bottom) {
                grid[cy - 1][cx] = '-';
            }
            if cell.has_wall(Side::Top) {
                grid[cy + 1][cx] = '-';
            }
        }
        for row in grid.iter().rev() {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }
}
