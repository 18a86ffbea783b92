//! Point and circle queries against the maze walls.
//!
//! Only the wall flags of the cell containing the query point are consulted.
//! This relies on generation keeping shared walls mirrored between neighbours.

use ratmaze_common::CellCoord;

use crate::maze::MazeGrid;

/// Added to every radius passed to [`MazeGrid::is_safe`].
pub const SAFETY_MARGIN: f64 = 0.02;
/// Distance from two sides within which the corner test applies.
pub const CORNER_THRESHOLD: f64 = 0.1;
/// Band along each wall that [`MazeGrid::is_wall`] treats as solid.
pub const WALL_THRESHOLD: f64 = 0.05;

impl MazeGrid {
    /// Whether a circle of `radius` centred at `(x, y)` clears every present
    /// wall of its cell. Out-of-bounds and non-finite positions are unsafe.
    pub fn is_safe(&self, x: f64, y: f64, radius: f64) -> bool {
        if !(x.is_finite() && y.is_finite() && radius.is_finite()) {
            return false;
        }
        let cx = x.floor();
        let cy = y.floor();
        let coord = CellCoord::new(cx as i32, cy as i32);
        let Some(cell) = self.cell(coord) else {
            return false;
        };
        let ox = x - cx;
        let oy = y - cy;
        let r = radius + SAFETY_MARGIN;

        if cell.has_wall_bottom && oy - r < 0.0 {
            return false;
        }
        if cell.has_wall_top && oy + r > 1.0 {
            return false;
        }
        if cell.has_wall_left && ox - r < 0.0 {
            return false;
        }
        if cell.has_wall_right && ox + r > 1.0 {
            return false;
        }

        let near_left = ox < CORNER_THRESHOLD;
        let near_right = ox > 1.0 - CORNER_THRESHOLD;
        let near_bottom = oy < CORNER_THRESHOLD;
        let near_top = oy > 1.0 - CORNER_THRESHOLD;
        let corners = [
            (near_left && near_bottom, cell.has_wall_left && cell.has_wall_bottom, ox, oy),
            (near_left && near_top, cell.has_wall_left && cell.has_wall_top, ox, 1.0 - oy),
            (near_right && near_bottom, cell.has_wall_right && cell.has_wall_bottom, 1.0 - ox, oy),
            (near_right && near_top, cell.has_wall_right && cell.has_wall_top, 1.0 - ox, 1.0 - oy),
        ];
        for (near, walled, dx, dy) in corners {
            if near && walled && (dx * dx + dy * dy).sqrt() < r {
                return false;
            }
        }

        true
    }

    /// Coarse point test: is `(x, y)` within [`WALL_THRESHOLD`] of a present
    /// wall of cell `(cell_x, cell_y)`? Out-of-bounds cells are always walls.
    pub fn is_wall(&self, cell_x: i32, cell_y: i32, x: f64, y: f64) -> bool {
        let Some(cell) = self.cell(CellCoord::new(cell_x, cell_y)) else {
            return true;
        };
        let lx = x - cell_x as f64;
        let ly = y - cell_y as f64;

        (cell.has_wall_left && lx < WALL_THRESHOLD)
            || (cell.has_wall_bottom && ly < WALL_THRESHOLD)
            || (cell.has_wall_right && lx > 1.0 - WALL_THRESHOLD)
            || (cell.has_wall_top && ly > 1.0 - WALL_THRESHOLD)
    }
}
