use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Integer address of a maze cell: `x` is the column, `y` is the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing a continuous position.
    pub fn containing(pos: DVec2) -> Self {
        Self {
            x: pos.x.floor() as i32,
            y: pos.y.floor() as i32,
        }
    }

    /// Continuous position of the cell centre.
    pub fn center(self) -> DVec2 {
        DVec2::new(self.x as f64 + 0.5, self.y as f64 + 0.5)
    }

    /// The neighbouring coordinate across `side` (not bounds-checked).
    pub fn step(self, side: Side) -> Self {
        let (dx, dy) = side.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four sides of a cell. `Top` faces +Y, `Bottom` faces -Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Bottom,
    Right,
    Top,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Bottom, Side::Right, Side::Top];

    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Top => Side::Bottom,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Side::Left => (-1, 0),
            Side::Right => (1, 0),
            Side::Bottom => (0, -1),
            Side::Top => (0, 1),
        }
    }
}

/// Unit vector for a heading given in degrees.
pub fn heading_vector(degrees: f64) -> DVec2 {
    let radians = degrees.to_radians();
    DVec2::new(radians.cos(), radians.sin())
}

/// Authoritative agent pose: continuous position, heading and velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: DVec2,
    /// Heading in degrees.
    pub heading: f64,
    pub velocity: DVec2,
}

impl Pose {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            position: DVec2::new(x, y),
            heading,
            velocity: DVec2::ZERO,
        }
    }

    pub fn forward(&self) -> DVec2 {
        heading_vector(self.heading)
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    pub fn cell(&self) -> CellCoord {
        CellCoord::containing(self.position)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(0.5, 0.5, 90.0)
    }
}

/// Movement intents for one simulation tick, produced by an input-mapping
/// collaborator. The core never reads input devices itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub forward: bool,
    pub backward: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
}

impl MoveIntent {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn forward() -> Self {
        Self {
            forward: true,
            ..Self::default()
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_floors_negative_positions() {
        assert_eq!(CellCoord::containing(DVec2::new(2.7, 0.1)), CellCoord::new(2, 0));
        assert_eq!(CellCoord::containing(DVec2::new(-0.1, 3.0)), CellCoord::new(-1, 3));
    }

    #[test]
    fn opposite_sides_round_trip() {
        for side in Side::ALL {
            assert_eq!(side.opposite().opposite(), side);
            let (dx, dy) = side.delta();
            let (ox, oy) = side.opposite().delta();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn heading_ninety_points_up() {
        let v = heading_vector(90.0);
        assert!(v.x.abs() < 1e-12);
        assert!((v.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn intent_idle_and_forward() {
        assert!(MoveIntent::idle().is_idle());
        let f = MoveIntent::forward();
        assert!(f.forward);
        assert!(!f.is_idle());
    }

    #[test]
    fn default_pose_is_start_cell_centre() {
        let p = Pose::default();
        assert_eq!(p.cell(), CellCoord::new(0, 0));
        assert_eq!(p.position, CellCoord::new(0, 0).center());
        assert_eq!(p.speed(), 0.0);
    }
}
