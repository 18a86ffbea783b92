//! Capsule collider approximated by sampling circles along its axis.

use glam::DVec2;
use ratmaze_common::heading_vector;
use serde::{Deserialize, Serialize};

use crate::maze::MazeGrid;

/// Margin used by a plain movement check.
pub const DEFAULT_MARGIN: f64 = 0.05;
/// Margin for axis and rotated slide candidates.
pub const SLIDE_MARGIN: f64 = 0.02;
/// Margin for the last-resort micro steps.
pub const MICRO_MARGIN: f64 = 0.01;
/// Fraction of the blocked displacement a slide may cover.
pub const DEFAULT_SLIDE_AMOUNT: f64 = 0.5;
pub const MICRO_STEP: f64 = 0.05;

const AXIS_SAMPLES: usize = 4;
const STEP_FACTORS: [f64; 5] = [1.0, 0.8, 0.6, 0.4, 0.2];
const SLIDE_ANGLES: [f64; 5] = [15.0, 30.0, 45.0, 60.0, 75.0];
const SCAN_DIRECTIONS: usize = 8;
const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;
const MICRO_DIRECTIONS: [(f64, f64); 8] = [
    (1.0, 0.0),
    (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (0.0, 1.0),
    (-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    (-1.0, 0.0),
    (-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    (0.0, -1.0),
    (FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
];

/// A wall found by [`CapsuleCollider::scan_surroundings`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallHit {
    /// Unit ray direction.
    pub direction: DVec2,
    /// First sampled distance along the ray that was blocked.
    pub distance: f64,
    /// Ray angle in radians.
    pub angle: f64,
}

/// Oriented capsule standing in for the agent's footprint.
///
/// Position and direction are derived from the agent pose every tick and are
/// never authoritative on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsuleCollider {
    pub radius: f64,
    /// Length of the capsule along its heading.
    pub height: f64,
    position: DVec2,
    direction: DVec2,
}

impl CapsuleCollider {
    pub fn new(radius: f64, height: f64) -> Self {
        Self {
            radius,
            height,
            position: DVec2::ZERO,
            direction: DVec2::X,
        }
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn direction(&self) -> DVec2 {
        self.direction
    }

    /// Re-derive position and axis from the agent pose.
    pub fn update(&mut self, position: DVec2, heading_degrees: f64) {
        self.position = position;
        self.direction = heading_vector(heading_degrees);
    }

    /// Can the capsule occupy `target` with `margin` of extra clearance?
    ///
    /// Checks the centre, four points forward and backward along the axis,
    /// and two lateral points at half radius.
    pub fn check_movement(&self, maze: &MazeGrid, target: DVec2, margin: f64) -> bool {
        let r = self.radius + margin;
        if !maze.is_safe(target.x, target.y, r) {
            return false;
        }

        for i in 1..=AXIS_SAMPLES {
            let offset = i as f64 / (AXIS_SAMPLES + 1) as f64 * self.height / 2.0;
            let ahead = target + self.direction * offset;
            let behind = target - self.direction * offset;
            if !maze.is_safe(ahead.x, ahead.y, r) || !maze.is_safe(behind.x, behind.y, r) {
                return false;
            }
        }

        let side = self.direction.perp() * (r * 0.8);
        let right = target + side;
        let left = target - side;
        maze.is_safe(right.x, right.y, r * 0.5) && maze.is_safe(left.x, left.y, r * 0.5)
    }

    /// Find a reachable point near the blocked move `current -> target`.
    ///
    /// Tries, in order: a horizontal step, a vertical step, the intended
    /// direction rotated by ±15°..75°, then eight 0.05 micro steps. Each of
    /// the first three shrinks from 100% to 20% of `slide_amount × distance`.
    /// Returns `None` when nothing fits; the caller stays in place.
    pub fn calculate_slide_direction(
        &self,
        maze: &MazeGrid,
        current: DVec2,
        target: DVec2,
        slide_amount: f64,
    ) -> Option<DVec2> {
        let delta = target - current;
        let dist = delta.length();
        if dist < 0.001 {
            return None;
        }
        let n = delta / dist;

        if n.x.abs() > 0.1 {
            let step = n.x.signum() * dist * n.x.abs() * slide_amount;
            for factor in STEP_FACTORS {
                let p = DVec2::new(current.x + step * factor, current.y);
                if self.check_movement(maze, p, SLIDE_MARGIN) {
                    return Some(p);
                }
            }
        }

        if n.y.abs() > 0.1 {
            let step = n.y.signum() * dist * n.y.abs() * slide_amount;
            for factor in STEP_FACTORS {
                let p = DVec2::new(current.x, current.y + step * factor);
                if self.check_movement(maze, p, SLIDE_MARGIN) {
                    return Some(p);
                }
            }
        }

        for angle in SLIDE_ANGLES {
            for sign in [1.0, -1.0] {
                let rotated = DVec2::from_angle(sign * angle.to_radians()).rotate(n);
                for factor in STEP_FACTORS {
                    let p = current + rotated * (dist * slide_amount * factor);
                    if self.check_movement(maze, p, SLIDE_MARGIN) {
                        return Some(p);
                    }
                }
            }
        }

        MICRO_DIRECTIONS
            .iter()
            .map(|&(dx, dy)| current + DVec2::new(dx, dy) * MICRO_STEP)
            .find(|p| self.check_movement(maze, *p, MICRO_MARGIN))
    }

    /// Cast eight rays from `position` and report the first blocked sample
    /// on each, probing at 1.5, 2.5 and 3.5 times `radius`.
    pub fn scan_surroundings(&self, maze: &MazeGrid, position: DVec2, radius: f64) -> Vec<WallHit> {
        let mut hits = Vec::new();
        for i in 0..SCAN_DIRECTIONS {
            let angle = i as f64 / SCAN_DIRECTIONS as f64 * std::f64::consts::TAU;
            let direction = DVec2::from_angle(angle);
            for k in 0..3 {
                let distance = radius * (1.5 + k as f64);
                let sample = position + direction * distance;
                if !maze.is_safe(sample.x, sample.y, radius * 0.5) {
                    hits.push(WallHit {
                        direction,
                        distance,
                        angle,
                    });
                    break;
                }
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRandom;

    fn boxed_cell() -> MazeGrid {
        MazeGrid::walled(1, 1).unwrap()
    }

    fn collider_at(pos: DVec2, heading: f64) -> CapsuleCollider {
        let mut c = CapsuleCollider::new(0.15, 0.4);
        c.update(pos, heading);
        c
    }

    #[test]
    fn update_derives_axis_from_heading() {
        let c = collider_at(DVec2::new(0.5, 0.5), 90.0);
        assert!(c.direction().x.abs() < 1e-12);
        assert!((c.direction().y - 1.0).abs() < 1e-12);
        assert_eq!(c.position(), DVec2::new(0.5, 0.5));
    }

    #[test]
    fn centre_of_closed_cell_is_accepted() {
        let maze = boxed_cell();
        let c = collider_at(DVec2::new(0.5, 0.5), 0.0);
        assert!(c.check_movement(&maze, DVec2::new(0.5, 0.5), DEFAULT_MARGIN));
    }

    #[test]
    fn capsule_axis_reaches_further_than_its_radius() {
        let maze = boxed_cell();
        // Clear as a circle but the forward axis samples hit the right wall.
        let target = DVec2::new(0.7, 0.5);
        assert!(maze.is_safe(target.x, target.y, 0.15 + DEFAULT_MARGIN));
        let facing_wall = collider_at(target, 0.0);
        assert!(!facing_wall.check_movement(&maze, target, DEFAULT_MARGIN));
        let facing_up = collider_at(target, 90.0);
        assert!(facing_up.check_movement(&maze, target, DEFAULT_MARGIN));
    }

    #[test]
    fn slide_prefers_axis_aligned_step() {
        let maze = boxed_cell();
        let current = DVec2::new(0.5, 0.5);
        let c = collider_at(current, 90.0);
        // Moving up and to the right, but the top band is blocked.
        let target = DVec2::new(0.6, 0.95);
        assert!(!c.check_movement(&maze, target, DEFAULT_MARGIN));
        let p = c
            .calculate_slide_direction(&maze, current, target, DEFAULT_SLIDE_AMOUNT)
            .unwrap();
        assert_eq!(p.y, current.y);
        assert!(p.x > current.x);
    }

    #[test]
    fn slide_falls_back_to_vertical_step() {
        let maze = boxed_cell();
        // Lateral samples already touch the right wall: no room to go +x.
        let current = DVec2::new(0.75, 0.5);
        let c = collider_at(current, 90.0);
        assert!(c.check_movement(&maze, current, SLIDE_MARGIN));
        let target = DVec2::new(0.95, 0.7);
        let p = c
            .calculate_slide_direction(&maze, current, target, DEFAULT_SLIDE_AMOUNT)
            .unwrap();
        assert!((p - DVec2::new(0.75, 0.6)).length() < 1e-9, "{p:?}");
    }

    #[test]
    fn slide_tries_rotated_direction_when_axes_fail() {
        let maze = boxed_cell();
        // The shortest horizontal step (0.1) overshoots; 15° off axis fits.
        let current = DVec2::new(0.661, 0.5);
        let c = collider_at(current, 90.0);
        let target = current + DVec2::X;
        assert!(!c.check_movement(&maze, current + DVec2::new(0.1, 0.0), SLIDE_MARGIN));
        let p = c
            .calculate_slide_direction(&maze, current, target, DEFAULT_SLIDE_AMOUNT)
            .unwrap();
        let step = p - current;
        assert!((step.length() - 0.1).abs() < 1e-9);
        assert!((step.y.atan2(step.x).to_degrees() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn zero_length_move_has_no_slide() {
        let maze = boxed_cell();
        let current = DVec2::new(0.5, 0.5);
        let c = collider_at(current, 0.0);
        assert_eq!(
            c.calculate_slide_direction(&maze, current, current, DEFAULT_SLIDE_AMOUNT),
            None
        );
    }

    #[test]
    fn concave_corner_escapes_by_micro_step() {
        let maze = boxed_cell();
        // Wedged into the bottom-left corner, facing it.
        let current = DVec2::new(0.305, 0.305);
        let c = collider_at(current, 225.0);
        assert!(c.check_movement(&maze, current, SLIDE_MARGIN));
        let target = current + DVec2::new(-0.07, -0.07);
        assert!(!c.check_movement(&maze, target, DEFAULT_MARGIN));

        let p = c
            .calculate_slide_direction(&maze, current, target, DEFAULT_SLIDE_AMOUNT)
            .expect("corner must not trap the capsule");
        assert!(((p - current).length() - MICRO_STEP).abs() < 1e-9);
        assert!(c.check_movement(&maze, p, MICRO_MARGIN));
    }

    #[test]
    fn nothing_fits_in_a_cell_smaller_than_the_capsule() {
        let maze = boxed_cell();
        let mut c = CapsuleCollider::new(0.45, 0.4);
        c.update(DVec2::new(0.5, 0.5), 0.0);
        let slide = c.calculate_slide_direction(
            &maze,
            DVec2::new(0.5, 0.5),
            DVec2::new(0.6, 0.5),
            DEFAULT_SLIDE_AMOUNT,
        );
        assert_eq!(slide, None);
    }

    #[test]
    fn scan_reports_nearby_walls_only() {
        let maze = boxed_cell();
        let c = collider_at(DVec2::new(0.5, 0.5), 0.0);
        // From the centre only the cardinal rays reach a wall, on the last sample.
        let hits = c.scan_surroundings(&maze, DVec2::new(0.5, 0.5), 0.15);
        assert_eq!(hits.len(), 4);
        assert!(hits.iter().all(|h| (h.distance - 0.525).abs() < 1e-9));

        let near_right = c.scan_surroundings(&maze, DVec2::new(0.7, 0.5), 0.15);
        let east = near_right.iter().find(|h| h.angle == 0.0).unwrap();
        assert!((east.distance - 0.225).abs() < 1e-9);
    }

    #[test]
    fn scan_in_open_maze_returns_unit_directions() {
        let maze = MazeGrid::generate(6, 6, &mut SeededRandom::new(4)).unwrap();
        let c = collider_at(DVec2::new(2.5, 2.5), 0.0);
        for hit in c.scan_surroundings(&maze, DVec2::new(2.5, 2.5), 0.15) {
            assert!((hit.direction.length() - 1.0).abs() < 1e-9);
        }
    }
}
