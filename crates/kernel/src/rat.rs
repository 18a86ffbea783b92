use std::collections::VecDeque;

use glam::DVec2;
use ratmaze_common::{Pose, heading_vector};
use serde::{Deserialize, Serialize};

use crate::collider::{CapsuleCollider, DEFAULT_MARGIN, DEFAULT_SLIDE_AMOUNT};
use crate::config::RatTuning;
use crate::maze::MazeGrid;

/// Cosine above which a scanned wall counts as straight ahead.
const HEAD_ON_DOT: f64 = 0.7;
/// Share of the speed overshoot kept by the soft velocity cap.
const OVERSHOOT_KEEP: f64 = 0.2;

/// How a movement request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// The requested position was accepted.
    Moved,
    /// Blocked; committed to an alternative point instead.
    Slid { displacement: DVec2 },
    /// Blocked with no alternative; position unchanged.
    Blocked,
}

impl MoveOutcome {
    pub fn moved(&self) -> bool {
        !matches!(self, MoveOutcome::Blocked)
    }
}

/// The player agent and its movement integration.
///
/// Owns the authoritative [`Pose`]. The collider is re-derived from the pose
/// on every call and never persists state of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rat {
    pose: Pose,
    tuning: RatTuning,
    collider: CapsuleCollider,
    history: VecDeque<DVec2>,
}

impl Rat {
    pub fn new(x: f64, y: f64, heading: f64, tuning: RatTuning) -> Self {
        let mut collider = CapsuleCollider::new(tuning.radius, tuning.capsule_height);
        collider.update(DVec2::new(x, y), heading);
        Self {
            pose: Pose::new(x, y, heading),
            history: VecDeque::with_capacity(tuning.history_length + 1),
            tuning,
            collider,
        }
    }

    /// Put the rat at a new pose at rest, clearing its history.
    pub fn place(&mut self, x: f64, y: f64, heading: f64) {
        self.pose = Pose::new(x, y, heading);
        self.history.clear();
        self.sync_collider();
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn position(&self) -> DVec2 {
        self.pose.position
    }

    pub fn x(&self) -> f64 {
        self.pose.position.x
    }

    pub fn y(&self) -> f64 {
        self.pose.position.y
    }

    pub fn heading(&self) -> f64 {
        self.pose.heading
    }

    pub fn velocity(&self) -> DVec2 {
        self.pose.velocity
    }

    pub fn speed(&self) -> f64 {
        self.pose.velocity.length()
    }

    pub fn tuning(&self) -> &RatTuning {
        &self.tuning
    }

    pub fn collider(&self) -> &CapsuleCollider {
        &self.collider
    }

    /// Pre-move positions, newest first.
    pub fn history(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.history.iter().copied()
    }

    /// Mean of the position history, or the current position when empty.
    pub fn smoothed_position(&self) -> DVec2 {
        if self.history.is_empty() {
            return self.pose.position;
        }
        self.history.iter().copied().sum::<DVec2>() / self.history.len() as f64
    }

    /// Accelerate along the heading and move, sliding along walls when blocked.
    pub fn scurry_forward(&mut self, maze: &MazeGrid, dt: f64) -> MoveOutcome {
        let dir = heading_vector(self.pose.heading);
        self.drive(maze, dt, dir)
    }

    /// Same as [`Rat::scurry_forward`] with the heading reversed.
    pub fn scurry_backward(&mut self, maze: &MazeGrid, dt: f64) -> MoveOutcome {
        let dir = -heading_vector(self.pose.heading);
        self.drive(maze, dt, dir)
    }

    /// Sidestep perpendicular to the heading without touching velocity.
    pub fn strafe(&mut self, maze: &MazeGrid, dt: f64, left: bool) -> MoveOutcome {
        let side = heading_vector(self.pose.heading).perp();
        let side = if left { side } else { -side };
        let step = side * self.tuning.strafe_factor * self.tuning.max_velocity * dt;
        let current = self.pose.position;
        let target = current + step;
        self.sync_collider();

        let outcome = if self.collider.check_movement(maze, target, DEFAULT_MARGIN) {
            self.pose.position = target;
            MoveOutcome::Moved
        } else if let Some(p) =
            self.collider
                .calculate_slide_direction(maze, current, target, DEFAULT_SLIDE_AMOUNT)
        {
            self.pose.position = p;
            MoveOutcome::Slid {
                displacement: p - current,
            }
        } else {
            MoveOutcome::Blocked
        };
        self.sync_collider();
        outcome
    }

    /// Bleed off speed when there is no drive input. The loss grows with
    /// speed and never overshoots past zero.
    pub fn apply_deceleration(&mut self, dt: f64) {
        let speed = self.speed();
        if speed <= 0.0 {
            return;
        }
        let amount = self.tuning.deceleration * dt * (1.0 + speed * 0.5);
        if amount >= speed {
            self.pose.velocity = DVec2::ZERO;
        } else {
            self.pose.velocity *= (speed - amount) / speed;
        }
    }

    /// Rotate counter-clockwise in place. Always legal.
    pub fn spin_left(&mut self, dt: f64) {
        self.turn(self.tuning.spin_speed * dt);
    }

    /// Rotate clockwise in place. Always legal.
    pub fn spin_right(&mut self, dt: f64) {
        self.turn(-self.tuning.spin_speed * dt);
    }

    fn turn(&mut self, degrees: f64) {
        self.pose.heading = (self.pose.heading + degrees).rem_euclid(360.0);
        self.sync_collider();
    }

    fn sync_collider(&mut self) {
        self.collider.update(self.pose.position, self.pose.heading);
    }

    fn record_history(&mut self, p: DVec2) {
        self.history.push_front(p);
        self.history.truncate(self.tuning.history_length);
    }

    /// Damping factor in (0, 1] for walls straight ahead within the
    /// lookahead distance.
    fn approach_multiplier(&self, maze: &MazeGrid, dir: DVec2) -> f64 {
        let lookahead = self.tuning.corner_avoidance_distance;
        if lookahead <= 0.0 {
            return 1.0;
        }
        self.collider
            .scan_surroundings(maze, self.pose.position, self.tuning.radius)
            .iter()
            .filter(|hit| dir.dot(hit.direction) > HEAD_ON_DOT && hit.distance < lookahead)
            .map(|hit| hit.distance / lookahead)
            .fold(1.0, f64::min)
    }

    fn drive(&mut self, maze: &MazeGrid, dt: f64, dir: DVec2) -> MoveOutcome {
        let t = &self.tuning;
        let multiplier = self.approach_multiplier(maze, dir);

        let mut velocity = self.pose.velocity + dir * t.acceleration * multiplier * dt;
        let speed = velocity.length();
        if speed > t.max_velocity {
            velocity *= (t.max_velocity + (speed - t.max_velocity) * OVERSHOOT_KEEP) / speed;
        }
        self.pose.velocity = velocity;

        let current = self.pose.position;
        self.record_history(current);
        let target = current + velocity * dt;
        self.sync_collider();

        let outcome = if self.collider.check_movement(maze, target, DEFAULT_MARGIN) {
            self.pose.position = target;
            MoveOutcome::Moved
        } else if let Some(p) =
            self.collider
                .calculate_slide_direction(maze, current, target, DEFAULT_SLIDE_AMOUNT)
        {
            // Measured before committing so the slide direction is the one
            // actually travelled.
            let displacement = p - current;
            self.pose.position = p;
            let len = displacement.length();
            if len > 0.001 {
                let along = displacement / len;
                let kept = velocity.dot(along) * self.tuning.friction;
                self.pose.velocity = along * kept + along.perp() * self.tuning.wall_bounce;
            }
            tracing::trace!(?displacement, "slid along wall");
            MoveOutcome::Slid { displacement }
        } else {
            // Bounce scales with the speed before the soft cap.
            self.pose.velocity = -dir * speed * self.tuning.wall_bounce;
            tracing::trace!(pos = ?current, "movement blocked");
            MoveOutcome::Blocked
        };

        self.sync_collider();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRandom;
    use ratmaze_common::Side;

    fn rat_at(x: f64, y: f64, heading: f64) -> Rat {
        Rat::new(x, y, heading, RatTuning::default())
    }

    #[test]
    fn spin_is_rate_times_dt() {
        let mut rat = rat_at(0.5, 0.5, 90.0);
        rat.spin_left(0.5);
        assert!((rat.heading() - 150.0).abs() < 1e-9);
        rat.spin_right(1.0);
        assert!((rat.heading() - 30.0).abs() < 1e-9);
        rat.spin_right(0.5);
        assert!((rat.heading() - 330.0).abs() < 1e-9);
    }

    #[test]
    fn spin_does_not_move() {
        let mut rat = rat_at(0.5, 0.5, 0.0);
        rat.spin_left(0.1);
        assert_eq!(rat.position(), DVec2::new(0.5, 0.5));
    }

    #[test]
    fn forward_in_open_space_moves_along_heading() {
        // A one-column maze is a straight vertical corridor.
        let maze = MazeGrid::generate(1, 3, &mut SeededRandom::new(1)).unwrap();
        let mut rat = rat_at(0.5, 0.5, 90.0);
        let outcome = rat.scurry_forward(&maze, 0.05);
        assert_eq!(outcome, MoveOutcome::Moved);
        assert!(rat.y() > 0.5);
        assert!((rat.x() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn velocity_cap_is_soft() {
        let maze = MazeGrid::generate(1, 20, &mut SeededRandom::new(1)).unwrap();
        let mut rat = rat_at(0.5, 0.5, 90.0);
        let mut peak: f64 = 0.0;
        for _ in 0..30 {
            rat.scurry_forward(&maze, 0.05);
            peak = peak.max(rat.speed());
        }
        let max = rat.tuning().max_velocity;
        assert!(peak > max, "overshoot is partially preserved");
        assert!(peak < max + rat.tuning().acceleration * 0.05);
    }

    #[test]
    fn history_is_bounded_and_newest_first() {
        let maze = MazeGrid::generate(1, 20, &mut SeededRandom::new(1)).unwrap();
        let mut rat = rat_at(0.5, 0.5, 90.0);
        assert_eq!(rat.smoothed_position(), rat.position());
        let mut before = Vec::new();
        for _ in 0..5 {
            before.push(rat.position());
            rat.scurry_forward(&maze, 0.05);
        }
        let hist: Vec<DVec2> = rat.history().collect();
        assert_eq!(hist.len(), 3);
        assert_eq!(hist[0], before[4]);
        assert_eq!(hist[2], before[2]);
        let mean = (before[2] + before[3] + before[4]) / 3.0;
        assert!((rat.smoothed_position() - mean).length() < 1e-12);
    }

    #[test]
    fn deceleration_clamps_to_zero() {
        let maze = MazeGrid::generate(1, 20, &mut SeededRandom::new(1)).unwrap();
        let mut rat = rat_at(0.5, 0.5, 90.0);
        for _ in 0..10 {
            rat.scurry_forward(&maze, 0.05);
        }
        let before = rat.speed();
        rat.apply_deceleration(0.01);
        let after = rat.speed();
        assert!(after < before && after > 0.0);
        rat.apply_deceleration(1.0);
        assert_eq!(rat.velocity(), DVec2::ZERO);
        rat.apply_deceleration(1.0);
        assert_eq!(rat.velocity(), DVec2::ZERO);
    }

    #[test]
    fn head_on_wall_never_crossed() {
        let mut rng = SeededRandom::new(5);
        let maze = MazeGrid::generate(10, 8, &mut rng).unwrap();
        // (0,0) always keeps its boundary left wall; face it.
        let mut rat = rat_at(0.5, 0.5, 180.0);
        let r = rat.tuning().radius;
        for _ in 0..20 {
            rat.scurry_forward(&maze, 0.05);
            assert!(rat.x() >= r - 1e-9, "crossed left wall: x = {}", rat.x());
        }
        assert!(maze.has_wall(rat.pose().cell(), Side::Left));
    }

    #[test]
    fn backward_moves_against_heading() {
        let maze = MazeGrid::generate(1, 20, &mut SeededRandom::new(1)).unwrap();
        let mut rat = rat_at(0.5, 10.5, 90.0);
        rat.scurry_backward(&maze, 0.05);
        assert!(rat.y() < 10.5);
    }

    #[test]
    fn strafe_moves_sideways_and_keeps_velocity() {
        let maze = MazeGrid::generate(20, 1, &mut SeededRandom::new(1)).unwrap();
        let mut rat = rat_at(10.5, 0.5, 90.0);
        let outcome = rat.strafe(&maze, 0.1, true);
        assert_eq!(outcome, MoveOutcome::Moved);
        assert!(rat.x() < 10.5);
        assert_eq!(rat.velocity(), DVec2::ZERO);
        rat.strafe(&maze, 0.1, false);
        rat.strafe(&maze, 0.1, false);
        assert!(rat.x() > 10.5);
    }

    /// Velocity `drive` reaches before resolving collisions.
    fn driven_velocity(rat: &Rat, maze: &MazeGrid, dir: DVec2, dt: f64) -> DVec2 {
        let t = rat.tuning();
        let mut v = rat.velocity() + dir * t.acceleration * rat.approach_multiplier(maze, dir) * dt;
        let speed = v.length();
        if speed > t.max_velocity {
            v *= (t.max_velocity + (speed - t.max_velocity) * OVERSHOOT_KEEP) / speed;
        }
        v
    }

    #[test]
    fn slide_reprojects_velocity_onto_travelled_direction() {
        let maze = MazeGrid::generate(20, 1, &mut SeededRandom::new(1)).unwrap();
        let mut rat = rat_at(2.5, 0.5, 30.0);
        let dir = heading_vector(30.0);
        let dt = 0.05;
        let mut slid = false;
        for _ in 0..60 {
            let before = driven_velocity(&rat, &maze, dir, dt);
            match rat.scurry_forward(&maze, dt) {
                MoveOutcome::Moved => continue,
                MoveOutcome::Slid { displacement } => {
                    // Ceiling blocks the climb; the horizontal step is taken.
                    assert_eq!(displacement.y, 0.0);
                    assert!(displacement.x > 0.0);
                    let v = rat.velocity();
                    assert!((v.x - before.x * rat.tuning().friction).abs() < 1e-12);
                    assert!((v.y - rat.tuning().wall_bounce).abs() < 1e-12);
                    slid = true;
                    break;
                }
                MoveOutcome::Blocked => panic!("corridor move should slide"),
            }
        }
        assert!(slid);
    }

    #[test]
    fn blocked_move_bounces_with_uncapped_speed() {
        let maze = MazeGrid::walled(1, 1).unwrap();
        let tuning = RatTuning {
            radius: 0.45,
            max_velocity: 0.1,
            ..RatTuning::default()
        };
        let mut rat = Rat::new(0.5, 0.5, 0.0, tuning);
        let dt = 0.1;
        // 2.8 * 0.1 = 0.28 before the cap, 0.136 after it.
        let outcome = rat.scurry_forward(&maze, dt);
        assert_eq!(outcome, MoveOutcome::Blocked);
        assert_eq!(rat.position(), DVec2::new(0.5, 0.5));
        let expected = -DVec2::X * 0.28 * rat.tuning().wall_bounce;
        assert!((rat.velocity() - expected).length() < 1e-12, "{:?}", rat.velocity());
    }

    #[test]
    fn acceleration_damped_only_toward_close_walls() {
        let maze = MazeGrid::walled(1, 1).unwrap();
        let rat = rat_at(0.7, 0.5, 0.0);
        // East ray hits at 1.5 r = 0.225 < 0.25.
        let facing = rat.approach_multiplier(&maze, DVec2::X);
        assert!((facing - 0.9).abs() < 1e-12);
        assert_eq!(rat.approach_multiplier(&maze, DVec2::NEG_X), 1.0);
    }

    #[test]
    fn corner_input_never_traps_the_rat() {
        let maze = MazeGrid::walled(1, 1).unwrap();
        let mut rat = rat_at(0.5, 0.5, 225.0);
        let mut moving_ticks = 0;
        for _ in 0..200 {
            if rat.scurry_forward(&maze, 0.05).moved() {
                moving_ticks += 1;
            }
            let p = rat.position();
            assert!(maze.is_safe(p.x, p.y, rat.tuning().radius));
        }
        assert!(moving_ticks > 100);
    }
}
