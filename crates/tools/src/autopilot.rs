use glam::DVec2;
use ratmaze_common::{CellCoord, MoveIntent};
use ratmaze_kernel::GameSession;

use crate::inspector::MazeInspector;

/// Distance to a waypoint centre at which the next waypoint takes over.
const ARRIVE_DISTANCE: f64 = 0.25;
/// Heading error below which no turn is issued, in degrees.
const TURN_DEADBAND: f64 = 5.0;
/// Heading error above which the rat stops driving and only turns.
const DRIVE_CONE: f64 = 20.0;
/// Close to a waypoint, coast while faster than this.
const BRAKE_SPEED: f64 = 0.5;
const BRAKE_DISTANCE: f64 = 0.4;

/// Produces intents that walk the rat to each remaining cheese, nearest
/// first, and then to the exit.
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    goal: Option<CellCoord>,
    route: Vec<CellCoord>,
    next: usize,
    replans: usize,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell the autopilot is currently heading for.
    pub fn goal(&self) -> Option<CellCoord> {
        self.goal
    }

    pub fn route(&self) -> &[CellCoord] {
        &self.route
    }

    /// Times the route was recomputed.
    pub fn replans(&self) -> usize {
        self.replans
    }

    /// Intent for the next tick.
    pub fn intent(&mut self, session: &GameSession) -> MoveIntent {
        if session.is_complete() {
            return MoveIntent::idle();
        }
        let rat = session.rat();
        let here = rat.pose().cell();
        if self.needs_replan(session, here) {
            self.replan(session, here);
        }
        let Some(mut target) = self.route.get(self.next).map(|c| c.center()) else {
            return MoveIntent::idle();
        };
        let pos = rat.position();
        if pos.distance(target) < ARRIVE_DISTANCE && self.next + 1 < self.route.len() {
            self.next += 1;
            target = self.route[self.next].center();
        }
        steer(pos, rat.heading(), rat.speed(), target)
    }

    fn goal_is_live(&self, session: &GameSession) -> bool {
        let Some(goal) = self.goal else {
            return false;
        };
        if goal == session.portal().cell {
            return session.all_collected();
        }
        session
            .collectibles()
            .iter()
            .any(|item| item.cell == goal && !item.is_collected())
    }

    fn needs_replan(&self, session: &GameSession, here: CellCoord) -> bool {
        if !self.goal_is_live(session) || self.next >= self.route.len() {
            return true;
        }
        // Drifted off the route: neither in the cell being left nor the one ahead.
        let behind = self.next.checked_sub(1).map(|i| self.route[i]);
        here != self.route[self.next] && behind != Some(here)
    }

    fn replan(&mut self, session: &GameSession, here: CellCoord) {
        let maze = session.maze();
        let mut candidates: Vec<CellCoord> = session
            .collectibles()
            .iter()
            .filter(|item| !item.is_collected())
            .map(|item| item.cell)
            .collect();
        if candidates.is_empty() {
            candidates.push(session.portal().cell);
        }
        let best = candidates
            .into_iter()
            .filter_map(|goal| MazeInspector::shortest_path(maze, here, goal).map(|p| (goal, p)))
            .min_by_key(|(_, path)| path.len());

        self.replans += 1;
        match best {
            Some((goal, path)) => {
                tracing::debug!(%goal, steps = path.len() - 1, "autopilot route planned");
                self.next = usize::from(path.len() > 1);
                self.goal = Some(goal);
                self.route = path;
            }
            None => {
                tracing::debug!(%here, "autopilot found no route");
                self.goal = None;
                self.route.clear();
                self.next = 0;
            }
        }
    }
}

/// Turn toward `target`, driving forward only when roughly facing it.
fn steer(pos: DVec2, heading: f64, speed: f64, target: DVec2) -> MoveIntent {
    let to = target - pos;
    let desired = to.y.atan2(to.x).to_degrees();
    let error = (desired - heading + 180.0).rem_euclid(360.0) - 180.0;
    let braking = to.length() < BRAKE_DISTANCE && speed > BRAKE_SPEED;
    MoveIntent {
        forward: error.abs() < DRIVE_CONE && !braking,
        turn_left: error > TURN_DEADBAND,
        turn_right: error < -TURN_DEADBAND,
        ..MoveIntent::default()
    }
}
