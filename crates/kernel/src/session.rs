use glam::DVec2;
use ratmaze_common::{CellCoord, MoveIntent};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, GameConfig};
use crate::maze::MazeGrid;
use crate::objects::{Collectible, ExitPortal};
use crate::rat::{MoveOutcome, Rat};
use crate::rng::SeededRandom;

/// Start pose of the rat: centre of cell (0,0), facing +Y.
pub const START_POSE: (f64, f64, f64) = (0.5, 0.5, 90.0);

/// Gameplay milestones, appended to the session log as they happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    CollectiblePicked {
        index: usize,
        cell: CellCoord,
        tick: u64,
    },
    PortalActivated { tick: u64 },
    Escaped { tick: u64 },
}

/// What happened during one [`GameSession::step`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub tick: u64,
    /// Delta time actually simulated, after clamping.
    pub dt: f64,
    /// Forward/backward resolution, if a drive intent was given.
    pub movement: Option<MoveOutcome>,
    pub strafe: Option<MoveOutcome>,
    /// Indices of collectibles picked this tick.
    pub picked: Vec<usize>,
    pub portal_activated: bool,
    pub escaped: bool,
}

/// Snapshot of progress for HUDs and renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatus {
    pub collected: usize,
    pub total: usize,
    pub portal_active: bool,
    pub complete: bool,
    pub tick: u64,
}

/// One run of the game: maze, rat, collectibles and exit, advanced one tick
/// per rendered frame by a single control loop.
///
/// # Invariants
/// - The maze topology is fixed after construction.
/// - Collectibles only go from uncollected to collected; the portal only
///   from inactive to active.
/// - Once complete, further steps change nothing.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    seed: u32,
    rng: SeededRandom,
    maze: MazeGrid,
    rat: Rat,
    collectibles: Vec<Collectible>,
    portal: ExitPortal,
    tick: u64,
    complete: bool,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Validate `config`, generate the maze and place collectibles.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(clock_seed);
        let mut rng = SeededRandom::new(seed);
        let mut maze = MazeGrid::generate(config.width, config.height, &mut rng)?;
        maze.place_collectibles(config.max_collectibles, &mut rng);
        Self::assemble(config, seed, rng, maze)
    }

    /// Start a session on a prepared maze, using its collectible set as is.
    pub fn from_maze(config: GameConfig, maze: MazeGrid) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(clock_seed);
        Self::assemble(config, seed, SeededRandom::new(seed), maze)
    }

    fn assemble(
        config: GameConfig,
        seed: u32,
        rng: SeededRandom,
        maze: MazeGrid,
    ) -> Result<Self, ConfigError> {
        let (x, y, heading) = START_POSE;
        let rat = Rat::new(x, y, heading, config.rat.clone());
        let collectibles = maze.collectibles().iter().copied().map(Collectible::new).collect::<Vec<_>>();
        let portal = ExitPortal::new(maze.exit());
        tracing::info!(
            seed,
            width = maze.width(),
            height = maze.height(),
            collectibles = collectibles.len(),
            "session started"
        );
        Ok(Self {
            config,
            seed,
            rng,
            maze,
            rat,
            collectibles,
            portal,
            tick: 0,
            complete: false,
            events: Vec::new(),
        })
    }

    /// Advance one tick. `dt` is clamped to `[0, max_dt]`; non-finite values
    /// count as zero.
    pub fn step(&mut self, intent: MoveIntent, dt: f64) -> StepReport {
        if self.complete {
            return StepReport {
                tick: self.tick,
                ..StepReport::default()
            };
        }
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_dt)
        } else {
            0.0
        };
        self.tick += 1;
        let _span = tracing::debug_span!("session_step", tick = self.tick).entered();
        let mut report = StepReport {
            tick: self.tick,
            dt,
            ..StepReport::default()
        };

        if intent.turn_left {
            self.rat.spin_left(dt);
        }
        if intent.turn_right {
            self.rat.spin_right(dt);
        }

        report.movement = match (intent.forward, intent.backward) {
            (true, false) => Some(self.rat.scurry_forward(&self.maze, dt)),
            (false, true) => Some(self.rat.scurry_backward(&self.maze, dt)),
            _ => {
                self.rat.apply_deceleration(dt);
                None
            }
        };

        report.strafe = match (intent.strafe_left, intent.strafe_right) {
            (true, false) => Some(self.rat.strafe(&self.maze, dt, true)),
            (false, true) => Some(self.rat.strafe(&self.maze, dt, false)),
            _ => None,
        };

        let pos = self.rat.position();
        for (index, item) in self.collectibles.iter_mut().enumerate() {
            if item.check_collision(pos, self.config.collect_radius) {
                tracing::debug!(index, cell = ?item.cell, "collectible picked");
                report.picked.push(index);
                self.events.push(GameEvent::CollectiblePicked {
                    index,
                    cell: item.cell,
                    tick: self.tick,
                });
            }
        }

        let all_collected = self.all_collected();
        if all_collected && self.portal.activate() {
            tracing::debug!(tick = self.tick, "exit portal activated");
            report.portal_activated = true;
            self.events.push(GameEvent::PortalActivated { tick: self.tick });
        }

        if self
            .portal
            .check_collision(pos, all_collected, self.config.exit_radius)
        {
            self.complete = true;
            report.escaped = true;
            self.events.push(GameEvent::Escaped { tick: self.tick });
            tracing::info!(tick = self.tick, "rat escaped the maze");
        }

        report
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// The RNG stream after generation and placement.
    pub fn rng(&self) -> &SeededRandom {
        &self.rng
    }

    pub fn maze(&self) -> &MazeGrid {
        &self.maze
    }

    pub fn rat(&self) -> &Rat {
        &self.rat
    }

    pub fn rat_mut(&mut self) -> &mut Rat {
        &mut self.rat
    }

    pub fn collectibles(&self) -> &[Collectible] {
        &self.collectibles
    }

    pub fn portal(&self) -> &ExitPortal {
        &self.portal
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn all_collected(&self) -> bool {
        self.collectibles.iter().all(Collectible::is_collected)
    }

    pub fn status(&self) -> GameStatus {
        GameStatus {
            collected: self.collectibles.iter().filter(|c| c.is_collected()).count(),
            total: self.collectibles.len(),
            portal_active: self.portal.is_active(),
            complete: self.complete,
            tick: self.tick,
        }
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Deterministic hash of the mutable session state, for comparing runs.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        let pose = self.rat.pose();
        mix(&mut h, &self.tick.to_le_bytes());
        mix(&mut h, &self.seed.to_le_bytes());
        for v in [pose.position, pose.velocity] {
            mix(&mut h, &v.x.to_le_bytes());
            mix(&mut h, &v.y.to_le_bytes());
        }
        mix(&mut h, &pose.heading.to_le_bytes());
        for item in &self.collectibles {
            mix(&mut h, &[item.is_collected() as u8]);
        }
        mix(&mut h, &[self.portal.is_active() as u8, self.complete as u8]);
        h
    }

    /// Distance from the rat to the centre of the exit cell.
    pub fn distance_to_exit(&self) -> f64 {
        self.rat.position().distance(self.portal.position())
    }

    /// Centres of collectibles not yet picked up.
    pub fn remaining_collectibles(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.collectibles
            .iter()
            .filter(|c| !c.is_collected())
            .map(Collectible::position)
    }
}

fn clock_seed() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(5)
}
