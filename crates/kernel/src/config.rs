use serde::{Deserialize, Serialize};

/// Errors raised when a session or maze is constructed from bad parameters.
///
/// Gameplay itself never fails: blocked moves resolve to zero displacement.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("maze dimensions must be between 1 and {max}, got {width}x{height}", max = MAX_DIMENSION)]
    InvalidDimensions { width: i64, height: i64 },
    #[error("rat radius must be in (0, 0.5), got {0}")]
    InvalidRadius(f64),
    #[error("maximum time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),
    #[error("tuning value `{name}` must be non-negative and finite, got {value}")]
    InvalidTuning { name: &'static str, value: f64 },
}

/// Largest width or height a maze may have; cell coordinates are `i32`.
pub const MAX_DIMENSION: i64 = i32::MAX as i64;

/// Reject widths and heights that are non-positive or do not fit a cell
/// coordinate.
pub fn check_dimensions(width: i64, height: i64) -> Result<(), ConfigError> {
    let valid = 1..=MAX_DIMENSION;
    if valid.contains(&width) && valid.contains(&height) {
        Ok(())
    } else {
        Err(ConfigError::InvalidDimensions { width, height })
    }
}

/// Physical tuning for the rat and its capsule collider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatTuning {
    /// Footprint half-width in cells.
    pub radius: f64,
    /// Capsule length along the heading.
    pub capsule_height: f64,
    /// Degrees per second.
    pub spin_speed: f64,
    pub max_velocity: f64,
    pub acceleration: f64,
    pub deceleration: f64,
    /// Velocity retained when reprojected along a slide.
    pub friction: f64,
    pub wall_bounce: f64,
    /// Lookahead distance at which head-on walls start damping acceleration.
    pub corner_avoidance_distance: f64,
    pub history_length: usize,
    /// Strafe speed as a fraction of `max_velocity`.
    pub strafe_factor: f64,
}

impl Default for RatTuning {
    fn default() -> Self {
        Self {
            radius: 0.15,
            capsule_height: 0.4,
            spin_speed: 120.0,
            max_velocity: 1.0,
            acceleration: 2.8,
            deceleration: 4.0,
            friction: 0.92,
            wall_bounce: 0.1,
            corner_avoidance_distance: 0.25,
            history_length: 3,
            strafe_factor: 0.6,
        }
    }
}

/// Game session configuration. Every field falls back to its default when
/// missing from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: i64,
    pub height: i64,
    /// RNG seed. `None` derives one from the system clock.
    pub seed: Option<u32>,
    pub max_collectibles: usize,
    /// Upper bound on a single tick's delta time, in seconds.
    pub max_dt: f64,
    pub collect_radius: f64,
    pub exit_radius: f64,
    pub rat: RatTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 8,
            seed: Some(5),
            max_collectibles: 5,
            max_dt: 0.1,
            collect_radius: 0.4,
            exit_radius: 0.5,
            rat: RatTuning::default(),
        }
    }
}

impl GameConfig {
    pub fn with_size(width: i64, height: i64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every construction-time parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_dimensions(self.width, self.height)?;
        let r = self.rat.radius;
        if !(r > 0.0 && r < 0.5) {
            return Err(ConfigError::InvalidRadius(r));
        }
        if !(self.max_dt > 0.0 && self.max_dt.is_finite()) {
            return Err(ConfigError::InvalidTimeStep(self.max_dt));
        }
        let tunables = [
            ("capsule_height", self.rat.capsule_height),
            ("spin_speed", self.rat.spin_speed),
            ("max_velocity", self.rat.max_velocity),
            ("acceleration", self.rat.acceleration),
            ("deceleration", self.rat.deceleration),
            ("friction", self.rat.friction),
            ("wall_bounce", self.rat.wall_bounce),
            ("corner_avoidance_distance", self.rat.corner_avoidance_distance),
            ("strafe_factor", self.rat.strafe_factor),
            ("collect_radius", self.collect_radius),
            ("exit_radius", self.exit_radius),
        ];
        for (name, value) in tunables {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidTuning { name, value });
            }
        }
        Ok(())
    }
}
