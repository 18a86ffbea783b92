use serde::{Deserialize, Serialize};

const MULTIPLIER: u64 = 9301;
const INCREMENT: u64 = 49297;
const MODULUS: u64 = 233_280;

/// Seeded linear congruential generator.
///
/// `seed = (seed * 9301 + 49297) mod 233280`, yielding `seed / 233280`.
/// The stream is fully determined by the initial seed, so two sources built
/// from the same seed produce identical mazes and placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    pub fn new(seed: u32) -> Self {
        Self { state: seed as u64 }
    }

    /// Current internal state.
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Next float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state % MODULUS * MULTIPLIER + INCREMENT) % MODULUS;
        self.state as f64 / MODULUS as f64
    }

    /// Uniform integer in `low..=high`.
    pub fn int_inclusive(&mut self, low: i64, high: i64) -> i64 {
        (self.next_f64() * (high - low + 1) as f64).floor() as i64 + low
    }

    /// Uniform integer in `low..high`.
    pub fn int_exclusive(&mut self, low: i64, high: i64) -> i64 {
        (self.next_f64() * (high - low) as f64).floor() as i64 + low
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.int_exclusive(0, len as i64) as usize
    }

    /// Uniform float in `[low, high)`.
    pub fn double(&mut self, low: f64, high: f64) -> f64 {
        self.next_f64() * (high - low) + low
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::new(5)
    }
}
