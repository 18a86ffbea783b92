//! Proximity triggers: collectibles and the exit portal.

use glam::DVec2;
use ratmaze_common::CellCoord;
use serde::{Deserialize, Serialize};

/// A pickup centred in its cell. Collected at most once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub cell: CellCoord,
    collected: bool,
}

impl Collectible {
    pub fn new(cell: CellCoord) -> Self {
        Self {
            cell,
            collected: false,
        }
    }

    pub fn position(&self) -> DVec2 {
        self.cell.center()
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Collect if `agent` is within `radius` of the cell centre. Returns
    /// `true` only on the frame the item flips to collected.
    pub fn check_collision(&mut self, agent: DVec2, radius: f64) -> bool {
        if self.collected {
            return false;
        }
        if agent.distance(self.position()) < radius {
            self.collected = true;
            return true;
        }
        false
    }
}

/// The exit. Must be activated before reaching it counts as escaping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitPortal {
    pub cell: CellCoord,
    active: bool,
}

impl ExitPortal {
    pub fn new(cell: CellCoord) -> Self {
        Self {
            cell,
            active: false,
        }
    }

    pub fn position(&self) -> DVec2 {
        self.cell.center()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activate the portal. Returns `true` if it was inactive before.
    pub fn activate(&mut self) -> bool {
        !std::mem::replace(&mut self.active, true)
    }

    /// Whether `agent` escapes. Distance is only evaluated once the portal
    /// is active and every collectible is in hand.
    pub fn check_collision(&self, agent: DVec2, all_collected: bool, radius: f64) -> bool {
        if !self.active || !all_collected {
            return false;
        }
        agent.distance(self.position()) < radius
    }
}
