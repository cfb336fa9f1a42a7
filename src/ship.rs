//! The player's ship
//!
//! The ship lives on its own LED, lit by the render loop when the blade
//! sweeps past the ship's angle.

use serde::{Deserialize, Serialize};

use crate::consts::{SHIP_WIDTH, SUBDEGREES};
use crate::{angular_distance, wrap_subdegrees};

/// Ship indicator hardware
pub trait ShipLed {
    fn turn_on(&mut self);
    fn turn_off(&mut self);
    fn is_on(&self) -> bool;
}

/// Direction the player is steering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Steer {
    #[default]
    None,
    Left,
    Right,
}

/// Ship angle in the playfield frame (subdegrees)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub pos: i32,
}

impl Default for Ship {
    fn default() -> Self {
        // Start opposite the hall sensor
        Self { pos: SUBDEGREES / 2 }
    }
}

impl Ship {
    /// Move by `speed` subdegrees per elapsed millisecond in the steered direction
    pub fn advance(&mut self, steer: Steer, speed: u8, elapsed_us: u32) {
        let delta = (speed as i64 * elapsed_us as i64 / 1_000) as i32;
        let delta = delta.min(SUBDEGREES / 4);
        self.pos = match steer {
            Steer::None => self.pos,
            Steer::Left => wrap_subdegrees(self.pos - delta),
            Steer::Right => wrap_subdegrees(self.pos + delta),
        };
    }

    /// Whether `current_pos` falls inside the ship's angular footprint
    pub fn covers(&self, current_pos: i32) -> bool {
        angular_distance(self.pos, current_pos).abs() <= SHIP_WIDTH / 2
    }
}

/// Ship LED that just remembers its state
#[derive(Debug, Default)]
pub struct ShipFlag {
    on: bool,
}

impl ShipLed for ShipFlag {
    fn turn_on(&mut self) {
        self.on = true;
    }

    fn turn_off(&mut self) {
        self.on = false;
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps() {
        let mut ship = Ship { pos: 10 };
        ship.advance(Steer::Left, 5, 4_000);
        assert_eq!(ship.pos, SUBDEGREES - 10);
        ship.advance(Steer::Right, 5, 4_000);
        assert_eq!(ship.pos, 10);
        ship.advance(Steer::None, 5, 4_000);
        assert_eq!(ship.pos, 10);
    }

    #[test]
    fn test_advance_bounds_large_gaps() {
        let mut ship = Ship { pos: 0 };
        ship.advance(Steer::Right, 255, u32::MAX);
        assert_eq!(ship.pos, SUBDEGREES / 4);
    }

    #[test]
    fn test_covers_across_zero() {
        let ship = Ship { pos: 0 };
        assert!(ship.covers(SHIP_WIDTH / 2));
        assert!(ship.covers(SUBDEGREES - SHIP_WIDTH / 2));
        assert!(!ship.covers(SHIP_WIDTH));
    }
}
