//! Ventilagon - a falling-block arcade game on a spinning POV display
//!
//! Core modules:
//! - `sim`: Deterministic playfield simulation (ring buffer, patterns, board)
//! - `display`: Phase-locked column timing and the LED sink
//! - `levels`: Level table, pattern banks and drift policies
//! - `game`: State machine, application context and the task scheduler

pub mod audio;
pub mod display;
pub mod error;
pub mod game;
pub mod levels;
pub mod settings;
pub mod ship;
pub mod sim;

pub use error::ConfigError;
pub use game::{Game, Input};
pub use levels::{LevelConfig, LevelTable};
pub use settings::Settings;

/// Monotonic microsecond timestamp. Wraps like a hardware timer counter.
pub type Micros = u32;

/// Game configuration constants
pub mod consts {
    /// Angular sectors sampled per revolution
    pub const NUM_COLUMNS: u8 = 6;
    /// Radial bands on the blade
    pub const NUM_ROWS: usize = 32;

    /// Radial band where the ship is drawn
    pub const ROW_SHIP: usize = 3;
    /// Radial band tested for collisions (reached before ROW_SHIP)
    pub const ROW_COLISION: usize = 7;

    /// Angular resolution of one revolution
    pub const SUBDEGREES: i32 = 8192;
    pub const SUBDEGREES_MASK: i32 = SUBDEGREES - 1;

    /// Angular width of the ship footprint (subdegrees)
    pub const SHIP_WIDTH: i32 = 512;

    /// Shortest step delay any section ramp may reach (µs)
    pub const MIN_STEP_DELAY: u32 = 5_000;

    /// Accepted hall period window (µs): 200 rev/s down to 5 rev/s
    pub const MIN_PERIOD: u32 = 5_000;
    pub const MAX_PERIOD: u32 = 200_000;
}

use consts::*;

/// Wrap an angle into [0, SUBDEGREES)
#[inline]
pub fn wrap_subdegrees(pos: i32) -> i32 {
    pos & SUBDEGREES_MASK
}

/// Shortest signed distance from `from` to `to` in subdegrees, in [-SUBDEGREES/2, SUBDEGREES/2)
#[inline]
pub fn angular_distance(from: i32, to: i32) -> i32 {
    let d = wrap_subdegrees(to - from);
    if d >= SUBDEGREES / 2 { d - SUBDEGREES } else { d }
}

/// Angular sector containing `pos`
#[inline]
pub fn column_of(pos: i32) -> u8 {
    ((wrap_subdegrees(pos) * NUM_COLUMNS as i32) / SUBDEGREES) as u8
}
