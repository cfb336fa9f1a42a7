//! Playfield simulation
//!
//! Everything here is deterministic given the board seed:
//! - `row`: one ring of six wall bits and its transformations
//! - `ring`: the circular buffer of visible rows
//! - `pattern`: the shape currently being fed into the playfield
//! - `board`: playfield, collision and column drawing

pub mod board;
pub mod pattern;
pub mod ring;
pub mod row;

pub use board::{Board, ship_footprint_mask};
pub use pattern::Pattern;
pub use ring::RingBuffer;
pub use row::Row;
