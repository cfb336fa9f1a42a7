//! The playfield: committed rows plus the shape currently falling in
//!
//! Rows enter at the outer edge (the ring's tail) and scroll toward row 0,
//! so a wall crosses ROW_COLISION a few steps before it reaches ROW_SHIP.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::pattern::Pattern;
use super::ring::RingBuffer;
use super::row::Row;
use crate::consts::*;
use crate::display::Ledbar;
use crate::levels::LevelConfig;
use crate::ship::Ship;
use crate::{column_of, wrap_subdegrees};

/// Bands pre-filled by `fill_patterns`, counted from the outer edge
const FILL_ROWS: usize = NUM_ROWS / 2;

/// Sectors touched by a ship centred at `pos`, as a row mask
pub fn ship_footprint_mask(pos: i32) -> u8 {
    let first = column_of(wrap_subdegrees(pos - SHIP_WIDTH / 2));
    let last = column_of(wrap_subdegrees(pos + SHIP_WIDTH / 2));
    let mut mask = 0u8;
    let mut c = first;
    loop {
        mask |= 1 << c;
        if c == last {
            break;
        }
        c = (c + 1) % NUM_COLUMNS;
    }
    mask
}

#[derive(Debug, Clone)]
pub struct Board {
    visible: RingBuffer,
    pat: Pattern,
    rng: Pcg32,
    /// Position in the win tunnel animation
    win_phase: u8,
}

impl Board {
    pub fn new(seed: u64) -> Self {
        Self {
            visible: RingBuffer::new(),
            pat: Pattern::default(),
            rng: Pcg32::seed_from_u64(seed),
            win_phase: 0,
        }
    }

    /// Empty playfield with a fresh shape queued
    pub fn reset(&mut self, level: &LevelConfig) {
        self.visible.reset();
        self.pat.randomize(level, &mut self.rng);
    }

    /// Fresh playfield with the outer half already carrying walls
    pub fn fill_patterns(&mut self, level: &LevelConfig) {
        self.reset(level);
        for _ in 0..FILL_ROWS {
            self.step(level);
        }
    }

    /// Whether a ship at `pos` overlaps a lit sector of band `num_row`
    pub fn colision(&self, pos: i32, num_row: usize) -> bool {
        self.visible.get_row(num_row).intersects(ship_footprint_mask(pos))
    }

    /// Advance gravity one band: the next pattern row enters at the outer edge
    pub fn step(&mut self, level: &LevelConfig) {
        if self.pat.finished() {
            self.pat.randomize(level, &mut self.rng);
            log::trace!(
                "new pattern: shape {} transformation {}",
                self.pat.shape_index(),
                self.pat.transformation()
            );
        }
        self.visible.push_back(self.pat.next_row());
    }

    /// Scroll everything one band outward, leaving an empty band at row 0
    pub fn step_back(&mut self) {
        self.visible.push_front(Row::EMPTY);
    }

    /// Render one angular sector across every band, then latch it
    pub fn draw_column(&self, column: u8, ship: Option<&Ship>, ledbar: &mut impl Ledbar) {
        let ship_here = ship.is_some_and(|s| ship_footprint_mask(s.pos) & (1 << column) != 0);
        let alt_column = column % 2 == 1;
        for (n, row) in self.visible.rows().enumerate() {
            let value = row.is_set(column) || (ship_here && n == ROW_SHIP);
            ledbar.draw(n, value, alt_column);
        }
        ledbar.update();
    }

    /// Start the win animation: concentric rings two bands apart
    pub fn win_reset(&mut self) {
        self.visible.reset();
        self.win_phase = 0;
        for _ in 0..NUM_ROWS {
            self.win_step_back();
        }
    }

    /// Push the rings one band outward
    pub fn win_step_back(&mut self) {
        let row = if self.win_phase % 4 < 2 { Row::FULL } else { Row::EMPTY };
        self.visible.push_front(row);
        self.win_phase = self.win_phase.wrapping_add(1);
    }

    pub fn row(&self, num_row: usize) -> Row {
        self.visible.get_row(num_row)
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}
