//! Falling shape generator
//!
//! A pattern is a copy of one shape from the level's bank plus a random
//! rotation/mirror. It is consumed one row per game step.

use rand::Rng;
use rand_pcg::Pcg32;

use super::row::{NUM_TRANSFORMATIONS, Row};
use crate::levels::{LevelConfig, MAX_SHAPE_ROWS, Shape};

#[derive(Debug, Clone)]
pub struct Pattern {
    rows: [Row; MAX_SHAPE_ROWS],
    rows_len: usize,
    block_height: usize,
    /// Rows emitted so far, counting block repeats
    current_height: usize,
    transformation: usize,
    /// Bank index of the current shape
    shape_index: usize,
}

impl Default for Pattern {
    /// An already-finished pattern, so the first step draws a real one
    fn default() -> Self {
        Self {
            rows: [Row::EMPTY; MAX_SHAPE_ROWS],
            rows_len: 0,
            block_height: 1,
            current_height: 0,
            transformation: 0,
            shape_index: 0,
        }
    }
}

impl Pattern {
    /// Pick a shape and transformation from `level`'s bank
    pub fn randomize(&mut self, level: &LevelConfig, rng: &mut Pcg32) {
        let bank = &level.patterns;
        let shape_index = rng.random_range(0..bank.len().max(1));
        let transformation = rng.random_range(0..NUM_TRANSFORMATIONS);
        match bank.shape(shape_index) {
            Some(shape) => self.load(shape, level.block_height, transformation),
            None => *self = Self::default(),
        }
        self.shape_index = shape_index;
    }

    /// Start emitting `shape` from its first row
    pub fn load(&mut self, shape: &Shape, block_height: u8, transformation: usize) {
        let len = shape.rows.len().min(MAX_SHAPE_ROWS);
        for (dst, src) in self.rows.iter_mut().zip(&shape.rows[..len]) {
            *dst = Row::new(*src);
        }
        self.rows_len = len;
        self.block_height = (block_height as usize).max(1);
        self.current_height = 0;
        self.transformation = transformation % NUM_TRANSFORMATIONS;
    }

    /// Next row of the shape, transformed. Empty once finished.
    pub fn next_row(&mut self) -> Row {
        if self.finished() {
            return Row::EMPTY;
        }
        let row = self.rows[self.current_height / self.block_height];
        self.current_height += 1;
        row.transform(self.transformation)
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.current_height >= self.total_height()
    }

    /// Steps this pattern takes from fresh to finished
    pub fn total_height(&self) -> usize {
        self.rows_len * self.block_height
    }

    pub fn shape_index(&self) -> usize {
        self.shape_index
    }

    pub fn transformation(&self) -> usize {
        self.transformation
    }
}
