//! Row bitmasks and the row transformation table
//!
//! A row is one radial band of the playfield: bit `c` set means angular
//! sector `c` is lit. Only the low NUM_COLUMNS bits are meaningful.

use serde::{Deserialize, Serialize};

use crate::consts::NUM_COLUMNS;

/// Mask of the meaningful bits of a row
pub const ROW_MASK: u8 = (1 << NUM_COLUMNS) - 1;

/// Number of distinct row values
const ROW_VALUES: usize = 1 << NUM_COLUMNS;

/// Rotations times mirror/no-mirror
pub const NUM_TRANSFORMATIONS: usize = 2 * NUM_COLUMNS as usize;

/// One radial band, stored as a packed bitmask over angular sectors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(u8);

impl Row {
    pub const EMPTY: Row = Row(0);
    pub const FULL: Row = Row(ROW_MASK);

    /// Build a row, dropping bits beyond NUM_COLUMNS
    #[inline]
    pub const fn new(bits: u8) -> Self {
        Row(bits & ROW_MASK)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether sector `column` is lit. Columns past NUM_COLUMNS are never lit.
    #[inline]
    pub const fn is_set(self, column: u8) -> bool {
        column < NUM_COLUMNS && self.0 & (1 << column) != 0
    }

    #[inline]
    pub const fn intersects(self, mask: u8) -> bool {
        self.0 & mask != 0
    }

    /// Rotate by `k` sectors (toward higher columns), wrapping around the circle
    pub const fn rotate(self, k: u8) -> Self {
        let k = k % NUM_COLUMNS;
        if k == 0 {
            return self;
        }
        Row::new((self.0 << k) | (self.0 >> (NUM_COLUMNS - k)))
    }

    /// Mirror the sectors: column c becomes NUM_COLUMNS - 1 - c
    pub const fn mirror(self) -> Self {
        let mut out = 0u8;
        let mut c = 0;
        while c < NUM_COLUMNS {
            if self.0 & (1 << c) != 0 {
                out |= 1 << (NUM_COLUMNS - 1 - c);
            }
            c += 1;
        }
        Row(out)
    }

    /// Apply one of the NUM_TRANSFORMATIONS table entries
    #[inline]
    pub fn transform(self, transformation: usize) -> Self {
        Row(TRANSFORMATIONS[transformation % NUM_TRANSFORMATIONS][self.0 as usize])
    }
}

/// Lookup table: entries 0..NUM_COLUMNS rotate, the rest mirror then rotate
pub static TRANSFORMATIONS: [[u8; ROW_VALUES]; NUM_TRANSFORMATIONS] = build_transformations();

const fn build_transformations() -> [[u8; ROW_VALUES]; NUM_TRANSFORMATIONS] {
    let mut table = [[0u8; ROW_VALUES]; NUM_TRANSFORMATIONS];
    let mut t = 0;
    while t < NUM_TRANSFORMATIONS {
        let mut v = 0;
        while v < ROW_VALUES {
            let row = Row::new(v as u8);
            let row = if t >= NUM_COLUMNS as usize { row.mirror() } else { row };
            table[t][v] = row.rotate((t % NUM_COLUMNS as usize) as u8).bits();
            v += 1;
        }
        t += 1;
    }
    table
}
