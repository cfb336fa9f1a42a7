//! Fixed-capacity radial ring of rows
//!
//! The committed playfield. Scrolling moves the logical origin instead of
//! copying rows, so the renderer can read any band in O(1).

use super::row::Row;
use crate::consts::NUM_ROWS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingBuffer {
    buffer: [Row; NUM_ROWS],
    first_row: usize,
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RingBuffer {
    pub const fn new() -> Self {
        Self {
            buffer: [Row::EMPTY; NUM_ROWS],
            first_row: 0,
        }
    }

    /// Clear every band and move the origin back to slot 0
    pub fn reset(&mut self) {
        self.buffer = [Row::EMPTY; NUM_ROWS];
        self.first_row = 0;
    }

    /// Append `row` as the new tail; the former head drops out
    pub fn push_back(&mut self, row: Row) {
        self.buffer[self.first_row] = row;
        self.first_row = (self.first_row + 1) % NUM_ROWS;
    }

    /// Insert `row` as the new head; the former tail drops out
    pub fn push_front(&mut self, row: Row) {
        self.first_row = (self.first_row + NUM_ROWS - 1) % NUM_ROWS;
        self.buffer[self.first_row] = row;
    }

    /// Row at logical offset `row_num` from the origin.
    ///
    /// Offsets past the capacity are masked to the last band rather than
    /// wrapped back toward the origin.
    #[inline]
    pub fn get_row(&self, row_num: usize) -> Row {
        let row_num = row_num.min(NUM_ROWS - 1);
        self.buffer[(self.first_row + row_num) % NUM_ROWS]
    }

    /// Iterate bands from the origin outward
    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        (0..NUM_ROWS).map(move |n| self.get_row(n))
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.iter().all(|r| r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    enum Op {
        Back(u8),
        Front(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u8>().prop_map(Op::Back),
            any::<u8>().prop_map(Op::Front),
        ]
    }

    /// Naive sliding window: a deque that always holds NUM_ROWS rows
    fn model_apply(model: &mut VecDeque<Row>, op: &Op) {
        match *op {
            Op::Back(bits) => {
                model.pop_front();
                model.push_back(Row::new(bits));
            }
            Op::Front(bits) => {
                model.pop_back();
                model.push_front(Row::new(bits));
            }
        }
    }

    #[test]
    fn test_new_is_empty() {
        let ring = RingBuffer::new();
        assert!(ring.is_empty());
        assert!(ring.rows().all(|r| r == Row::EMPTY));
    }

    #[test]
    fn test_push_back_appends_tail() {
        let mut ring = RingBuffer::new();
        ring.push_back(Row::new(0b1));
        assert_eq!(ring.get_row(NUM_ROWS - 1), Row::new(0b1));
        ring.push_back(Row::new(0b10));
        assert_eq!(ring.get_row(NUM_ROWS - 1), Row::new(0b10));
        assert_eq!(ring.get_row(NUM_ROWS - 2), Row::new(0b1));
    }

    #[test]
    fn test_push_front_inserts_head() {
        let mut ring = RingBuffer::new();
        ring.push_front(Row::new(0b1));
        ring.push_front(Row::new(0b10));
        assert_eq!(ring.get_row(0), Row::new(0b10));
        assert_eq!(ring.get_row(1), Row::new(0b1));
    }

    #[test]
    fn test_get_row_masks_out_of_range() {
        let mut ring = RingBuffer::new();
        ring.push_back(Row::FULL);
        assert_eq!(ring.get_row(NUM_ROWS), ring.get_row(NUM_ROWS - 1));
        assert_eq!(ring.get_row(usize::MAX), Row::FULL);
    }

    #[test]
    fn test_reset_clears_and_rewinds() {
        let mut ring = RingBuffer::new();
        for i in 0..5 {
            ring.push_back(Row::new(i));
        }
        ring.reset();
        assert!(ring.is_empty());
        assert_eq!(ring, RingBuffer::new());
    }

    proptest! {
        #[test]
        fn prop_matches_sliding_window_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let mut ring = RingBuffer::new();
            let mut model: VecDeque<Row> = std::iter::repeat(Row::EMPTY).take(NUM_ROWS).collect();
            for op in &ops {
                match *op {
                    Op::Back(bits) => ring.push_back(Row::new(bits)),
                    Op::Front(bits) => ring.push_front(Row::new(bits)),
                }
                model_apply(&mut model, op);
            }
            for n in 0..NUM_ROWS {
                prop_assert_eq!(ring.get_row(n), model[n]);
            }
        }

        #[test]
        fn prop_push_back_then_front_restores_middle(
            seed in prop::collection::vec(any::<u8>(), NUM_ROWS),
            a in any::<u8>(),
            b in any::<u8>(),
        ) {
            let mut ring = RingBuffer::new();
            for bits in &seed {
                ring.push_back(Row::new(*bits));
            }
            let before = ring.clone();
            ring.push_back(Row::new(a));
            ring.push_front(Row::new(b));
            for n in 1..NUM_ROWS - 1 {
                prop_assert_eq!(ring.get_row(n), before.get_row(n));
            }
        }
    }
}
