//! LED strip sink
//!
//! The blade carries one pixel per radial band. The core hands it on/off
//! values per band; colour comes from the active level's theme.

use serde::{Deserialize, Serialize};

use crate::consts::NUM_ROWS;

/// Primary and alternating background colours (0xRRGGBB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorTheme {
    pub color: u32,
    pub bg1: u32,
    pub bg2: u32,
}

impl ColorTheme {
    pub const fn new(color: u32, bg1: u32, bg2: u32) -> Self {
        Self { color, bg1, bg2 }
    }

    /// Win screen: everything lit
    pub const WIN: ColorTheme = ColorTheme::new(0xFF_FF_FF, 0x40_40_40, 0x20_20_20);

    /// Pixel colour for a band
    #[inline]
    pub fn pixel(&self, value: bool, alt_column: bool) -> u32 {
        match (value, alt_column) {
            (true, _) => self.color,
            (false, false) => self.bg1,
            (false, true) => self.bg2,
        }
    }
}

/// Physical pixel output. Synchronous and infallible from the core's side.
pub trait Ledbar {
    /// Set band `num_row`; `alt_column` selects the alternate background
    fn draw(&mut self, num_row: usize, value: bool, alt_column: bool);
    fn set_theme(&mut self, theme: ColorTheme);
    fn set_win_state(&mut self) {
        self.set_theme(ColorTheme::WIN);
    }
    /// Blank every pixel
    fn clear(&mut self);
    /// Latch the pending pixels to the strip
    fn update(&mut self);
}

/// In-memory strip that keeps the last latched column
#[derive(Debug, Clone)]
pub struct FrameLedbar {
    theme: ColorTheme,
    pending: [u32; NUM_ROWS],
    pub latched: [u32; NUM_ROWS],
    /// Number of `update` calls so far
    pub frames: u64,
}

impl Default for FrameLedbar {
    fn default() -> Self {
        Self {
            theme: ColorTheme::default(),
            pending: [0; NUM_ROWS],
            latched: [0; NUM_ROWS],
            frames: 0,
        }
    }
}

impl FrameLedbar {
    pub fn theme(&self) -> ColorTheme {
        self.theme
    }

    /// Bands of the last latched column that show the primary colour
    pub fn lit_rows(&self) -> impl Iterator<Item = usize> + '_ {
        let color = self.theme.color;
        self.latched
            .iter()
            .enumerate()
            .filter(move |(_, px)| **px == color)
            .map(|(n, _)| n)
    }
}

impl Ledbar for FrameLedbar {
    fn draw(&mut self, num_row: usize, value: bool, alt_column: bool) {
        if let Some(px) = self.pending.get_mut(num_row) {
            *px = self.theme.pixel(value, alt_column);
        }
    }

    fn set_theme(&mut self, theme: ColorTheme) {
        self.theme = theme;
    }

    fn clear(&mut self) {
        self.pending = [0; NUM_ROWS];
        self.latched = [0; NUM_ROWS];
    }

    fn update(&mut self) {
        self.latched = self.pending;
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_alternates_background() {
        let theme = ColorTheme::new(1, 2, 3);
        assert_eq!(theme.pixel(true, false), 1);
        assert_eq!(theme.pixel(true, true), 1);
        assert_eq!(theme.pixel(false, false), 2);
        assert_eq!(theme.pixel(false, true), 3);
    }

    #[test]
    fn test_draw_ignores_out_of_range_band() {
        let mut bar = FrameLedbar::default();
        bar.set_theme(ColorTheme::new(7, 0, 0));
        bar.draw(NUM_ROWS, true, false);
        bar.draw(2, true, false);
        bar.update();
        assert_eq!(bar.lit_rows().collect::<Vec<_>>(), vec![2]);
        assert_eq!(bar.frames, 1);
    }
}
