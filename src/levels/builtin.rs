//! Level content compiled into the firmware

use super::{DriftPolicy, LevelConfig, LevelTable, PatternBank};
use crate::audio::SongId;
use crate::display::ColorTheme;
use crate::error::ConfigError;

// Shapes list their leading row first. A zero row is a gap between walls.

const WALL_ONE_GAP: &[u8] = &[0b111110, 0, 0, 0];
const WALL_TWO_GAPS: &[u8] = &[0b110110, 0, 0, 0];
const ALTERNATE: &[u8] = &[0b101010, 0, 0, 0b010101, 0, 0, 0];
const HALF: &[u8] = &[0b000111, 0, 0, 0];
const C_SHAPE: &[u8] = &[0b111110, 0b000010, 0b000010, 0b111110, 0, 0, 0];
const LADDER: &[u8] = &[0b001001, 0, 0b010010, 0, 0b100100, 0, 0b001001, 0, 0, 0];
const SPIRAL: &[u8] = &[
    0b000011, 0b000110, 0b001100, 0b011000, 0b110000, 0b100001, 0, 0, 0,
];
const ZIGZAG: &[u8] = &[
    0b011111, 0, 0, 0b111110, 0, 0, 0b011111, 0, 0, 0b111110, 0, 0, 0,
];
const TUNNEL: &[u8] = &[
    0b111011, 0b111011, 0b110111, 0b110111, 0b101111, 0b101111, 0b011111, 0, 0, 0,
];
const TRIPLE_C: &[u8] = &[
    0b111101, 0, 0, 0b110111, 0, 0, 0b011111, 0, 0, 0,
];

fn level(
    step_delay: u32,
    block_height: u8,
    rotation_speed: u8,
    song: u8,
    theme: ColorTheme,
    shapes: &[&[u8]],
    drift: Option<DriftPolicy>,
) -> LevelConfig {
    LevelConfig {
        step_delay,
        block_height,
        rotation_speed,
        song: SongId(song),
        theme,
        patterns: PatternBank::new(shapes),
        sections: 4,
        section_duration: 15_000,
        section_speedup: 1_500,
        drift,
    }
}

/// The stock six-level campaign
pub fn builtin() -> Result<LevelTable, ConfigError> {
    let levels = vec![
        level(
            40_000,
            2,
            4,
            0,
            ColorTheme::new(0xFF_FF_00, 0x10_10_00, 0x08_08_00),
            &[WALL_ONE_GAP, HALF, ALTERNATE],
            None,
        ),
        level(
            36_000,
            2,
            5,
            1,
            ColorTheme::new(0x00_FF_FF, 0x00_10_10, 0x00_08_08),
            &[WALL_ONE_GAP, WALL_TWO_GAPS, C_SHAPE, HALF],
            Some(DriftPolicy::Constant { speed: 40 }),
        ),
        level(
            32_000,
            1,
            5,
            2,
            ColorTheme::new(0xFF_00_FF, 0x10_00_10, 0x08_00_08),
            &[C_SHAPE, LADDER, ALTERNATE, WALL_TWO_GAPS],
            Some(DriftPolicy::Pendulum {
                speed: 60,
                revolutions: 50,
            }),
        ),
        level(
            28_000,
            1,
            6,
            3,
            ColorTheme::new(0x00_FF_00, 0x00_10_00, 0x00_08_00),
            &[SPIRAL, LADDER, ZIGZAG, C_SHAPE],
            Some(DriftPolicy::Ramp { step: 2, max: 120 }),
        ),
        level(
            24_000,
            1,
            7,
            4,
            ColorTheme::new(0xFF_40_00, 0x10_04_00, 0x08_02_00),
            &[TUNNEL, SPIRAL, ZIGZAG, TRIPLE_C],
            Some(DriftPolicy::Pendulum {
                speed: -90,
                revolutions: 30,
            }),
        ),
        level(
            20_000,
            1,
            8,
            5,
            ColorTheme::new(0xFF_FF_FF, 0x10_10_10, 0x00_00_00),
            &[TUNNEL, TRIPLE_C, SPIRAL, ZIGZAG, LADDER],
            Some(DriftPolicy::Ramp {
                step: -3,
                max: 160,
            }),
        ),
    ];

    LevelTable::new(levels)
}
