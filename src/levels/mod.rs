//! Level table: timing, colours, pattern banks and drift policies
//!
//! Immutable once loaded. Every index the game uses at runtime is checked
//! here at construction, so a table that validates can be read without
//! bounds failures.

mod builtin;

use serde::{Deserialize, Serialize};

use crate::audio::SongId;
use crate::consts::MIN_STEP_DELAY;
use crate::display::ColorTheme;
use crate::error::ConfigError;
use crate::sim::row::ROW_MASK;

pub use builtin::builtin;

/// Longest shape a pattern can hold
pub const MAX_SHAPE_ROWS: usize = 32;

/// One falling shape, leading row first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape {
    pub rows: Vec<u8>,
}

impl Shape {
    pub fn new(rows: &[u8]) -> Self {
        Self {
            rows: rows.to_vec(),
        }
    }
}

/// Catalogue of shapes a level draws from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternBank {
    pub shapes: Vec<Shape>,
}

impl PatternBank {
    pub fn new(shapes: &[&[u8]]) -> Self {
        Self {
            shapes: shapes.iter().map(|rows| Shape::new(rows)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shape(&self, index: usize) -> Option<&Shape> {
        self.shapes.get(index)
    }
}

/// Per-revolution rule for how fast the whole image spins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriftPolicy {
    /// Spin at a fixed speed
    Constant { speed: i32 },
    /// Flip direction every `revolutions` turns
    Pendulum { speed: i32, revolutions: u32 },
    /// Accelerate by `step` per turn, saturating at ±`max`
    Ramp { step: i32, max: i32 },
}

impl DriftPolicy {
    /// Spin speed (subdegrees per revolution) for the next turn
    pub fn new_drift(&self, current: i32, revolution: u32) -> i32 {
        match *self {
            DriftPolicy::Constant { speed } => speed,
            DriftPolicy::Pendulum { speed, revolutions } => {
                if current == 0 {
                    speed
                } else if revolutions > 0 && revolution > 0 && revolution % revolutions == 0 {
                    -current
                } else {
                    current
                }
            }
            DriftPolicy::Ramp { step, max } => {
                let max = max.abs();
                current.saturating_add(step).clamp(-max, max)
            }
        }
    }
}

fn default_rotation_speed() -> u8 {
    5
}

fn default_sections() -> u8 {
    4
}

fn default_section_duration() -> u32 {
    15_000
}

/// One level's configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Delay between game steps at the start of the level (µs)
    pub step_delay: u32,
    /// Times each shape row repeats before advancing
    pub block_height: u8,
    /// Ship angular speed while a direction is held (subdegrees per ms)
    #[serde(default = "default_rotation_speed")]
    pub rotation_speed: u8,
    pub song: SongId,
    pub theme: ColorTheme,
    pub patterns: PatternBank,
    /// Pacing sections before the level is cleared
    #[serde(default = "default_sections")]
    pub sections: u8,
    /// Length of each section (ms)
    #[serde(default = "default_section_duration")]
    pub section_duration: u32,
    /// Step delay shaved off per completed section (µs)
    #[serde(default)]
    pub section_speedup: u32,
    #[serde(default)]
    pub drift: Option<DriftPolicy>,
}

impl LevelConfig {
    /// Step delay in effect during `section`
    pub fn step_delay_for_section(&self, section: u8) -> u32 {
        let speedup = self.section_speedup.saturating_mul(section as u32);
        self.step_delay
            .saturating_sub(speedup)
            .max(MIN_STEP_DELAY.min(self.step_delay))
    }

    fn validate(&self, level: usize) -> Result<(), ConfigError> {
        if self.step_delay == 0 {
            return Err(ConfigError::ZeroStepDelay { level });
        }
        if self.block_height == 0 {
            return Err(ConfigError::ZeroBlockHeight { level });
        }
        if self.sections == 0 {
            return Err(ConfigError::NoSections { level });
        }
        if self.patterns.is_empty() {
            return Err(ConfigError::EmptyBank { level });
        }
        for (shape, s) in self.patterns.shapes.iter().enumerate() {
            if s.rows.is_empty() {
                return Err(ConfigError::EmptyShape { level, shape });
            }
            if s.rows.len() > MAX_SHAPE_ROWS {
                return Err(ConfigError::ShapeTooLong {
                    level,
                    shape,
                    len: s.rows.len(),
                    max: MAX_SHAPE_ROWS,
                });
            }
            if let Some((row, &bits)) = s.rows.iter().enumerate().find(|(_, b)| **b & !ROW_MASK != 0) {
                return Err(ConfigError::RowOutOfRange {
                    level,
                    shape,
                    row,
                    bits,
                });
            }
        }
        Ok(())
    }
}

/// Ordered, validated sequence of levels
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LevelTable {
    levels: Vec<LevelConfig>,
}

impl LevelTable {
    /// Validate and wrap a list of levels
    pub fn new(levels: Vec<LevelConfig>) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        for (i, level) in levels.iter().enumerate() {
            level.validate(i)?;
        }
        log::info!("Loaded {} levels", levels.len());
        Ok(Self { levels })
    }

    /// Parse a JSON array of levels and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let levels: Vec<LevelConfig> = serde_json::from_str(json)?;
        Self::new(levels)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self.levels)?)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Never true for a constructed table
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&LevelConfig, ConfigError> {
        self.levels.get(index).ok_or(ConfigError::LevelOutOfRange {
            index,
            len: self.levels.len(),
        })
    }

    /// Level at `index`, clamped to the last level
    pub fn level(&self, index: usize) -> &LevelConfig {
        &self.levels[index.min(self.levels.len() - 1)]
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(shapes: &[&[u8]]) -> LevelConfig {
        LevelConfig {
            step_delay: 20_000,
            block_height: 1,
            rotation_speed: 5,
            song: SongId(0),
            theme: ColorTheme::default(),
            patterns: PatternBank::new(shapes),
            sections: 2,
            section_duration: 1_000,
            section_speedup: 2_000,
            drift: None,
        }
    }

    #[test]
    fn test_builtin_table_validates() {
        let table = builtin();
        assert!(table.is_ok(), "{:?}", table.err());
        let table = table.unwrap();
        assert!(table.len() >= 2);
        assert!(LevelTable::new((0..table.len()).map(|i| table.level(i).clone()).collect()).is_ok());
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(matches!(LevelTable::new(vec![]), Err(ConfigError::NoLevels)));
    }

    #[test]
    fn test_row_bits_outside_mask_rejected() {
        let err = LevelTable::new(vec![level(&[&[0b1, 0b1000_0000]])]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RowOutOfRange { level: 0, shape: 0, row: 1, .. }
        ));
    }

    #[test]
    fn test_empty_bank_and_shape_rejected() {
        assert!(matches!(
            LevelTable::new(vec![level(&[])]),
            Err(ConfigError::EmptyBank { level: 0 })
        ));
        assert!(matches!(
            LevelTable::new(vec![level(&[&[0b1]]), level(&[&[]])]),
            Err(ConfigError::EmptyShape { level: 1, shape: 0 })
        ));
    }

    #[test]
    fn test_zero_block_height_rejected() {
        let mut bad = level(&[&[0b1]]);
        bad.block_height = 0;
        assert!(matches!(
            LevelTable::new(vec![bad]),
            Err(ConfigError::ZeroBlockHeight { level: 0 })
        ));
    }

    #[test]
    fn test_get_out_of_range() {
        let table = LevelTable::new(vec![level(&[&[0b1]])]).unwrap();
        assert!(table.get(0).is_ok());
        assert!(matches!(
            table.get(3),
            Err(ConfigError::LevelOutOfRange { index: 3, len: 1 })
        ));
        assert!(table.is_last(0));
    }

    #[test]
    fn test_json_round_trip_keeps_levels() {
        let table = builtin().unwrap();
        let json = table.to_json().unwrap();
        let parsed = LevelTable::from_json(&json).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"[{
            "step_delay": 30000,
            "block_height": 2,
            "song": 1,
            "theme": { "color": 16711680, "bg1": 0, "bg2": 257 },
            "patterns": [[63, 0, 0]]
        }]"#;
        let table = LevelTable::from_json(json).unwrap();
        let level = table.level(0);
        assert_eq!(level.rotation_speed, 5);
        assert_eq!(level.sections, 4);
        assert_eq!(level.drift, None);
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(LevelTable::from_json("{"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_step_delay_ramps_and_floors() {
        let l = level(&[&[0b1]]);
        assert_eq!(l.step_delay_for_section(0), 20_000);
        assert_eq!(l.step_delay_for_section(1), 18_000);
        assert_eq!(l.step_delay_for_section(100), MIN_STEP_DELAY);
    }

    #[test]
    fn test_drift_policies() {
        let c = DriftPolicy::Constant { speed: 7 };
        assert_eq!(c.new_drift(0, 0), 7);

        let p = DriftPolicy::Pendulum { speed: 10, revolutions: 4 };
        assert_eq!(p.new_drift(0, 1), 10);
        assert_eq!(p.new_drift(10, 3), 10);
        assert_eq!(p.new_drift(10, 4), -10);

        let r = DriftPolicy::Ramp { step: 3, max: 5 };
        assert_eq!(r.new_drift(0, 0), 3);
        assert_eq!(r.new_drift(3, 1), 5);
        assert_eq!(r.new_drift(5, 2), 5);
    }
}
