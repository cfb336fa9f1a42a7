//! Ventilagon host runner
//!
//! Runs the rotor firmware against a simulated fan and player so the timing
//! and game flow can be watched in the log without hardware.
//!
//! Usage: `ventilagon [settings.json] [levels.json] [seconds]`

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use ventilagon::audio::AudioLog;
use ventilagon::display::FrameLedbar;
use ventilagon::levels::builtin;
use ventilagon::ship::{ShipFlag, Steer};
use ventilagon::{ConfigError, Game, Input, LevelTable, Micros, Settings};

/// Main loop pass interval of the simulated render loop (µs)
const LOOP_INTERVAL: Micros = 100;
/// How often the simulated player changes its mind (µs)
const PLAYER_INTERVAL: Micros = 400_000;
/// Longest run that fits the wrapping microsecond clock with room to spare
const MAX_SECONDS: u32 = 4_000;

/// Simulated run length in microseconds
fn run_length(seconds: u32) -> Micros {
    if seconds > MAX_SECONDS {
        log::warn!("Run length capped at {}s", MAX_SECONDS);
    }
    seconds.min(MAX_SECONDS) * 1_000_000
}

fn load_levels(path: Option<&str>) -> Result<LevelTable, ConfigError> {
    let Some(path) = path else {
        log::info!("Using built-in levels");
        return builtin();
    };
    match std::fs::read_to_string(path) {
        Ok(json) => LevelTable::from_json(&json),
        Err(e) => {
            log::warn!("Cannot read levels {}: {}, using built-in levels", path, e);
            builtin()
        }
    }
}

/// Hall pulses from a fan whose speed wanders around the nominal period
struct SimulatedFan {
    rng: Pcg32,
    period: u32,
    next_pulse: Micros,
}

impl SimulatedFan {
    fn new(seed: u64, period: u32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            period,
            next_pulse: 0,
        }
    }

    /// Pulse time due at or before `now`, if any
    fn poll(&mut self, now: Micros) -> Option<Micros> {
        if now < self.next_pulse {
            return None;
        }
        let pulse = self.next_pulse;
        let jitter = self.rng.random_range(-200..=200);
        self.period = (self.period as i32 + jitter).clamp(30_000, 50_000) as u32;
        self.next_pulse = self.next_pulse.wrapping_add(self.period);
        Some(pulse)
    }
}

fn main() {
    env_logger::init();
    log::info!("Ventilagon (host) starting...");

    let args: Vec<String> = std::env::args().collect();
    let settings = args
        .get(1)
        .map(|path| Settings::load(Path::new(path)))
        .unwrap_or_default();
    let seconds: u32 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(60);

    let levels = match load_levels(args.get(2).map(String::as_str)) {
        Ok(levels) => levels,
        Err(e) => {
            log::error!("Invalid level table: {}", e);
            std::process::exit(1);
        }
    };

    let mut game = match Game::new(
        &settings,
        levels,
        FrameLedbar::default(),
        AudioLog::default(),
        ShipFlag::default(),
        0,
    ) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Refusing to start: {}", e);
            std::process::exit(1);
        }
    };

    let timing = game.hall_timing();
    let mut fan = SimulatedFan::new(settings.seed, settings.nominal_period);
    let mut player = Pcg32::seed_from_u64(settings.seed ^ 0xFA17);
    let mut input = Input::default();
    let mut last_state = game.state_name();
    let mut next_decision: Micros = 0;

    let end = run_length(seconds);
    let mut now: Micros = 0;
    while now < end {
        // Interrupt side
        if let Some(pulse) = fan.poll(now) {
            timing.on_pulse(pulse);
        }

        if now >= next_decision {
            next_decision = now.saturating_add(PLAYER_INTERVAL);
            input.steer = match player.random_range(0..3) {
                0 => Steer::Left,
                1 => Steer::Right,
                _ => Steer::None,
            };
            input.button = game.state_name() == "GAME OVER" && !input.button;
        }

        game.run(now, &input);

        if game.state_name() != last_state {
            log::info!("[{:>8.3}s] {}", now as f64 / 1e6, game.state_name());
            last_state = game.state_name();
        }
        now = now.saturating_add(LOOP_INTERVAL);
    }

    let ctx = game.context();
    log::info!(
        "Done: level {} state {} columns drawn {}",
        game.current_level(),
        game.state_name(),
        ctx.ledbar.frames
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_length_stays_inside_clock_range() {
        assert_eq!(run_length(60), 60_000_000);
        assert_eq!(run_length(u32::MAX), MAX_SECONDS * 1_000_000);
        // The last loop pass and player decision still fit
        let end = run_length(u32::MAX);
        assert!(end.checked_add(PLAYER_INTERVAL + LOOP_INTERVAL).is_some());
    }

    #[test]
    fn test_fan_pulses_in_order() {
        let mut fan = SimulatedFan::new(1, 40_000);
        let mut last = None;
        for now in (0..2_000_000).step_by(100) {
            if let Some(pulse) = fan.poll(now) {
                if let Some(prev) = last {
                    let period: u32 = pulse - prev;
                    assert!((30_000..=50_000).contains(&period));
                }
                last = Some(pulse);
            }
        }
        assert!(last.is_some());
    }
}
