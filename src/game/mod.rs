//! Application context and main-loop scheduling
//!
//! Two periodic tasks share one cooperative loop:
//! - render: every call, draws a column when the blade enters a new sector;
//! - game: every `game_tick`, runs the active state.
//!
//! Render always runs first so game work never delays a column.

pub mod state;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Micros;
use crate::audio::Audio;
use crate::display::{DriftTuning, HallTiming, Ledbar, PhaseClock};
use crate::error::ConfigError;
use crate::levels::LevelTable;
use crate::settings::Settings;
use crate::ship::{Ship, ShipLed, Steer};
use crate::sim::Board;

pub use state::{GameState, ResetOutcome, StateMachine, StateRequest};

/// Player input sampled by the main loop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub steer: Steer,
    /// Any game button held
    pub button: bool,
    /// Pause toggle (one-shot)
    pub pause: bool,
    /// Calibration mode toggle (one-shot)
    pub calibrate: bool,
    /// Ship LED calibration adjustment (subdegrees, accumulates)
    pub nudge: i32,
}

impl Input {
    /// Fold a newer sample in, keeping one-shots until consumed
    fn merge(&mut self, newer: &Input) {
        self.steer = newer.steer;
        self.button = newer.button;
        self.pause |= newer.pause;
        self.calibrate |= newer.calibrate;
        self.nudge = self.nudge.saturating_add(newer.nudge);
    }
}

/// Everything the states operate on, built once at startup
#[derive(Debug)]
pub struct Context<L, A, S> {
    pub board: Board,
    pub clock: PhaseClock,
    pub levels: LevelTable,
    pub ship: Ship,
    pub ledbar: L,
    pub audio: A,
    pub ship_led: S,
    pub current_level: usize,
    /// Pending level change, consumed by the play state's setup
    pub new_level: Option<usize>,
}

/// Fixed-cadence task timer
#[derive(Debug, Clone, Copy)]
struct PeriodicTask {
    period: u32,
    last: Option<Micros>,
}

impl PeriodicTask {
    fn new(period: u32) -> Self {
        Self { period, last: None }
    }

    fn due(&mut self, now: Micros) -> bool {
        match self.last {
            Some(last) if now.wrapping_sub(last) < self.period => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// The running game: context, state machine and task timers
pub struct Game<L, A, S> {
    ctx: Context<L, A, S>,
    machine: StateMachine,
    game_task: PeriodicTask,
    telemetry_task: Option<PeriodicTask>,
    pending: Input,
}

impl<L: Ledbar, A: Audio, S: ShipLed> Game<L, A, S> {
    /// Build the context and enter the first level. Refuses to start on bad
    /// timing settings or a start level outside the table.
    pub fn new(
        settings: &Settings,
        levels: LevelTable,
        ledbar: L,
        audio: A,
        ship_led: S,
        now: Micros,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        levels.get(settings.start_level)?;

        let timing = Arc::new(HallTiming::new(DriftTuning::from(settings)));
        let mut clock = PhaseClock::new(timing, settings.ship_calibration);
        if settings.calibrating {
            clock.calibrate(true);
        }

        let mut ctx = Context {
            board: Board::new(settings.seed),
            clock,
            levels,
            ship: Ship::default(),
            ledbar,
            audio,
            ship_led,
            current_level: settings.start_level,
            new_level: Some(settings.start_level),
        };
        let machine = StateMachine::start(StateRequest::Play, now, &mut ctx);

        Ok(Self {
            ctx,
            machine,
            game_task: PeriodicTask::new(settings.game_tick.max(1)),
            telemetry_task: (settings.telemetry_interval > 0)
                .then(|| PeriodicTask::new(settings.telemetry_interval)),
            pending: Input::default(),
        })
    }

    /// Shared timing record for the hall interrupt
    pub fn hall_timing(&self) -> Arc<HallTiming> {
        self.ctx.clock.timing()
    }

    /// One pass of the main loop
    pub fn run(&mut self, now: Micros, input: &Input) {
        self.pending.merge(input);
        self.render(now);

        if self.game_task.due(now) {
            let input = std::mem::take(&mut self.pending);
            self.game_tick(now, &input);
            self.pending.steer = input.steer;
            self.pending.button = input.button;
        }

        if let Some(task) = self.telemetry_task.as_mut() {
            if task.due(now) {
                self.dump_debug();
            }
        }
    }

    /// Render task: returns the column drawn, if any
    pub fn render(&mut self, now: Micros) -> Option<u8> {
        let ctx = &mut self.ctx;
        let ship = self.machine.current().shows_ship().then_some(&ctx.ship);
        ctx.clock
            .tick(now, &ctx.board, ship, &mut ctx.ledbar, &mut ctx.ship_led)
    }

    /// Game task
    pub fn game_tick(&mut self, now: Micros, input: &Input) {
        if input.calibrate {
            let calibrating = !self.ctx.clock.is_calibrating();
            self.ctx.clock.calibrate(calibrating);
        }
        if input.nudge != 0 {
            self.ctx.clock.adjust_ship_calibration(input.nudge);
        }
        self.machine.run(now, &mut self.ctx, input);
    }

    pub fn dump_debug(&self) {
        log::debug!(
            "state={} level={} ship={}",
            self.machine.name(),
            self.ctx.current_level,
            self.ctx.ship.pos
        );
        self.ctx.clock.dump_debug();
    }

    pub fn state(&self) -> &GameState {
        self.machine.current()
    }

    pub fn state_name(&self) -> &'static str {
        self.machine.name()
    }

    pub fn current_level(&self) -> usize {
        self.ctx.current_level
    }

    pub fn context(&self) -> &Context<L, A, S> {
        &self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioLog;
    use crate::display::FrameLedbar;
    use crate::levels::builtin;
    use crate::ship::ShipFlag;

    const T: u32 = 40_000;

    fn game(settings: &Settings) -> Game<FrameLedbar, AudioLog, ShipFlag> {
        Game::new(
            settings,
            builtin().unwrap(),
            FrameLedbar::default(),
            AudioLog::default(),
            ShipFlag::default(),
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_bad_start_level_refuses_to_start() {
        let settings = Settings {
            start_level: 99,
            ..Settings::default()
        };
        let result = Game::new(
            &settings,
            builtin().unwrap(),
            FrameLedbar::default(),
            AudioLog::default(),
            ShipFlag::default(),
            0,
        );
        assert!(matches!(result, Err(ConfigError::LevelOutOfRange { index: 99, .. })));
    }

    #[test]
    fn test_zero_nominal_period_refuses_to_start() {
        let settings = Settings::from_json(r#"{ "nominal_period": 0 }"#).unwrap();
        let result = Game::new(
            &settings,
            builtin().unwrap(),
            FrameLedbar::default(),
            AudioLog::default(),
            ShipFlag::default(),
            0,
        );
        assert!(matches!(result, Err(ConfigError::NominalPeriod { nominal: 0, .. })));
    }

    #[test]
    fn test_starts_playing_requested_level() {
        let settings = Settings {
            start_level: 2,
            ..Settings::default()
        };
        let game = game(&settings);
        assert_eq!(game.state_name(), "RUNNING GAME");
        assert_eq!(game.current_level(), 2);
        assert_eq!(game.context().ledbar.theme(), builtin().unwrap().level(2).theme);
    }

    #[test]
    fn test_render_draws_six_columns_per_revolution() {
        let mut game = game(&Settings::default());
        let timing = game.hall_timing();

        for k in 0..10 {
            timing.on_pulse(k * T);
        }
        let start_frames = game.context().ledbar.frames;
        let mut now = 9 * T;
        for rev in 10..15 {
            while now < rev * T {
                game.render(now);
                now += 50;
            }
            timing.on_pulse(rev * T);
        }
        let drawn = game.context().ledbar.frames - start_frames;
        assert_eq!(drawn, 5 * 6);
    }

    #[test]
    fn test_pause_latched_until_game_tick() {
        let mut game = game(&Settings::default());
        game.run(0, &Input::default());
        game.run(
            100,
            &Input {
                pause: true,
                ..Input::default()
            },
        );
        assert!(matches!(game.state(), GameState::Play(p) if !p.paused));

        game.run(1_000, &Input::default());
        assert!(matches!(game.state(), GameState::Play(p) if p.paused));
        assert!(game.context().audio.paused);
    }

    #[test]
    fn test_calibration_toggle_and_nudge() {
        let mut game = game(&Settings::default());
        game.run(
            0,
            &Input {
                calibrate: true,
                nudge: 24,
                ..Input::default()
            },
        );
        assert!(game.context().clock.is_calibrating());
        assert_eq!(game.context().clock.ship_calibration(), 24);

        game.run(
            1_000,
            &Input {
                calibrate: true,
                ..Input::default()
            },
        );
        assert!(!game.context().clock.is_calibrating());
    }

    #[test]
    fn test_idle_ship_eventually_crashes() {
        let mut game = game(&Settings::default());
        let timing = game.hall_timing();
        let input = Input::default();
        let mut now: Micros = 0;
        let mut next_pulse: Micros = 0;
        let mut seen_resetting = false;

        while now < 30_000_000 && game.state_name() != "GAME OVER" {
            if now >= next_pulse {
                timing.on_pulse(now);
                next_pulse += T;
            }
            game.run(now, &input);
            seen_resetting |= matches!(game.state(), GameState::Resetting(_));
            now += 250;
        }
        assert!(seen_resetting);
        assert_eq!(game.state_name(), "GAME OVER");
        assert!(!game.context().ship_led.is_on());
    }
}
