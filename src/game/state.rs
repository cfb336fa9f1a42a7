//! Game flow: one active state, transitions applied by a single dispatcher
//!
//! States never construct each other. `loop_` returns a `StateRequest` and
//! `StateMachine::change_state` builds the next state and runs its setup
//! once before its first loop.

use super::{Context, Input};
use crate::Micros;
use crate::audio::{Audio, SoundEffect};
use crate::consts::*;
use crate::display::{ColorTheme, Ledbar};
use crate::ship::ShipLed;

/// Delay between scroll steps while resetting (µs)
pub const RESET_STEP_DELAY: u32 = 10_000;
/// Delay between win animation steps (µs)
pub const WIN_STEP_DELAY: u32 = 30_000;
/// Win animation length in steps
pub const WIN_STEPS: u16 = 3 * NUM_ROWS as u16;
/// How long the credits roll before a new game (µs)
pub const CREDITS_DURATION: u32 = 10_000_000;

/// Why the playfield is being cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Ship crashed: game over afterwards
    Lost,
    /// Level cleared: play the next one afterwards
    Advance,
}

/// Transition requested by the active state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRequest {
    Play,
    Resetting(ResetOutcome),
    GameOver,
    Win,
    Credits,
}

#[derive(Debug, Clone, Default)]
pub struct PlayState {
    pub section: u8,
    pub section_init_time: Micros,
    pub last_step: Micros,
    last_loop: Micros,
    pub paused: bool,
    paused_at: Micros,
}

impl PlayState {
    fn setup(&mut self, now: Micros, ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>) {
        let index = ctx.new_level.take().unwrap_or(ctx.current_level);
        if index >= ctx.levels.len() {
            log::warn!("requested level {index} out of range, clamping");
        }
        ctx.current_level = index.min(ctx.levels.len() - 1);
        let level = ctx.levels.level(ctx.current_level);

        ctx.board.fill_patterns(level);
        ctx.clock.reset();
        ctx.clock.set_drift_policy(level.drift);
        ctx.ledbar.set_theme(level.theme);
        ctx.audio.play_song(level.song);
        if ctx.current_level == 0 {
            ctx.audio.play(SoundEffect::Intro);
        }

        *self = PlayState {
            section_init_time: now,
            last_step: now,
            last_loop: now,
            ..PlayState::default()
        };
        log::info!("level {} started", ctx.current_level);
    }

    fn toggle_pause(&mut self, now: Micros) {
        if self.paused {
            // Freeze section pacing for the time spent paused
            let paused_for = now.wrapping_sub(self.paused_at);
            self.section_init_time = self.section_init_time.wrapping_add(paused_for);
            self.last_step = self.last_step.wrapping_add(paused_for);
        } else {
            self.paused_at = now;
        }
        self.paused = !self.paused;
        log::info!("{}", if self.paused { "paused" } else { "resumed" });
    }

    fn loop_(
        &mut self,
        now: Micros,
        ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>,
        input: &Input,
    ) -> Option<StateRequest> {
        if input.pause {
            self.toggle_pause(now);
            ctx.audio.toggle_pause();
        }
        if self.paused {
            self.last_loop = now;
            return None;
        }

        let level = ctx.levels.level(ctx.current_level);
        ctx.ship
            .advance(input.steer, level.rotation_speed, now.wrapping_sub(self.last_loop));
        self.last_loop = now;

        if now.wrapping_sub(self.last_step) >= level.step_delay_for_section(self.section) {
            ctx.board.step(level);
            self.last_step = now;
        }

        if ctx.board.colision(ctx.ship.pos, ROW_COLISION) {
            log::info!("crash at level {} section {}", ctx.current_level, self.section);
            ctx.audio.play(SoundEffect::Crash);
            return Some(StateRequest::Resetting(ResetOutcome::Lost));
        }

        self.check_section(now, ctx)
    }

    fn check_section(
        &mut self,
        now: Micros,
        ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>,
    ) -> Option<StateRequest> {
        let level = ctx.levels.level(ctx.current_level);
        let duration = level.section_duration.saturating_mul(1_000);
        if now.wrapping_sub(self.section_init_time) < duration {
            return None;
        }
        self.advance_section(now, ctx)
    }

    fn advance_section(
        &mut self,
        now: Micros,
        ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>,
    ) -> Option<StateRequest> {
        self.section += 1;
        self.section_init_time = now;
        let level = ctx.levels.level(ctx.current_level);
        if self.section < level.sections {
            log::debug!("section {}", self.section);
            return None;
        }

        if ctx.levels.is_last(ctx.current_level) {
            Some(StateRequest::Win)
        } else {
            ctx.new_level = Some(ctx.current_level + 1);
            Some(StateRequest::Resetting(ResetOutcome::Advance))
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResettingState {
    pub last_step: Micros,
    pub counter: u8,
    pub outcome: ResetOutcome,
}

impl ResettingState {
    fn new(outcome: ResetOutcome) -> Self {
        Self {
            last_step: 0,
            counter: NUM_ROWS as u8,
            outcome,
        }
    }

    fn setup(&mut self, now: Micros, ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>) {
        self.last_step = now;
        self.counter = NUM_ROWS as u8;
        if self.outcome == ResetOutcome::Lost {
            ctx.audio.stop_song();
        }
    }

    fn loop_(
        &mut self,
        now: Micros,
        ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>,
    ) -> Option<StateRequest> {
        if now.wrapping_sub(self.last_step) < RESET_STEP_DELAY {
            return None;
        }
        self.last_step = now;
        ctx.board.step_back();
        self.counter = self.counter.saturating_sub(1);
        if self.counter > 0 {
            return None;
        }
        Some(match self.outcome {
            ResetOutcome::Lost => StateRequest::GameOver,
            ResetOutcome::Advance => StateRequest::Play,
        })
    }
}

#[derive(Debug, Clone)]
pub struct GameOverState {
    /// Button still held from before; a press only counts after a release
    pub keys_pressed: bool,
}

impl GameOverState {
    fn setup(&mut self, ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>) {
        self.keys_pressed = true;
        self.blank_all(ctx);
        ctx.audio.play(SoundEffect::GameOver);
    }

    /// Blank the strip, the ship and the music
    fn blank_all(&mut self, ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>) {
        ctx.ledbar.set_theme(ColorTheme::default());
        ctx.ledbar.clear();
        ctx.ship_led.turn_off();
        ctx.audio.stop_song();
    }

    fn loop_(
        &mut self,
        ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>,
        input: &Input,
    ) -> Option<StateRequest> {
        if !input.button {
            self.keys_pressed = false;
            return None;
        }
        if self.keys_pressed {
            return None;
        }
        ctx.new_level = Some(0);
        Some(StateRequest::Play)
    }
}

#[derive(Debug, Clone)]
pub struct WinState {
    pub last_step: Micros,
    pub counter: u16,
}

impl WinState {
    fn setup(&mut self, now: Micros, ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>) {
        self.last_step = now;
        self.counter = WIN_STEPS;
        ctx.audio.stop_song();
        ctx.audio.play(SoundEffect::Win);
        ctx.ledbar.set_win_state();
        ctx.ship_led.turn_off();
        ctx.clock.reset();
        ctx.board.win_reset();
    }

    fn loop_(
        &mut self,
        now: Micros,
        ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>,
    ) -> Option<StateRequest> {
        if now.wrapping_sub(self.last_step) < WIN_STEP_DELAY {
            return None;
        }
        self.last_step = now;
        ctx.board.win_step_back();
        self.counter = self.counter.saturating_sub(1);
        (self.counter == 0).then_some(StateRequest::Credits)
    }
}

#[derive(Debug, Clone)]
pub struct CreditsState {
    pub started: Micros,
}

impl CreditsState {
    fn setup(&mut self, now: Micros, ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>) {
        self.started = now;
        ctx.ship_led.turn_off();
        log::info!("Ventilagon - thanks for playing");
    }

    fn loop_(&mut self, now: Micros, ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>) -> Option<StateRequest> {
        if now.wrapping_sub(self.started) < CREDITS_DURATION {
            return None;
        }
        ctx.new_level = Some(0);
        Some(StateRequest::Play)
    }
}

/// The active state and its own fields
#[derive(Debug, Clone)]
pub enum GameState {
    Play(PlayState),
    Resetting(ResettingState),
    GameOver(GameOverState),
    Win(WinState),
    Credits(CreditsState),
}

impl From<StateRequest> for GameState {
    fn from(request: StateRequest) -> Self {
        match request {
            StateRequest::Play => GameState::Play(PlayState::default()),
            StateRequest::Resetting(outcome) => GameState::Resetting(ResettingState::new(outcome)),
            StateRequest::GameOver => GameState::GameOver(GameOverState { keys_pressed: true }),
            StateRequest::Win => GameState::Win(WinState {
                last_step: 0,
                counter: WIN_STEPS,
            }),
            StateRequest::Credits => GameState::Credits(CreditsState { started: 0 }),
        }
    }
}

impl GameState {
    pub fn name(&self) -> &'static str {
        match self {
            GameState::Play(_) => "RUNNING GAME",
            GameState::Resetting(_) => "RESETTING",
            GameState::GameOver(_) => "GAME OVER",
            GameState::Win(_) => "FOR THE WIN!",
            GameState::Credits(_) => "Rolling Credits",
        }
    }

    /// Whether the ship belongs on the display in this state
    pub fn shows_ship(&self) -> bool {
        matches!(self, GameState::Play(_) | GameState::Resetting(_))
    }

    fn setup(&mut self, now: Micros, ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>) {
        match self {
            GameState::Play(s) => s.setup(now, ctx),
            GameState::Resetting(s) => s.setup(now, ctx),
            GameState::GameOver(s) => s.setup(ctx),
            GameState::Win(s) => s.setup(now, ctx),
            GameState::Credits(s) => s.setup(now, ctx),
        }
    }

    fn loop_(
        &mut self,
        now: Micros,
        ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>,
        input: &Input,
    ) -> Option<StateRequest> {
        match self {
            GameState::Play(s) => s.loop_(now, ctx, input),
            GameState::Resetting(s) => s.loop_(now, ctx),
            GameState::GameOver(s) => s.loop_(ctx, input),
            GameState::Win(s) => s.loop_(now, ctx),
            GameState::Credits(s) => s.loop_(now, ctx),
        }
    }
}

/// Owns the active state and performs every transition
#[derive(Debug)]
pub struct StateMachine {
    current: GameState,
    transitions: u32,
}

impl StateMachine {
    /// Enter `initial` and run its setup
    pub fn start(
        initial: StateRequest,
        now: Micros,
        ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>,
    ) -> Self {
        let mut current = GameState::from(initial);
        current.setup(now, ctx);
        log::info!("state: {}", current.name());
        Self {
            current,
            transitions: 0,
        }
    }

    /// Run the active state once and apply any transition it requests
    pub fn run(&mut self, now: Micros, ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>, input: &Input) {
        if let Some(request) = self.current.loop_(now, ctx, input) {
            self.change_state(request, now, ctx);
        }
    }

    /// Replace the active state; the new state's setup runs before anything else
    pub fn change_state(
        &mut self,
        request: StateRequest,
        now: Micros,
        ctx: &mut Context<impl Ledbar, impl Audio, impl ShipLed>,
    ) {
        let mut next = GameState::from(request);
        next.setup(now, ctx);
        log::info!("state: {} -> {}", self.current.name(), next.name());
        self.current = next;
        self.transitions += 1;
    }

    pub fn current(&self) -> &GameState {
        &self.current
    }

    pub fn name(&self) -> &'static str {
        self.current.name()
    }

    pub fn transitions(&self) -> u32 {
        self.transitions
    }
}
