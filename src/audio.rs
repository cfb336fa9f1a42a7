//! Audio collaborator
//!
//! The rotor only requests sounds; playback happens on the base board.
//! Calls are fire-and-forget and never report back.

use serde::{Deserialize, Serialize};

/// Background song identifier, as referenced by a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(pub u8);

/// One-shot sound effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Game start fanfare
    Intro,
    /// Ship hit a wall
    Crash,
    /// Game over jingle
    GameOver,
    /// Last level cleared
    Win,
}

/// Capability set the state machine drives on transitions
pub trait Audio {
    fn play_song(&mut self, song: SongId);
    fn play(&mut self, effect: SoundEffect);
    fn stop_song(&mut self);
    fn toggle_pause(&mut self);
}

/// Audio sink that only logs requests (host builds, tests)
#[derive(Debug, Default)]
pub struct AudioLog {
    pub current_song: Option<SongId>,
    pub last_effect: Option<SoundEffect>,
    pub paused: bool,
}

impl Audio for AudioLog {
    fn play_song(&mut self, song: SongId) {
        log::info!("audio: song {}", song.0);
        self.current_song = Some(song);
        self.paused = false;
    }

    fn play(&mut self, effect: SoundEffect) {
        log::info!("audio: {:?}", effect);
        self.last_effect = Some(effect);
    }

    fn stop_song(&mut self) {
        self.current_song = None;
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}
