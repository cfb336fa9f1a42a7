//! Display side of the rotor: column timing and the LED strip

mod clock;
mod ledbar;

pub use clock::{DriftTuning, HallTiming, PhaseClock, TimingSnapshot};
pub use ledbar::{ColorTheme, FrameLedbar, Ledbar};
