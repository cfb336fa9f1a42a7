//! Phase-locked column timing
//!
//! The only absolute reference is one hall pulse per revolution. Between
//! pulses the angle is extrapolated from the period estimate, and the
//! estimate is pulled toward the measured period a fraction at a time.
//!
//! Ownership of the shared record:
//! - the hall interrupt (`HallTiming::on_pulse`) writes every timing field;
//! - the render loop writes only the `calibrating` flag and otherwise reads
//!   through `HallTiming::snapshot`, which retries if a pulse lands mid-read.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering, fence};

use crate::Micros;
use crate::consts::*;
use crate::display::Ledbar;
use crate::levels::DriftPolicy;
use crate::settings::Settings;
use crate::ship::{Ship, ShipLed};
use crate::sim::Board;
use crate::{column_of, wrap_subdegrees};

/// Tuning for the drift correction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftTuning {
    /// Starting period estimate (µs)
    pub nominal_period: u32,
    /// Fraction of each error folded into the period (error / settling)
    pub settling: i32,
    /// Largest correction applied in one revolution (subdegrees)
    pub max_drift_speed: i32,
    pub min_period: u32,
    pub max_period: u32,
}

impl Default for DriftTuning {
    fn default() -> Self {
        Self {
            nominal_period: 40_000,
            settling: 4,
            max_drift_speed: 512,
            min_period: MIN_PERIOD,
            max_period: MAX_PERIOD,
        }
    }
}

impl DriftTuning {
    /// Non-empty window starting above zero, nominal period inside it
    fn clamped(self) -> Self {
        let min_period = self.min_period.max(1);
        let max_period = self.max_period.max(min_period);
        Self {
            nominal_period: self.nominal_period.clamp(min_period, max_period),
            settling: self.settling.max(1),
            max_drift_speed: self.max_drift_speed.max(1),
            min_period,
            max_period,
        }
    }
}

impl From<&Settings> for DriftTuning {
    fn from(settings: &Settings) -> Self {
        Self {
            nominal_period: settings.nominal_period,
            settling: settings.drift_settling,
            max_drift_speed: settings.max_drift_speed,
            min_period: settings.min_period,
            max_period: settings.max_period,
        }
        .clamped()
    }
}

/// Consecutive implausible samples after which the rotor is assumed to have
/// really changed speed
const RELOCK_AFTER: u32 = 3;

/// Whether `sample` is a believable single revolution for the current estimate
#[inline]
fn plausible(sample: u32, period: u32) -> bool {
    sample >= period / 2 && sample <= period.saturating_add(period / 2)
}

/// Consistent copy of the timing record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSnapshot {
    /// Accepted pulses so far; changes once per revolution
    pub pulses: u32,
    pub last_pulse: Micros,
    pub period: u32,
    /// Residual phase error expected by the end of this revolution (subdegrees)
    pub drift_pos: i32,
    /// Correction applied at the last pulse (subdegrees)
    pub drift_speed: i32,
    /// Raw duration of the last revolution (µs)
    pub last_sample: u32,
    pub rejected: u32,
}

/// Timing fields shared between the hall interrupt and the render loop
#[derive(Debug)]
pub struct HallTiming {
    tuning: DriftTuning,
    /// Odd while the interrupt side is writing
    seq: AtomicU32,
    pulses: AtomicU32,
    armed: AtomicBool,
    last_pulse: AtomicU32,
    period: AtomicU32,
    drift_pos: AtomicI32,
    drift_speed: AtomicI32,
    last_sample: AtomicU32,
    rejected: AtomicU32,
    /// Implausible samples in a row
    outliers: AtomicU32,
    calibrating: AtomicBool,
}

impl HallTiming {
    pub fn new(tuning: DriftTuning) -> Self {
        let tuning = tuning.clamped();
        Self {
            tuning,
            seq: AtomicU32::new(0),
            pulses: AtomicU32::new(0),
            armed: AtomicBool::new(false),
            last_pulse: AtomicU32::new(0),
            period: AtomicU32::new(tuning.nominal_period),
            drift_pos: AtomicI32::new(0),
            drift_speed: AtomicI32::new(0),
            last_sample: AtomicU32::new(0),
            rejected: AtomicU32::new(0),
            outliers: AtomicU32::new(0),
            calibrating: AtomicBool::new(false),
        }
    }

    /// Hall interrupt entry point: one call per revolution.
    ///
    /// Bounded and non-blocking. Samples outside the accepted period window
    /// (sensor noise, stalled rotor) or far from the current estimate (a
    /// missed pulse) keep the last good estimate and only re-anchor the
    /// phase. After `RELOCK_AFTER` implausible samples in a row the latest
    /// one is adopted as the new period.
    pub fn on_pulse(&self, now: Micros) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        if !self.armed.swap(true, Ordering::Relaxed) {
            self.last_pulse.store(now, Ordering::Relaxed);
            self.pulses.fetch_add(1, Ordering::Relaxed);
            self.seq.store(seq.wrapping_add(2), Ordering::Release);
            return;
        }

        let sample = now.wrapping_sub(self.last_pulse.load(Ordering::Relaxed));
        self.last_pulse.store(now, Ordering::Relaxed);
        self.last_sample.store(sample, Ordering::Relaxed);

        let period = self.period.load(Ordering::Relaxed);
        if sample < self.tuning.min_period || sample > self.tuning.max_period {
            self.reject();
        } else if self.calibrating.load(Ordering::Relaxed) {
            self.adopt(sample);
        } else if !plausible(sample, period) {
            if self.outliers.fetch_add(1, Ordering::Relaxed) + 1 >= RELOCK_AFTER {
                self.adopt(sample);
            } else {
                self.reject();
            }
        } else {
            self.outliers.store(0, Ordering::Relaxed);
            self.adjust_drift(sample);
        }

        self.pulses.fetch_add(1, Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// Keep the estimate, drop any pending correction
    fn reject(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        self.drift_pos.store(0, Ordering::Relaxed);
        self.drift_speed.store(0, Ordering::Relaxed);
    }

    /// Take a raw sample as the period estimate
    fn adopt(&self, sample: u32) {
        self.outliers.store(0, Ordering::Relaxed);
        self.period.store(sample, Ordering::Relaxed);
        self.drift_pos.store(0, Ordering::Relaxed);
        self.drift_speed.store(0, Ordering::Relaxed);
    }

    /// Fold the arrival error of the latest pulse into the period estimate
    fn adjust_drift(&self, sample: u32) {
        let period = self.period.load(Ordering::Relaxed).max(1) as i64;
        let sub = SUBDEGREES as i64;
        let half = sub / 2;

        let error_us = sample as i64 - period;
        let error = (error_us * sub / period).clamp(-half, half) as i32;

        let mut drift_speed = error / self.tuning.settling;
        if drift_speed == 0 {
            drift_speed = error.signum();
        }
        let drift_speed = drift_speed.clamp(-self.tuning.max_drift_speed, self.tuning.max_drift_speed);

        let period = (period + drift_speed as i64 * period / sub)
            .clamp(self.tuning.min_period as i64, self.tuning.max_period as i64);

        self.period.store(period as u32, Ordering::Relaxed);
        self.drift_speed.store(drift_speed, Ordering::Relaxed);
        self.drift_pos.store(error - drift_speed, Ordering::Relaxed);
    }

    /// Read the whole record without tearing
    pub fn snapshot(&self) -> TimingSnapshot {
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before % 2 == 1 {
                std::hint::spin_loop();
                continue;
            }
            let snap = TimingSnapshot {
                pulses: self.pulses.load(Ordering::Relaxed),
                last_pulse: self.last_pulse.load(Ordering::Relaxed),
                period: self.period.load(Ordering::Relaxed),
                drift_pos: self.drift_pos.load(Ordering::Relaxed),
                drift_speed: self.drift_speed.load(Ordering::Relaxed),
                last_sample: self.last_sample.load(Ordering::Relaxed),
                rejected: self.rejected.load(Ordering::Relaxed),
            };
            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == before {
                return snap;
            }
        }
    }

    pub fn set_calibrating(&self, calibrating: bool) {
        self.calibrating.store(calibrating, Ordering::Relaxed);
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrating.load(Ordering::Relaxed)
    }
}

/// Render-loop side of the display: turns elapsed time into columns
#[derive(Debug)]
pub struct PhaseClock {
    timing: Arc<HallTiming>,
    last_column_drawn: Option<u8>,
    /// Pulse count seen by the previous tick
    last_pulses: u32,
    /// Whole-image rotation driven by the level's drift policy
    spin_pos: i32,
    spin_speed: i32,
    revolution: u32,
    drift_policy: Option<DriftPolicy>,
    /// Offset between the ship LED and the strip (subdegrees)
    ship_calibration: i32,
}

impl PhaseClock {
    pub fn new(timing: Arc<HallTiming>, ship_calibration: i32) -> Self {
        Self {
            timing,
            last_column_drawn: None,
            last_pulses: 0,
            spin_pos: 0,
            spin_speed: 0,
            revolution: 0,
            drift_policy: None,
            ship_calibration,
        }
    }

    /// Handle for the interrupt side
    pub fn timing(&self) -> Arc<HallTiming> {
        Arc::clone(&self.timing)
    }

    /// Forget the drawn column and stop spinning; used on level changes
    pub fn reset(&mut self) {
        self.last_column_drawn = None;
        self.spin_pos = 0;
        self.spin_speed = 0;
        self.revolution = 0;
    }

    pub fn set_drift_policy(&mut self, policy: Option<DriftPolicy>) {
        self.drift_policy = policy;
    }

    /// Toggle raw-timing mode for manual tuning
    pub fn calibrate(&mut self, calibrating: bool) {
        self.timing.set_calibrating(calibrating);
        log::info!("calibration {}", if calibrating { "on" } else { "off" });
    }

    pub fn is_calibrating(&self) -> bool {
        self.timing.is_calibrating()
    }

    /// Angle of the blade at `now` in the playfield frame, or None before the first pulse
    pub fn current_pos(&self, snap: &TimingSnapshot, now: Micros) -> Option<i32> {
        if snap.pulses == 0 || snap.period == 0 {
            return None;
        }
        let sub = SUBDEGREES as i64;
        let elapsed = now.wrapping_sub(snap.last_pulse) as i64;
        // Hold the last sector if the next pulse is late
        let raw = (elapsed * sub / snap.period as i64).min(sub - 1);
        let pos = (raw - snap.drift_pos as i64 * raw / sub).clamp(0, sub - 1) as i32;
        Some(wrap_subdegrees(pos + self.spin_pos))
    }

    /// Render-loop entry point. Draws a column only when the blade has moved
    /// into a new sector; returns the column drawn, if any.
    pub fn tick(
        &mut self,
        now: Micros,
        board: &Board,
        ship: Option<&Ship>,
        ledbar: &mut impl Ledbar,
        ship_led: &mut impl ShipLed,
    ) -> Option<u8> {
        let snap = self.timing.snapshot();
        if snap.pulses != self.last_pulses {
            self.last_pulses = snap.pulses;
            self.new_revolution();
        }

        let pos = self.current_pos(&snap, now)?;

        let lit = ship.is_some_and(|s| self.ship_on(s, pos));
        if lit != ship_led.is_on() {
            if lit {
                ship_led.turn_on();
            } else {
                ship_led.turn_off();
            }
        }

        let column = column_of(pos);
        if self.last_column_drawn == Some(column) {
            return None;
        }
        board.draw_column(column, ship, ledbar);
        self.last_column_drawn = Some(column);
        Some(column)
    }

    fn new_revolution(&mut self) {
        self.revolution = self.revolution.wrapping_add(1);
        if let Some(policy) = self.drift_policy {
            self.spin_speed = policy.new_drift(self.spin_speed, self.revolution);
        }
        self.spin_pos = wrap_subdegrees(self.spin_pos + self.spin_speed);
    }

    /// Whether the ship LED should be lit with the blade at `current_pos`
    pub fn ship_on(&self, ship: &Ship, current_pos: i32) -> bool {
        let lit_at = Ship {
            pos: wrap_subdegrees(ship.pos + self.ship_calibration),
        };
        lit_at.covers(current_pos)
    }

    pub fn adjust_ship_calibration(&mut self, delta: i32) {
        self.ship_calibration = wrap_subdegrees(self.ship_calibration + delta);
        log::debug!("ship calibration {}", self.ship_calibration);
    }

    pub fn ship_calibration(&self) -> i32 {
        self.ship_calibration
    }

    pub fn spin_pos(&self) -> i32 {
        self.spin_pos
    }

    /// Log timing telemetry
    pub fn dump_debug(&self) {
        let snap = self.timing.snapshot();
        if self.is_calibrating() {
            log::debug!(
                "calibrating: sample={}us period={}us pulses={} rejected={}",
                snap.last_sample,
                snap.period,
                snap.pulses,
                snap.rejected
            );
        } else {
            log::debug!(
                "period={}us drift_pos={} drift_speed={} spin={}/{} rejected={}",
                snap.period,
                snap.drift_pos,
                snap.drift_speed,
                self.spin_pos,
                self.spin_speed,
                snap.rejected
            );
        }
    }
}
