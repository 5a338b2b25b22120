//! PCA9685 Unit Conversion
//!
//! Maps human units onto the chip's native ones. This module is pure and
//! testable on the host.
//!
//! # Theory of Operation
//!
//! The PCA9685 divides its 25 MHz oscillator by `prescaler + 1` and counts
//! 4096 steps per output cycle:
//! 1. Output frequency: FOUT = 25 MHz / (4096 × (prescaler + 1))
//! 2. Step length: TSTEP = (1 / FOUT) / 4096
//!
//! Each channel holds an on step and an off step. The output rises when
//! the counter reaches the on step and falls when it reaches the off step,
//! wrapping at 4096, so a pulse of N steps starting at `on` ends at
//! `(on + N - 1) mod 4096`.

#[cfg(feature = "embedded")]
use micromath::F32Ext;

use crate::config::{BASE_CLOCK_HZ, MAX_STEP, PRESCALER_MAX, PRESCALER_MIN, STEPS_PER_CYCLE};

/// Mask selecting the 12 significant bits of a step value
pub const STEP_MASK: u16 = MAX_STEP;

/// What a channel should be driven to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum ChannelOutput {
    /// Force the output low (off-high force bit)
    FullOff,
    /// Force the output high (on-high force bit)
    FullOn,
    /// Rise at `on`, fall at `off`
    Range {
        /// Step at which the output rises
        on: u16,
        /// Step at which the output falls
        off: u16,
    },
}

/// Calculate the prescaler for a target output frequency
///
/// `round(25 MHz / (4096 × f)) - 1` with round-half-up integer arithmetic.
/// Returns `u32::MAX` for 0 Hz and saturates at 0 for frequencies too high
/// to divide down to; both fall outside [`prescaler_in_range`].
#[must_use]
pub const fn prescaler(frequency_hz: u32) -> u32 {
    if frequency_hz == 0 {
        return u32::MAX;
    }
    let divisor = STEPS_PER_CYCLE as u64 * frequency_hz as u64;
    let rounded = (BASE_CLOCK_HZ as u64 + divisor / 2) / divisor;
    (rounded as u32).saturating_sub(1)
}

/// Check whether the chip accepts this prescaler (3..=255)
#[must_use]
pub const fn prescaler_in_range(prescaler: u32) -> bool {
    prescaler >= PRESCALER_MIN && prescaler <= PRESCALER_MAX
}

/// Output frequency the chip actually produces for a prescaler
#[must_use]
pub fn actual_frequency_hz(prescaler: u32) -> f32 {
    BASE_CLOCK_HZ as f32 / (STEPS_PER_CYCLE as f32 * (prescaler as f32 + 1.0))
}

/// Length of one output cycle in microseconds
#[must_use]
pub fn cycle_length_us(frequency_hz: u32) -> f32 {
    1_000_000.0 / frequency_hz as f32
}

/// Length of one step in microseconds
#[must_use]
pub fn step_length_us(frequency_hz: u32) -> f32 {
    cycle_length_us(frequency_hz) / STEPS_PER_CYCLE as f32
}

/// Exact step count of a pulse at a given frequency
///
/// `pulse × f × 4096 / 1e6` in `f64`: the step length `1e6 / (4096 f)`
/// is never rounded on its own, so pulses sitting just below a half step
/// do not tip over.
#[must_use]
pub fn pulse_steps(pulse_length_us: f32, frequency_hz: u32) -> f64 {
    f64::from(pulse_length_us) * f64::from(frequency_hz) * f64::from(STEPS_PER_CYCLE) / 1_000_000.0
}

/// Off step for a pulse of `pulse_length_us` starting at `on_step`
///
/// Applies the raw formula; callers wanting the off routing for
/// degenerate inputs use [`plan_pulse_length`].
#[must_use]
pub fn pulse_length_to_steps(on_step: u16, pulse_length_us: f32, frequency_hz: u32) -> u16 {
    wrap_off_step(on_step, round_steps(pulse_steps(pulse_length_us, frequency_hz)))
}

/// Off step for a duty cycle (0.0-1.0) starting at `on_step`
#[must_use]
pub fn duty_cycle_to_steps(on_step: u16, duty: f32) -> u16 {
    let steps = (duty * STEPS_PER_CYCLE as f32).round() as i64;
    wrap_off_step(on_step, steps)
}

/// Pulse length in microseconds produced by an on/off step pair
#[must_use]
pub fn steps_to_pulse_length_us(on_step: u16, off_step: u16, frequency_hz: u32) -> f32 {
    let on = i64::from(on_step & STEP_MASK);
    let off = i64::from(off_step & STEP_MASK);
    let steps = (off - on).rem_euclid(i64::from(STEPS_PER_CYCLE)) + 1;
    (steps as f64 * 1_000_000.0 / (f64::from(frequency_hz) * f64::from(STEPS_PER_CYCLE))) as f32
}

/// Decide how to drive a channel for a pulse length
///
/// Non-positive (or NaN) pulses and pulses shorter than half a step turn
/// the channel off. Everything else becomes a range; pulses longer than a
/// cycle wrap like any other.
#[must_use]
pub fn plan_pulse_length(on_step: u16, pulse_length_us: f32, frequency_hz: u32) -> ChannelOutput {
    // NaN fails every comparison and lands here too
    if !(pulse_length_us > 0.0) {
        return ChannelOutput::FullOff;
    }
    let steps = round_steps(pulse_steps(pulse_length_us, frequency_hz));
    if steps < 1 {
        return ChannelOutput::FullOff;
    }
    ChannelOutput::Range {
        on: on_step & STEP_MASK,
        off: wrap_off_step(on_step & STEP_MASK, steps),
    }
}

/// Decide how to drive a channel for a duty cycle
///
/// Duty `<= 0` (or NaN) turns the channel off and duty `>= 1` turns it
/// fully on; anything that rounds to zero steps also turns it off.
#[must_use]
pub fn plan_duty_cycle(on_step: u16, duty: f32) -> ChannelOutput {
    if !(duty > 0.0) {
        return ChannelOutput::FullOff;
    }
    if duty >= 1.0 {
        return ChannelOutput::FullOn;
    }
    let steps = (duty * STEPS_PER_CYCLE as f32).round() as i64;
    if steps < 1 {
        return ChannelOutput::FullOff;
    }
    ChannelOutput::Range {
        on: on_step & STEP_MASK,
        off: wrap_off_step(on_step & STEP_MASK, steps),
    }
}

/// Round half away from zero (`core` has no `f64::round`)
fn round_steps(steps: f64) -> i64 {
    if steps < 0.0 {
        -((-steps + 0.5) as i64)
    } else {
        (steps + 0.5) as i64
    }
}

fn wrap_off_step(on_step: u16, steps: i64) -> u16 {
    let off = (i64::from(on_step) + steps - 1).rem_euclid(i64::from(STEPS_PER_CYCLE));
    // rem_euclid keeps it in 0..4096
    off as u16
}
