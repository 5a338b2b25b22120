//! PCA9685 register map and command builders
//!
//! Every logical operation is expressed here as a fixed sequence of
//! single-byte register writes. Nothing in this module touches the bus.

use crate::calc::STEP_MASK;
use crate::types::Channel;

/// PCA9685 register addresses
pub mod reg {
    /// Mode register 1
    pub const MODE1: u8 = 0x00;
    /// Mode register 2
    pub const MODE2: u8 = 0x01;
    /// Channel 0 on step, low byte
    pub const LED0_ON_L: u8 = 0x06;
    /// Channel 0 on step, high nibble and force-on bit
    pub const LED0_ON_H: u8 = 0x07;
    /// Channel 0 off step, low byte
    pub const LED0_OFF_L: u8 = 0x08;
    /// Channel 0 off step, high nibble and force-off bit
    pub const LED0_OFF_H: u8 = 0x09;
    /// Register stride between consecutive channels
    pub const REGISTERS_PER_CHANNEL: u8 = 4;
    /// All channels on step, low byte
    pub const ALL_LED_ON_L: u8 = 0xFA;
    /// All channels on step, high nibble
    pub const ALL_LED_ON_H: u8 = 0xFB;
    /// All channels off step, low byte
    pub const ALL_LED_OFF_L: u8 = 0xFC;
    /// All channels off step, high nibble
    pub const ALL_LED_OFF_H: u8 = 0xFD;
    /// Oscillator prescaler
    pub const PRE_SCALE: u8 = 0xFE;
}

/// Register bit values
pub mod bits {
    /// MODE1 after reset: respond to ALL CALL
    pub const MODE1_DEFAULT: u8 = 0x01;
    /// MODE2 after reset: totem-pole outputs
    pub const MODE2_DEFAULT: u8 = 0x04;
    /// MODE1 low-power mode, oscillator off
    pub const SLEEP: u8 = 0x10;
    /// MODE1 restart of the PWM channels
    pub const RESTART: u8 = 0x80;
    /// Full on / full off bit in a step high byte
    pub const FULL: u8 = 0x10;
}

/// One single-byte register write
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterWrite {
    /// Target register
    pub register: u8,
    /// Byte written
    pub value: u8,
}

impl RegisterWrite {
    /// Create a register write
    #[must_use]
    pub const fn new(register: u8, value: u8) -> Self {
        Self { register, value }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RegisterWrite {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[{=u8:#x}] <- {=u8:#x}", self.register, self.value);
    }
}

const fn channel_offset(channel: Channel) -> u8 {
    reg::REGISTERS_PER_CHANNEL * channel.index()
}

/// On step low byte register of a channel
#[must_use]
pub const fn on_low(channel: Channel) -> u8 {
    reg::LED0_ON_L + channel_offset(channel)
}

/// On step high byte register of a channel
#[must_use]
pub const fn on_high(channel: Channel) -> u8 {
    reg::LED0_ON_H + channel_offset(channel)
}

/// Off step low byte register of a channel
#[must_use]
pub const fn off_low(channel: Channel) -> u8 {
    reg::LED0_OFF_L + channel_offset(channel)
}

/// Off step high byte register of a channel
#[must_use]
pub const fn off_high(channel: Channel) -> u8 {
    reg::LED0_OFF_H + channel_offset(channel)
}

const fn low_byte(step: u16) -> u8 {
    (step & 0xFF) as u8
}

const fn high_nibble(step: u16) -> u8 {
    ((step & STEP_MASK) >> 8) as u8
}

/// Reset the mode registers and force every channel off
#[must_use]
pub const fn reset() -> [RegisterWrite; 3] {
    [
        RegisterWrite::new(reg::MODE1, bits::MODE1_DEFAULT),
        RegisterWrite::new(reg::MODE2, bits::MODE2_DEFAULT),
        RegisterWrite::new(reg::ALL_LED_OFF_H, bits::FULL),
    ]
}

/// Program the on and off steps of a channel, masked to 12 bits
#[must_use]
pub const fn pulse_range(channel: Channel, on_step: u16, off_step: u16) -> [RegisterWrite; 4] {
    [
        RegisterWrite::new(on_low(channel), low_byte(on_step)),
        RegisterWrite::new(on_high(channel), high_nibble(on_step)),
        RegisterWrite::new(off_low(channel), low_byte(off_step)),
        RegisterWrite::new(off_high(channel), high_nibble(off_step)),
    ]
}

/// Force a channel low
#[must_use]
pub const fn channel_off(channel: Channel) -> [RegisterWrite; 1] {
    [RegisterWrite::new(off_high(channel), bits::FULL)]
}

/// Force a channel high, clearing any force-off
#[must_use]
pub const fn channel_on(channel: Channel) -> [RegisterWrite; 2] {
    [
        RegisterWrite::new(on_high(channel), bits::FULL),
        RegisterWrite::new(off_high(channel), 0),
    ]
}

/// Force every channel low
#[must_use]
pub const fn all_channels_off() -> [RegisterWrite; 1] {
    [RegisterWrite::new(reg::ALL_LED_OFF_H, bits::FULL)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(index: u8) -> Channel {
        Channel::new(index).unwrap()
    }

    #[test]
    fn channel_registers() {
        assert_eq!(on_low(ch(0)), 0x06);
        assert_eq!(off_high(ch(0)), 0x09);
        assert_eq!(on_high(ch(3)), 0x13);
        assert_eq!(off_high(ch(3)), 0x15);
        assert_eq!(on_low(ch(15)), 0x42);
        assert_eq!(off_high(ch(15)), 0x45);
    }

    #[test]
    fn pulse_range_splits_and_masks() {
        let writes = pulse_range(ch(1), 0x1ABC, 0xF123);
        assert_eq!(
            writes,
            [
                RegisterWrite::new(0x0A, 0xBC),
                RegisterWrite::new(0x0B, 0x0A),
                RegisterWrite::new(0x0C, 0x23),
                RegisterWrite::new(0x0D, 0x01),
            ]
        );
    }

    #[test]
    fn channel_on_clears_force_off() {
        assert_eq!(
            channel_on(ch(2)),
            [RegisterWrite::new(0x0F, 0x10), RegisterWrite::new(0x11, 0x00)]
        );
    }

    #[test]
    fn reset_sequence() {
        assert_eq!(
            reset(),
            [
                RegisterWrite::new(0x00, 0x01),
                RegisterWrite::new(0x01, 0x04),
                RegisterWrite::new(0xFD, 0x10),
            ]
        );
    }
}
