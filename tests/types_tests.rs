//! Type Safety Tests
//!
//! Tests for the validated newtypes and error conversions.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test types_tests

use pca9685_driver::error::{Error, InvalidChannel, InvalidFrequency};
use pca9685_driver::hal::i2c::I2cAddress;
use pca9685_driver::types::{Channel, Frequency};

// =============================================================================
// Channel Tests
// =============================================================================

#[test]
fn channel_valid_range() {
    for index in 0..16 {
        let channel = Channel::new(index).expect("channel in range");
        assert_eq!(channel.index(), index);
    }
}

#[test]
fn channel_out_of_range() {
    assert!(Channel::new(16).is_none());
    assert!(Channel::new(255).is_none());
}

#[test]
fn channel_bounds() {
    assert_eq!(Channel::FIRST.index(), 0);
    assert_eq!(Channel::LAST.index(), 15);
}

#[test]
fn channel_all_ascending() {
    let indices: Vec<u8> = Channel::all().map(Channel::index).collect();
    assert_eq!(indices, (0..16).collect::<Vec<u8>>());
}

#[test]
fn channel_try_from() {
    assert_eq!(Channel::try_from(7).map(Channel::index), Ok(7));
    assert_eq!(Channel::try_from(16), Err(InvalidChannel(16)));
}

#[test]
fn channel_display() {
    assert_eq!(Channel::LAST.to_string(), "CH15");
    assert_eq!(format!("{:?}", Channel::FIRST), "Channel(0)");
}

// =============================================================================
// Frequency Tests
// =============================================================================

#[test]
fn frequency_default_is_servo_rate() {
    assert_eq!(Frequency::default().as_hz(), 50);
    assert_eq!(Frequency::DEFAULT.prescaler(), 121);
}

#[test]
fn frequency_rejects_zero() {
    assert!(Frequency::from_hz(0).is_none());
}

#[test]
fn frequency_prescaler_register() {
    assert_eq!(Frequency::from_hz(60).map(Frequency::prescaler), Some(101));
    assert_eq!(Frequency::from_hz(1000).map(Frequency::prescaler), Some(5));
    assert_eq!(Frequency::from_hz(24).map(Frequency::prescaler), Some(253));
    assert_eq!(Frequency::from_hz(1743).map(Frequency::prescaler), Some(3));
}

#[test]
fn frequency_try_from() {
    assert_eq!(Frequency::try_from(50), Ok(Frequency::DEFAULT));
    assert_eq!(Frequency::try_from(5000), Err(InvalidFrequency(5000)));
}

#[test]
fn frequency_lengths() {
    let frequency = Frequency::DEFAULT;
    assert_eq!(frequency.cycle_length_us(), 20_000.0);
    assert_eq!(frequency.step_length_us(), 4.882_812_5);
}

#[test]
fn frequency_debug() {
    assert_eq!(format!("{:?}", Frequency::DEFAULT), "Frequency(50 Hz)");
}

// =============================================================================
// Address Tests
// =============================================================================

#[test]
fn address_default() {
    assert_eq!(I2cAddress::default(), I2cAddress::PCA9685);
    assert_eq!(I2cAddress::PCA9685.addr(), 0x40);
}

#[test]
fn address_masks_to_seven_bits() {
    assert_eq!(I2cAddress::new(0xC1).addr(), 0x41);
}

#[test]
fn address_from_pins() {
    assert_eq!(I2cAddress::pca9685_with_pins(0b00_0000).addr(), 0x40);
    assert_eq!(I2cAddress::pca9685_with_pins(0b00_0101).addr(), 0x45);
    assert_eq!(I2cAddress::pca9685_with_pins(0b11_1111).addr(), 0x7F);
}

#[test]
fn address_display() {
    assert_eq!(I2cAddress::PCA9685.to_string(), "0x40");
    assert_eq!(I2cAddress::PCA9685_ALL_CALL.to_string(), "0x70");
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn validation_errors_convert() {
    let err: Error<()> = InvalidChannel(20).into();
    assert_eq!(err, Error::InvalidChannel(20));
    assert!(!err.is_transport());

    let err: Error<()> = InvalidFrequency(10).into();
    assert_eq!(err, Error::InvalidFrequency(10));
}

#[test]
fn transport_error_flagged() {
    let err: Error<u8> = Error::I2c(3);
    assert!(err.is_transport());
    assert!(!Error::<u8>::Disposed.is_transport());
}

#[test]
fn error_messages() {
    assert_eq!(InvalidChannel(16).to_string(), "channel 16 is out of range (0-15)");
    assert_eq!(InvalidFrequency(2000).to_string(), "2000 Hz needs a prescaler outside 3-255");
    assert_eq!(Error::<()>::InvalidChannel(16).to_string(), InvalidChannel(16).to_string());
    assert_eq!(Error::<()>::Disposed.to_string(), "driver has been disposed");
}
