//! `PCA9685` PWM Controller Driver
//!
//! Drives the 16 PWM outputs of a `PCA9685` over I2C.
//!
//! Every public operation is a *logical* operation: it may emit several
//! register writes, and those writes always reach the bus back to back.
//! The bus sits behind an async mutex; an operation holds it from its
//! first write (or the MODE1 read of a frequency program) to its last, so
//! a torn 4-register pulse update or a half-applied prescaler change can
//! never be observed, even with many tasks sharing one driver.
//!
//! ```ignore
//! let pwm = Pca9685::<CriticalSectionRawMutex, _, _>::new(i2c, Delay, DriverConfig::new());
//! pwm.init().await?;
//! pwm.set_pulse_length(Channel::FIRST, 1500.0, 0).await?;
//! ```

pub mod commands;
pub mod frequency;

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use self::commands::RegisterWrite;
use self::frequency::{Action, Event, FrequencyProgram};
use crate::calc::{self, ChannelOutput};
use crate::config::DriverConfig;
use crate::error::Error;
use crate::hal::i2c::{I2cAddress, I2cBus};
use crate::types::{Channel, Frequency};

/// Result of a driver operation
pub type DriverResult<T, I2C> = Result<T, Error<<I2C as embedded_hal_async::i2c::ErrorType>::Error>>;

/// State only touched while holding the bus lock
struct Inner<I2C, D> {
    bus: I2cBus<I2C>,
    delay: D,
    frequency: Frequency,
}

/// `PCA9685` driver
///
/// `M` picks the raw mutex guarding the bus: `CriticalSectionRawMutex` to
/// share across executors or interrupt priorities, `NoopRawMutex` within
/// one executor.
pub struct Pca9685<M: RawMutex, I2C, D> {
    inner: Mutex<M, Inner<I2C, D>>,
    config: DriverConfig,
    closed: AtomicBool,
    in_flight: AtomicUsize,
    drained: Signal<M, ()>,
}

/// Marks an operation as admitted until dropped
struct Admission<'a, M: RawMutex> {
    in_flight: &'a AtomicUsize,
    closed: &'a AtomicBool,
    drained: &'a Signal<M, ()>,
}

impl<M: RawMutex> Drop for Admission<'_, M> {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 && self.closed.load(Ordering::SeqCst) {
            self.drained.signal(());
        }
    }
}

impl<M: RawMutex, I2C: I2c, D: DelayNs> Pca9685<M, I2C, D> {
    /// Create a new `PCA9685` driver
    ///
    /// No I/O happens until [`init`](Self::init).
    #[must_use]
    pub fn new(i2c: I2C, delay: D, config: DriverConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                bus: I2cBus::new(i2c),
                delay,
                frequency: config.frequency,
            }),
            config,
            closed: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            drained: Signal::new(),
        }
    }

    /// Device address this driver talks to
    #[must_use]
    pub const fn address(&self) -> I2cAddress {
        self.config.address
    }

    /// Configuration the driver was built with
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Check whether [`dispose`](Self::dispose) has been called
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Frequency currently programmed
    ///
    /// Waits for the operation holding the bus, if any, so the answer
    /// reflects every operation issued before it.
    pub async fn frequency(&self) -> Frequency {
        self.inner.lock().await.frequency
    }

    /// Length of one step in microseconds at the programmed frequency
    pub async fn step_length_us(&self) -> f32 {
        self.frequency().await.step_length_us()
    }

    /// Initialize the `PCA9685`
    ///
    /// Resets both mode registers, forces every channel off, then programs
    /// the configured frequency (including the settling delay and restart).
    pub async fn init(&self) -> DriverResult<(), I2C> {
        let _admission = self.admit()?;
        info!("Resetting PCA9685 at {}", self.config.address);

        let mut inner = self.inner.lock().await;
        let result = match self.transmit(&mut inner, &commands::reset()).await {
            Ok(()) => self.program_frequency(&mut inner, self.config.frequency).await,
            Err(err) => Err(err),
        };
        self.report("init", result)
    }

    /// Reprogram the PWM frequency
    ///
    /// On success the stored frequency, and with it the step length used by
    /// [`set_pulse_length`](Self::set_pulse_length), is updated. On failure
    /// the previous value is kept.
    pub async fn set_frequency(&self, frequency: Frequency) -> DriverResult<(), I2C> {
        let _admission = self.admit()?;
        let mut inner = self.inner.lock().await;
        let result = self.program_frequency(&mut inner, frequency).await;
        self.report("set_frequency", result)
    }

    /// Set the on and off steps of a channel
    ///
    /// Steps are masked to 12 bits.
    pub async fn set_pulse_range(&self, channel: Channel, on_step: u16, off_step: u16) -> DriverResult<(), I2C> {
        let _admission = self.admit()?;
        if self.config.debug {
            debug!("{}: on {} off {}", channel, on_step, off_step);
        }
        let mut inner = self.inner.lock().await;
        let result = self
            .transmit(&mut inner, &commands::pulse_range(channel, on_step, off_step))
            .await;
        self.report("set_pulse_range", result)
    }

    /// Set the pulse length of a channel in microseconds
    ///
    /// Pulses `<= 0`, or shorter than half a step, turn the channel off.
    /// Longer pulses always become an on/off range, wrapping past the end
    /// of the cycle.
    pub async fn set_pulse_length(&self, channel: Channel, pulse_length_us: f32, on_step: u16) -> DriverResult<(), I2C> {
        let _admission = self.admit()?;
        let mut inner = self.inner.lock().await;
        let output = calc::plan_pulse_length(on_step, pulse_length_us, inner.frequency.as_hz());
        if self.config.debug {
            debug!("{}: pulse {} us -> {:?}", channel, pulse_length_us, output);
        }
        let result = self.drive(&mut inner, channel, output).await;
        self.report("set_pulse_length", result)
    }

    /// Set the pulse length of a channel starting at step 0
    pub async fn set_pulse_length_us(&self, channel: Channel, pulse_length_us: f32) -> DriverResult<(), I2C> {
        self.set_pulse_length(channel, pulse_length_us, 0).await
    }

    /// Set the duty cycle (0.0-1.0) of a channel
    ///
    /// Duty `<= 0` turns the channel off, duty `>= 1` turns it fully on.
    pub async fn set_duty_cycle(&self, channel: Channel, duty: f32, on_step: u16) -> DriverResult<(), I2C> {
        let _admission = self.admit()?;
        let output = calc::plan_duty_cycle(on_step, duty);
        if self.config.debug {
            debug!("{}: duty {} -> {:?}", channel, duty, output);
        }
        let mut inner = self.inner.lock().await;
        let result = self.drive(&mut inner, channel, output).await;
        self.report("set_duty_cycle", result)
    }

    /// Set the duty cycle of a channel starting at step 0
    pub async fn set_duty(&self, channel: Channel, duty: f32) -> DriverResult<(), I2C> {
        self.set_duty_cycle(channel, duty, 0).await
    }

    /// Force a channel low
    pub async fn channel_off(&self, channel: Channel) -> DriverResult<(), I2C> {
        let _admission = self.admit()?;
        let mut inner = self.inner.lock().await;
        let result = self.transmit(&mut inner, &commands::channel_off(channel)).await;
        self.report("channel_off", result)
    }

    /// Force a channel high
    pub async fn channel_on(&self, channel: Channel) -> DriverResult<(), I2C> {
        let _admission = self.admit()?;
        let mut inner = self.inner.lock().await;
        let result = self.transmit(&mut inner, &commands::channel_on(channel)).await;
        self.report("channel_on", result)
    }

    /// Force every channel low
    pub async fn all_channels_off(&self) -> DriverResult<(), I2C> {
        let _admission = self.admit()?;
        let mut inner = self.inner.lock().await;
        let result = self.transmit(&mut inner, &commands::all_channels_off()).await;
        self.report("all_channels_off", result)
    }

    /// Shut the driver down
    ///
    /// Stops admitting operations (they resolve to [`Error::Disposed`]),
    /// waits for every operation already admitted to finish, then forces
    /// every channel off. A second call resolves to [`Error::Disposed`].
    pub async fn dispose(&self) -> DriverResult<(), I2C> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return self.report("dispose", Err(Error::Disposed));
        }
        info!("Disposing PCA9685 at {}", self.config.address);

        if self.in_flight.load(Ordering::SeqCst) != 0 {
            self.drained.wait().await;
        }

        let mut inner = self.inner.lock().await;
        let result = self.transmit(&mut inner, &commands::all_channels_off()).await;
        self.report("dispose", result)
    }

    /// Consume the driver and give back the bus and delay
    pub fn release(self) -> (I2C, D) {
        let inner = self.inner.into_inner();
        (inner.bus.release(), inner.delay)
    }

    fn admit(&self) -> DriverResult<Admission<'_, M>, I2C> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let admission = Admission {
            in_flight: &self.in_flight,
            closed: &self.closed,
            drained: &self.drained,
        };
        if self.closed.load(Ordering::SeqCst) {
            warn!("PCA9685 at {} is disposed, operation rejected", self.config.address);
            return Err(Error::Disposed);
        }
        Ok(admission)
    }

    fn report<T>(&self, operation: &'static str, result: DriverResult<T, I2C>) -> DriverResult<T, I2C> {
        if let Err(err) = &result {
            error!("{} on {} failed: {:?}", operation, self.config.address, err);
        }
        result
    }

    async fn drive(&self, inner: &mut Inner<I2C, D>, channel: Channel, output: ChannelOutput) -> DriverResult<(), I2C> {
        match output {
            ChannelOutput::FullOff => self.transmit(inner, &commands::channel_off(channel)).await,
            ChannelOutput::FullOn => self.transmit(inner, &commands::channel_on(channel)).await,
            ChannelOutput::Range { on, off } => {
                self.transmit(inner, &commands::pulse_range(channel, on, off)).await
            }
        }
    }

    /// Send writes in order, stopping at the first failure
    async fn transmit(&self, inner: &mut Inner<I2C, D>, writes: &[RegisterWrite]) -> DriverResult<(), I2C> {
        for write in writes {
            self.send(inner, *write).await?;
        }
        Ok(())
    }

    async fn send(&self, inner: &mut Inner<I2C, D>, write: RegisterWrite) -> DriverResult<(), I2C> {
        if self.config.debug {
            debug!("write {:#x} <- {:#x}", write.register, write.value);
        }
        inner
            .bus
            .write_reg(self.config.address, write.register, write.value)
            .await
            .map_err(Error::I2c)
    }

    /// Run the sleep / prescale / settle / restart sequence
    async fn program_frequency(&self, inner: &mut Inner<I2C, D>, frequency: Frequency) -> DriverResult<(), I2C> {
        info!("Setting PWM frequency to {} (prescale {})", frequency, frequency.prescaler());

        let mut program = FrequencyProgram::new(frequency.prescaler());
        let mut failure = None;
        let mut action = program.start();
        loop {
            let event = match action {
                Action::Read { register } => {
                    match inner.bus.read_reg(self.config.address, register).await {
                        Ok(mode) => Event::ModeRead(mode),
                        Err(err) => {
                            failure = Some(Error::I2c(err));
                            Event::TransportFailed
                        }
                    }
                }
                Action::Write(write) => match self.send(inner, write).await {
                    Ok(()) => Event::WriteComplete,
                    Err(err) => {
                        failure = Some(err);
                        Event::TransportFailed
                    }
                },
                Action::Settle => {
                    if self.config.debug {
                        debug!("Waiting {} us for oscillator", self.config.settle_delay_us);
                    }
                    inner.delay.delay_us(self.config.settle_delay_us).await;
                    Event::Settled
                }
                Action::Finish => break,
            };
            action = program.advance(event);
        }

        match failure {
            Some(err) => Err(err),
            None => {
                debug_assert!(program.succeeded());
                inner.frequency = frequency;
                Ok(())
            }
        }
    }
}
