//! Frequency Program State Machine
//!
//! Reprogramming the prescaler is only allowed while the oscillator is
//! asleep, and the oscillator needs time to settle before the PWM
//! channels are restarted:
//!
//! ```text
//! ReadingMode ──mode──▶ Reprogramming (3 writes) ──▶ AwaitingSettle
//!      │                      │                          │
//!      │                      │                       settled
//!      ▼                      ▼                          ▼
//!    Failed ◀──────────── Failed ◀──────────────── Restarting ──▶ Done
//! ```
//!
//! The machine is pure: the driver executes each [`Action`] and feeds the
//! outcome back as an [`Event`].

use super::commands::{bits, reg, RegisterWrite};

/// Where the program currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the MODE1 read
    ReadingMode,
    /// Sleep, prescale and wake writes in progress; `sent` of them completed
    Reprogramming {
        /// MODE1 as read before reprogramming
        old_mode: u8,
        /// Writes of this phase already completed (0-2)
        sent: u8,
    },
    /// Oscillator waking up
    AwaitingSettle {
        /// MODE1 as read before reprogramming
        old_mode: u8,
    },
    /// RESTART write in flight
    Restarting,
    /// Finished successfully
    Done,
    /// Aborted after a bus failure
    Failed,
}

/// What the driver must do next
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Read one register and report it with [`Event::ModeRead`]
    Read {
        /// Register to read
        register: u8,
    },
    /// Write one register and report [`Event::WriteComplete`]
    Write(RegisterWrite),
    /// Wait the settling delay and report [`Event::Settled`]
    Settle,
    /// Stop; [`FrequencyProgram::phase`] tells success from failure
    Finish,
}

/// Outcome of the last [`Action`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// MODE1 read returned this value
    ModeRead(u8),
    /// The requested write completed
    WriteComplete,
    /// The settling delay elapsed
    Settled,
    /// The requested read or write failed
    TransportFailed,
}

/// MODE1 value that puts the oscillator to sleep without restarting
#[must_use]
pub const fn sleep_mode(old_mode: u8) -> u8 {
    (old_mode & !bits::RESTART) | bits::SLEEP
}

/// MODE1 value that restarts the PWM channels
#[must_use]
pub const fn restart_mode(old_mode: u8) -> u8 {
    old_mode | bits::RESTART
}

/// One run of the frequency program
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrequencyProgram {
    prescaler: u8,
    phase: Phase,
}

impl FrequencyProgram {
    /// Create a program for the given prescaler
    #[must_use]
    pub const fn new(prescaler: u8) -> Self {
        Self {
            prescaler,
            phase: Phase::ReadingMode,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Prescaler being programmed
    #[must_use]
    pub const fn prescaler(&self) -> u8 {
        self.prescaler
    }

    /// First action of the program
    #[must_use]
    pub const fn start(&self) -> Action {
        Action::Read { register: reg::MODE1 }
    }

    /// Feed back the outcome of the last action and get the next one
    ///
    /// # Panics
    ///
    /// Panics on an event the current phase cannot receive. That only
    /// happens when the caller executes actions out of order.
    pub fn advance(&mut self, event: Event) -> Action {
        let (phase, action) = match (self.phase, event) {
            (Phase::Done | Phase::Failed, _) => (self.phase, Action::Finish),
            (_, Event::TransportFailed) => (Phase::Failed, Action::Finish),
            (Phase::ReadingMode, Event::ModeRead(old_mode)) => (
                Phase::Reprogramming { old_mode, sent: 0 },
                Action::Write(RegisterWrite::new(reg::MODE1, sleep_mode(old_mode))),
            ),
            (Phase::Reprogramming { old_mode, sent: 0 }, Event::WriteComplete) => (
                Phase::Reprogramming { old_mode, sent: 1 },
                Action::Write(RegisterWrite::new(reg::PRE_SCALE, self.prescaler)),
            ),
            (Phase::Reprogramming { old_mode, sent: 1 }, Event::WriteComplete) => (
                Phase::Reprogramming { old_mode, sent: 2 },
                Action::Write(RegisterWrite::new(reg::MODE1, old_mode)),
            ),
            (Phase::Reprogramming { old_mode, sent: 2 }, Event::WriteComplete) => {
                (Phase::AwaitingSettle { old_mode }, Action::Settle)
            }
            (Phase::AwaitingSettle { old_mode }, Event::Settled) => (
                Phase::Restarting,
                Action::Write(RegisterWrite::new(reg::MODE1, restart_mode(old_mode))),
            ),
            (Phase::Restarting, Event::WriteComplete) => (Phase::Done, Action::Finish),
            (phase, event) => panic!("frequency program got {:?} in {:?}", event, phase),
        };
        self.phase = phase;
        action
    }

    /// Check whether the program finished successfully
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(register: u8, value: u8) -> Action {
        Action::Write(RegisterWrite::new(register, value))
    }

    #[test]
    fn full_program_from_default_mode() {
        let mut program = FrequencyProgram::new(121);
        assert_eq!(program.start(), Action::Read { register: 0x00 });

        assert_eq!(program.advance(Event::ModeRead(0x01)), write(0x00, 0x11));
        assert_eq!(program.advance(Event::WriteComplete), write(0xFE, 121));
        assert_eq!(program.advance(Event::WriteComplete), write(0x00, 0x01));
        assert_eq!(program.advance(Event::WriteComplete), Action::Settle);
        assert_eq!(program.phase(), Phase::AwaitingSettle { old_mode: 0x01 });
        assert_eq!(program.advance(Event::Settled), write(0x00, 0x81));
        assert_eq!(program.advance(Event::WriteComplete), Action::Finish);
        assert!(program.succeeded());
    }

    #[test]
    fn sleep_mode_clears_restart() {
        assert_eq!(sleep_mode(0xA1), 0x31);
        assert_eq!(restart_mode(0x21), 0xA1);
    }

    #[test]
    fn read_failure_finishes_without_writes() {
        let mut program = FrequencyProgram::new(121);
        assert_eq!(program.advance(Event::TransportFailed), Action::Finish);
        assert_eq!(program.phase(), Phase::Failed);
        assert!(!program.succeeded());
    }

    #[test]
    fn write_failure_skips_settle_and_restart() {
        let mut program = FrequencyProgram::new(30);
        program.advance(Event::ModeRead(0x01));
        program.advance(Event::WriteComplete);
        assert_eq!(program.advance(Event::TransportFailed), Action::Finish);
        assert_eq!(program.advance(Event::WriteComplete), Action::Finish);
        assert_eq!(program.phase(), Phase::Failed);
    }

    #[test]
    #[should_panic(expected = "frequency program")]
    fn out_of_order_event_is_fatal() {
        let mut program = FrequencyProgram::new(121);
        program.advance(Event::Settled);
    }
}
