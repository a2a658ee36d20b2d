// Hardware collaborators consumed by the motor and control layers
//
// Provides:
// - Pin output / input capabilities (digital writes, PWM, digital reads)
// - A millisecond clock with blocking sleep
// - A line-oriented diagnostic sink
//
// Concrete backends live in `bridge` (serial pin bridge) and `sim` (in-memory).

pub mod bridge;
pub mod sim;

use std::rc::Rc;
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::info;

pub use bridge::PinBridge;
pub use sim::{RecordingSink, SimClock, SimPins};

/// Pin identifier on the controller board
pub type Pin = u8;

/// Logic level of a digital pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

/// Error types for pin backends
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response from pin bridge {id}: {reason}")]
    InvalidResponse { id: u8, reason: String },

    #[error("Checksum mismatch for pin bridge {id}")]
    ChecksumMismatch { id: u8 },

    #[error("Pin bridge {id} returned error status: 0x{status:02X}")]
    DeviceError { id: u8, status: u8 },

    #[error("Timeout waiting for response from pin bridge {id}")]
    Timeout { id: u8 },
}

/// Digital and PWM output capability.
///
/// Methods take `&self` so that several motor ports can share one backend.
pub trait PinOutput {
    fn configure_output(&self, pin: Pin) -> Result<(), PinError>;

    fn write_digital(&self, pin: Pin, level: Level) -> Result<(), PinError>;

    /// Write a PWM duty value in 0..=255
    fn write_pwm(&self, pin: Pin, duty: u8) -> Result<(), PinError>;
}

/// Digital input capability (line sensors)
pub trait PinInput {
    fn configure_input(&self, pin: Pin) -> Result<(), PinError>;

    fn read_digital(&self, pin: Pin) -> Result<Level, PinError>;
}

impl<T: PinOutput + ?Sized> PinOutput for Rc<T> {
    fn configure_output(&self, pin: Pin) -> Result<(), PinError> {
        (**self).configure_output(pin)
    }

    fn write_digital(&self, pin: Pin, level: Level) -> Result<(), PinError> {
        (**self).write_digital(pin, level)
    }

    fn write_pwm(&self, pin: Pin, duty: u8) -> Result<(), PinError> {
        (**self).write_pwm(pin, duty)
    }
}

impl<T: PinInput + ?Sized> PinInput for Rc<T> {
    fn configure_input(&self, pin: Pin) -> Result<(), PinError> {
        (**self).configure_input(pin)
    }

    fn read_digital(&self, pin: Pin) -> Result<Level, PinError> {
        (**self).read_digital(pin)
    }
}

/// Millisecond clock with a blocking sleep
pub trait Clock {
    fn now_millis(&self) -> u64;

    /// Block the calling thread. Not cancellable.
    fn sleep_millis(&self, millis: u64);
}

/// Fire-and-forget, line-oriented diagnostic output
pub trait DiagnosticSink {
    fn report(&self, line: &str);
}

/// Wall clock measured from construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep_millis(&self, millis: u64) {
        sleep(Duration::from_millis(millis));
    }
}

/// Diagnostic sink that emits each line as a `diagnostic` tracing event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, line: &str) {
        info!(target: "diagnostic", "{}", line);
    }
}
