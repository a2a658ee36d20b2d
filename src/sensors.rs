// Pair of digital IR line sensors
//
// The sensors pull low over a white surface, so "is white" is the inverse of
// the raw digital read.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::hal::{Level, Pin, PinError, PinInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

pub struct LineSensors<I: PinInput> {
    input: I,
    left: Pin,
    right: Pin,
}

impl<I: PinInput> LineSensors<I> {
    /// Configure both pins as inputs. Failures are logged, not fatal.
    pub fn new(input: I, left: Pin, right: Pin) -> Self {
        for pin in [left, right] {
            if let Err(e) = input.configure_input(pin) {
                warn!("Failed to configure sensor pin {} as input: {}", pin, e);
            }
        }
        Self { input, left, right }
    }

    pub fn is_white(&self, side: Side) -> Result<bool, PinError> {
        let pin = match side {
            Side::Left => self.left,
            Side::Right => self.right,
        };
        Ok(self.input.read_digital(pin)? == Level::Low)
    }

    /// Both readings, or `None` if either read failed
    pub fn read_pair(&self) -> Option<(bool, bool)> {
        match (self.is_white(Side::Left), self.is_white(Side::Right)) {
            (Ok(left), Ok(right)) => Some((left, right)),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Line sensor read failed: {}", e);
                None
            }
        }
    }
}
