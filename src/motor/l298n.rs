// L298N dual H-bridge driver
//
// Two direction pins per side, plus an optional enable (PWM) pin per side
// for speed control. Without an enable pin the side runs at full speed
// whenever a direction pin is high.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::port::{DriveStatus, MotorDriverPort, Speed};
use crate::hal::{Level, Pin, PinOutput};

/// Pin wiring for one L298N board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct L298nPins {
    pub left_forward: Pin,
    pub left_backward: Pin,
    pub right_forward: Pin,
    pub right_backward: Pin,
    #[serde(default)]
    pub enable_left: Option<Pin>,
    #[serde(default)]
    pub enable_right: Option<Pin>,
}

impl L298nPins {
    /// Wiring with speed control on both sides
    pub const fn new(
        left_forward: Pin,
        left_backward: Pin,
        right_forward: Pin,
        right_backward: Pin,
        enable_left: Pin,
        enable_right: Pin,
    ) -> Self {
        Self {
            left_forward,
            left_backward,
            right_forward,
            right_backward,
            enable_left: Some(enable_left),
            enable_right: Some(enable_right),
        }
    }

    /// Wiring without enable pins (no speed control)
    pub const fn without_enable(
        left_forward: Pin,
        left_backward: Pin,
        right_forward: Pin,
        right_backward: Pin,
    ) -> Self {
        Self {
            left_forward,
            left_backward,
            right_forward,
            right_backward,
            enable_left: None,
            enable_right: None,
        }
    }
}

/// One L298N board driven through a pin backend
pub struct L298n<P: PinOutput> {
    output: P,
    pins: L298nPins,
    status: DriveStatus,
}

impl<P: PinOutput> L298n<P> {
    /// Configure all wired pins as outputs. Pin failures are logged, not fatal.
    pub fn new(output: P, pins: L298nPins) -> Self {
        if pins.enable_left.is_none() {
            warn!("Left motor speed control pin not set up");
        }
        if pins.enable_right.is_none() {
            warn!("Right motor speed control pin not set up");
        }

        let port = Self {
            output,
            pins,
            status: DriveStatus::Ready,
        };

        let wired = [
            Some(pins.left_forward),
            Some(pins.left_backward),
            Some(pins.right_forward),
            Some(pins.right_backward),
            pins.enable_left,
            pins.enable_right,
        ];
        for pin in wired.into_iter().flatten() {
            if let Err(e) = port.output.configure_output(pin) {
                warn!("Failed to configure pin {} as output: {}", pin, e);
            }
        }

        debug!("L298N ready on {:?}", pins);
        port
    }

    pub fn pins(&self) -> &L298nPins {
        &self.pins
    }

    fn write(&self, pin: Pin, level: Level) {
        if let Err(e) = self.output.write_digital(pin, level) {
            warn!("Failed to write pin {}: {}", pin, e);
        }
    }

    fn write_speed(&self, enable: Option<Pin>, speed: Speed) {
        if let Some(pin) = enable {
            if let Err(e) = self.output.write_pwm(pin, speed) {
                warn!("Failed to write PWM on pin {}: {}", pin, e);
            }
        }
    }

    fn set_left(&self, forward: Level, backward: Level, speed: Speed) {
        self.write(self.pins.left_forward, forward);
        self.write(self.pins.left_backward, backward);
        self.write_speed(self.pins.enable_left, speed);
    }

    fn set_right(&self, forward: Level, backward: Level, speed: Speed) {
        self.write(self.pins.right_forward, forward);
        self.write(self.pins.right_backward, backward);
        self.write_speed(self.pins.enable_right, speed);
    }
}

impl<P: PinOutput> MotorDriverPort for L298n<P> {
    fn left_motor_forward(&mut self, speed: Speed) {
        self.set_left(Level::High, Level::Low, speed);
    }

    fn left_motor_backward(&mut self, speed: Speed) {
        self.set_left(Level::Low, Level::High, speed);
    }

    fn right_motor_forward(&mut self, speed: Speed) {
        self.set_right(Level::High, Level::Low, speed);
    }

    fn right_motor_backward(&mut self, speed: Speed) {
        self.set_right(Level::Low, Level::High, speed);
    }

    fn left_motor_stop(&mut self) {
        self.set_left(Level::Low, Level::Low, 0);
    }

    fn right_motor_stop(&mut self) {
        self.set_right(Level::Low, Level::Low, 0);
    }

    fn status(&self) -> DriveStatus {
        self.status
    }

    fn set_status(&mut self, status: DriveStatus) {
        self.status = status;
    }
}
