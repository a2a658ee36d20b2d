// Motor driver port: one physical 2-motor driver board
//
// Concrete drivers implement the six per-side primitives. Composite maneuvers
// are default methods built on those primitives and may be overridden.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hal::DiagnosticSink;

/// Speed magnitude: 0 = stationary, 255 = maximum. Direction is separate.
pub type Speed = u8;

pub const MAX_SPEED: Speed = 255;

/// Drive maneuvers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    /// Right side forward, left side idle
    SmoothLeft,
    /// Left side forward, right side idle
    SmoothRight,
    /// Pivot in place: right forward, left backward
    HardLeft,
    /// Pivot in place: left forward, right backward
    HardRight,
    Stop,
}

impl Direction {
    pub const ALL: [Direction; 7] = [
        Direction::Forward,
        Direction::Backward,
        Direction::SmoothLeft,
        Direction::SmoothRight,
        Direction::HardLeft,
        Direction::HardRight,
        Direction::Stop,
    ];

    /// Status tag naming the maneuver
    pub fn tag(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::SmoothLeft => "smooth_left",
            Direction::SmoothRight => "smooth_right",
            Direction::HardLeft => "hard_left",
            Direction::HardRight => "hard_right",
            Direction::Stop => "stop",
        }
    }
}

/// Last commanded state of a port or drive assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveStatus {
    #[default]
    Ready,
    Moving(Direction),
}

impl fmt::Display for DriveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveStatus::Ready => f.write_str("ready"),
            DriveStatus::Moving(direction) => f.write_str(direction.tag()),
        }
    }
}

/// Capability of one dual H-bridge driver board.
///
/// Speeds are not validated here; `Speed` is already bounded to 0..=255.
pub trait MotorDriverPort {
    fn left_motor_forward(&mut self, speed: Speed);

    fn left_motor_backward(&mut self, speed: Speed);

    fn right_motor_forward(&mut self, speed: Speed);

    fn right_motor_backward(&mut self, speed: Speed);

    fn left_motor_stop(&mut self);

    fn right_motor_stop(&mut self);

    fn status(&self) -> DriveStatus;

    fn set_status(&mut self, status: DriveStatus);

    fn forward(&mut self, speed: Speed) {
        self.left_motor_forward(speed);
        self.right_motor_forward(speed);
        self.set_status(DriveStatus::Moving(Direction::Forward));
    }

    fn backward(&mut self, speed: Speed) {
        self.left_motor_backward(speed);
        self.right_motor_backward(speed);
        self.set_status(DriveStatus::Moving(Direction::Backward));
    }

    fn smooth_left(&mut self, speed: Speed) {
        self.right_motor_forward(speed);
        self.left_motor_stop();
        self.set_status(DriveStatus::Moving(Direction::SmoothLeft));
    }

    fn smooth_right(&mut self, speed: Speed) {
        self.left_motor_forward(speed);
        self.right_motor_stop();
        self.set_status(DriveStatus::Moving(Direction::SmoothRight));
    }

    fn hard_left(&mut self, speed: Speed) {
        self.right_motor_forward(speed);
        self.left_motor_backward(speed);
        self.set_status(DriveStatus::Moving(Direction::HardLeft));
    }

    fn hard_right(&mut self, speed: Speed) {
        self.left_motor_forward(speed);
        self.right_motor_backward(speed);
        self.set_status(DriveStatus::Moving(Direction::HardRight));
    }

    fn stop(&mut self) {
        self.left_motor_stop();
        self.right_motor_stop();
        self.set_status(DriveStatus::Moving(Direction::Stop));
    }

    /// Dispatch a maneuver by value. `speed` is ignored for `Stop`.
    fn drive(&mut self, direction: Direction, speed: Speed) {
        match direction {
            Direction::Forward => self.forward(speed),
            Direction::Backward => self.backward(speed),
            Direction::SmoothLeft => self.smooth_left(speed),
            Direction::SmoothRight => self.smooth_right(speed),
            Direction::HardLeft => self.hard_left(speed),
            Direction::HardRight => self.hard_right(speed),
            Direction::Stop => self.stop(),
        }
    }

    /// Current status tag, also reported to `sink` when `verbose`
    fn get_status(&self, verbose: bool, sink: &dyn DiagnosticSink) -> String {
        let status = self.status().to_string();
        if verbose {
            sink.report(&status);
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::RecordingSink;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        LeftForward(Speed),
        LeftBackward(Speed),
        RightForward(Speed),
        RightBackward(Speed),
        LeftStop,
        RightStop,
    }

    #[derive(Default)]
    struct CallLog {
        calls: Vec<Call>,
        status: DriveStatus,
    }

    impl MotorDriverPort for CallLog {
        fn left_motor_forward(&mut self, speed: Speed) {
            self.calls.push(Call::LeftForward(speed));
        }
        fn left_motor_backward(&mut self, speed: Speed) {
            self.calls.push(Call::LeftBackward(speed));
        }
        fn right_motor_forward(&mut self, speed: Speed) {
            self.calls.push(Call::RightForward(speed));
        }
        fn right_motor_backward(&mut self, speed: Speed) {
            self.calls.push(Call::RightBackward(speed));
        }
        fn left_motor_stop(&mut self) {
            self.calls.push(Call::LeftStop);
        }
        fn right_motor_stop(&mut self) {
            self.calls.push(Call::RightStop);
        }
        fn status(&self) -> DriveStatus {
            self.status
        }
        fn set_status(&mut self, status: DriveStatus) {
            self.status = status;
        }
    }

    #[test]
    fn test_default_maneuvers_compose_primitives() {
        let cases = [
            (Direction::Forward, vec![Call::LeftForward(90), Call::RightForward(90)]),
            (Direction::Backward, vec![Call::LeftBackward(90), Call::RightBackward(90)]),
            (Direction::SmoothLeft, vec![Call::RightForward(90), Call::LeftStop]),
            (Direction::SmoothRight, vec![Call::LeftForward(90), Call::RightStop]),
            (Direction::HardLeft, vec![Call::RightForward(90), Call::LeftBackward(90)]),
            (Direction::HardRight, vec![Call::LeftForward(90), Call::RightBackward(90)]),
            (Direction::Stop, vec![Call::LeftStop, Call::RightStop]),
        ];

        for (direction, expected) in cases {
            let mut port = CallLog::default();
            port.drive(direction, 90);
            assert_eq!(port.calls, expected, "{:?}", direction);
            assert_eq!(port.status(), DriveStatus::Moving(direction));
        }
    }

    #[test]
    fn test_status_tags() {
        assert_eq!(DriveStatus::Ready.to_string(), "ready");
        assert_eq!(DriveStatus::Moving(Direction::HardLeft).to_string(), "hard_left");
        assert_eq!(DriveStatus::Moving(Direction::Stop).to_string(), "stop");
    }

    #[test]
    fn test_get_status_reports_only_when_verbose() {
        let sink = RecordingSink::new();
        let mut port = CallLog::default();
        port.smooth_right(10);

        assert_eq!(port.get_status(false, &sink), "smooth_right");
        assert!(sink.is_empty());

        assert_eq!(port.get_status(true, &sink), "smooth_right");
        assert_eq!(sink.lines(), vec!["smooth_right".to_string()]);
    }
}
