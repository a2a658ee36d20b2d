// Drive assemblies: several motor driver ports acting as one drive train
//
// Every maneuver is broadcast to each owned port in order. The assembly keeps
// its own status tag, set right after dispatch; the combined status line reads
// the ports' statuses again, so both agree after every `get_status` call.

use tracing::{debug, warn};

use super::port::{Direction, DriveStatus, MotorDriverPort, Speed};
use crate::config::DRIVE_CAPACITY;
use crate::hal::DiagnosticSink;

/// A logical drive train made of one or more ports
pub trait DriveAssembly {
    /// Dispatch a maneuver to every port. `speed` is ignored for `Stop`.
    fn apply(&mut self, direction: Direction, speed: Speed);

    /// Status tag of the assembly itself
    fn status(&self) -> DriveStatus;

    /// Combined status line including every port's own status
    fn status_line(&self) -> String;

    fn get_status(&self, verbose: bool, sink: &dyn DiagnosticSink) -> String {
        let line = self.status_line();
        if verbose {
            sink.report(&line);
        }
        line
    }

    fn forward(&mut self, speed: Speed) {
        self.apply(Direction::Forward, speed);
    }

    fn backward(&mut self, speed: Speed) {
        self.apply(Direction::Backward, speed);
    }

    fn smooth_left(&mut self, speed: Speed) {
        self.apply(Direction::SmoothLeft, speed);
    }

    fn smooth_right(&mut self, speed: Speed) {
        self.apply(Direction::SmoothRight, speed);
    }

    fn hard_left(&mut self, speed: Speed) {
        self.apply(Direction::HardLeft, speed);
    }

    fn hard_right(&mut self, speed: Speed) {
        self.apply(Direction::HardRight, speed);
    }

    fn stop(&mut self) {
        self.apply(Direction::Stop, 0);
    }
}

impl<T: DriveAssembly + ?Sized> DriveAssembly for Box<T> {
    fn apply(&mut self, direction: Direction, speed: Speed) {
        (**self).apply(direction, speed);
    }

    fn status(&self) -> DriveStatus {
        (**self).status()
    }

    fn status_line(&self) -> String {
        (**self).status_line()
    }
}

/// Four wheels on two boards: front and back
pub struct FourWheelDrive<'a> {
    front: &'a mut dyn MotorDriverPort,
    back: &'a mut dyn MotorDriverPort,
    status: DriveStatus,
}

impl<'a> FourWheelDrive<'a> {
    pub fn new(front: &'a mut dyn MotorDriverPort, back: &'a mut dyn MotorDriverPort) -> Self {
        Self {
            front,
            back,
            status: DriveStatus::Ready,
        }
    }
}

impl DriveAssembly for FourWheelDrive<'_> {
    fn apply(&mut self, direction: Direction, speed: Speed) {
        self.front.drive(direction, speed);
        self.back.drive(direction, speed);
        self.status = DriveStatus::Moving(direction);
    }

    fn status(&self) -> DriveStatus {
        self.status
    }

    fn status_line(&self) -> String {
        format!(
            "4 Wheel Drive System Status: {}, Front: {}, Back: {}",
            self.status,
            self.front.status(),
            self.back.status()
        )
    }
}

/// Up to `DRIVE_CAPACITY` boards driven identically
pub struct MultiDrive<'a> {
    ports: Vec<&'a mut dyn MotorDriverPort>,
    status: DriveStatus,
}

impl<'a> MultiDrive<'a> {
    /// Keep the first `min(requested, DRIVE_CAPACITY)` ports; the rest are ignored.
    pub fn new(requested: usize, ports: Vec<&'a mut dyn MotorDriverPort>) -> Self {
        let retained = requested.min(DRIVE_CAPACITY).min(ports.len());
        if retained < ports.len() {
            debug!(
                "Drive keeps {} of {} supplied ports (capacity {})",
                retained,
                ports.len(),
                DRIVE_CAPACITY
            );
        }
        if requested > ports.len() {
            warn!(
                "Drive requested {} ports but only {} were supplied",
                requested,
                ports.len()
            );
        }

        let mut ports = ports;
        ports.truncate(retained);

        Self {
            ports,
            status: DriveStatus::Ready,
        }
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl DriveAssembly for MultiDrive<'_> {
    fn apply(&mut self, direction: Direction, speed: Speed) {
        for port in self.ports.iter_mut() {
            port.drive(direction, speed);
        }
        self.status = DriveStatus::Moving(direction);
    }

    fn status(&self) -> DriveStatus {
        self.status
    }

    fn status_line(&self) -> String {
        let mut line = format!("{} Wheel Drive System Status: {}", self.ports.len(), self.status);
        for (i, port) in self.ports.iter().enumerate() {
            line.push_str(&format!(", {}: {}", i + 1, port.status()));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{Level, RecordingSink, SimPins};
    use crate::motor::l298n::{L298n, L298nPins};

    fn board(sim: &SimPins, base: u8) -> L298n<SimPins> {
        L298n::new(
            sim.clone(),
            L298nPins::new(base, base + 1, base + 2, base + 3, base + 4, base + 5),
        )
    }

    fn as_ports(boards: &mut [L298n<SimPins>]) -> Vec<&mut dyn MotorDriverPort> {
        boards
            .iter_mut()
            .map(|b| b as &mut dyn MotorDriverPort)
            .collect()
    }

    fn assert_board_idle(sim: &SimPins, base: u8) {
        for pin in base..base + 4 {
            assert_eq!(sim.level(pin), Level::Low, "pin {}", pin);
        }
        assert_eq!(sim.pwm(base + 4), Some(0));
        assert_eq!(sim.pwm(base + 5), Some(0));
    }

    #[test]
    fn test_four_wheel_broadcasts_to_both_boards() {
        let sim = SimPins::new();
        let mut front = board(&sim, 2);
        let mut back = board(&sim, 8);
        let mut drive = FourWheelDrive::new(&mut front, &mut back);

        drive.hard_right(180);

        // left forward + right backward on both boards
        for base in [2u8, 8] {
            assert_eq!(sim.level(base), Level::High);
            assert_eq!(sim.level(base + 1), Level::Low);
            assert_eq!(sim.level(base + 2), Level::Low);
            assert_eq!(sim.level(base + 3), Level::High);
            assert_eq!(sim.pwm(base + 4), Some(180));
        }
        assert_eq!(
            drive.status_line(),
            "4 Wheel Drive System Status: hard_right, Front: hard_right, Back: hard_right"
        );
    }

    #[test]
    fn test_stop_zeroes_every_port_from_any_state() {
        for prior in Direction::ALL {
            let sim = SimPins::new();
            let mut boards = [board(&sim, 2), board(&sim, 8), board(&sim, 20)];
            let mut drive = MultiDrive::new(3, as_ports(&mut boards));

            drive.apply(prior, 255);
            drive.stop();

            for base in [2u8, 8, 20] {
                assert_board_idle(&sim, base);
            }
            assert_eq!(drive.status(), DriveStatus::Moving(Direction::Stop));
        }
    }

    #[test]
    fn test_multi_drive_truncates_to_capacity_in_order() {
        let sim = SimPins::new();
        let mut boards: Vec<L298n<SimPins>> =
            (0..12u8).map(|i| board(&sim, 10 + i * 6)).collect();
        let mut drive = MultiDrive::new(12, as_ports(&mut boards));
        assert_eq!(drive.len(), DRIVE_CAPACITY);

        drive.forward(99);

        // retained boards 0..10 moved, boards 10 and 11 untouched
        for i in 0..12u8 {
            let base = 10 + i * 6;
            let expected = if (i as usize) < DRIVE_CAPACITY {
                Level::High
            } else {
                Level::Low
            };
            assert_eq!(sim.level(base), expected, "board {}", i);
        }
        assert!(drive.status_line().starts_with("10 Wheel Drive System Status: forward, 1: forward"));
        assert!(drive.status_line().ends_with(", 10: forward"));
    }

    #[test]
    fn test_multi_drive_respects_smaller_requested_count() {
        let sim = SimPins::new();
        let mut boards = [board(&sim, 2), board(&sim, 8)];
        let mut drive = MultiDrive::new(1, as_ports(&mut boards));

        drive.backward(50);

        assert_eq!(drive.len(), 1);
        assert_eq!(sim.level(3), Level::High);
        assert_eq!(sim.level(9), Level::Low);
    }

    #[test]
    fn test_status_line_format_and_single_report() {
        let sim = SimPins::new();
        let mut boards = [board(&sim, 2), board(&sim, 8)];
        let sink = RecordingSink::new();
        let mut drive = MultiDrive::new(2, as_ports(&mut boards));

        assert_eq!(
            drive.get_status(false, &sink),
            "2 Wheel Drive System Status: ready, 1: ready, 2: ready"
        );
        assert!(sink.is_empty());

        drive.smooth_left(120);
        let line = drive.get_status(true, &sink);
        assert_eq!(
            line,
            "2 Wheel Drive System Status: smooth_left, 1: smooth_left, 2: smooth_left"
        );
        assert_eq!(sink.lines(), vec![line]);
    }
}
