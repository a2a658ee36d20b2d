// Bench self-test: cycles the drive, the command link and the lift
//
// Each step runs the full sequence and blocks for its duration. Meant for a
// robot on a stand with the wheels off the ground.

use tracing::info;

use super::{Controller, Verbosity};
use crate::hal::{Clock, DiagnosticSink};
use crate::link::CommandSource;
use crate::motor::{Direction, DriveAssembly, Lift, Speed};

const MOTOR_HOLD_MS: u64 = 2000;
const LINK_SETTLE_MS: u64 = 200;
const LIFT_RUN_MS: u64 = 1000;
const LIFT_REST_MS: u64 = 5000;

pub const LINK_PROBE: &str = "Send Test!";

const MOTOR_SEQUENCE: [Direction; 4] = [
    Direction::Forward,
    Direction::Backward,
    Direction::SmoothLeft,
    Direction::HardRight,
];

pub struct SelfTestController<'a, D: DriveAssembly, L: CommandSource> {
    drive: D,
    lift: Option<Lift<'a>>,
    link: L,
    clock: &'a dyn Clock,
    sink: &'a dyn DiagnosticSink,
    speed: Speed,
    runs: u32,
}

impl<'a, D: DriveAssembly, L: CommandSource> SelfTestController<'a, D, L> {
    pub fn new(
        drive: D,
        lift: Option<Lift<'a>>,
        link: L,
        clock: &'a dyn Clock,
        sink: &'a dyn DiagnosticSink,
        speed: Speed,
    ) -> Self {
        Self {
            drive,
            lift,
            link,
            clock,
            sink,
            speed,
            runs: 0,
        }
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Completed full runs
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Hold each maneuver for two seconds, then stop
    pub fn motors_test(&mut self, verbose: bool) {
        if verbose {
            self.sink
                .report(&format!("Motor test at speed {}", self.speed));
        }
        for direction in MOTOR_SEQUENCE {
            self.drive.apply(direction, self.speed);
            self.drive.get_status(verbose, self.sink);
            self.clock.sleep_millis(MOTOR_HOLD_MS);
        }
        self.drive.stop();
    }

    /// Send a probe line, then drain whatever came back
    pub fn link_test(&mut self, verbose: bool) -> String {
        let readiness = self.link.readiness();
        if verbose {
            self.sink.report(&format!("Link test, link {}", readiness));
        }

        self.link.send(LINK_PROBE);
        if verbose {
            self.sink.report(&format!("Sent: {}", LINK_PROBE));
        }

        let reply = self.link.receive_string();
        if verbose {
            self.sink.report(&format!("Received: {}", reply));
        }
        self.clock.sleep_millis(LINK_SETTLE_MS);
        reply
    }

    /// Lower the lift briefly, then stop and rest
    pub fn lift_test(&mut self, verbose: bool) {
        let Some(lift) = self.lift.as_mut() else {
            if verbose {
                self.sink.report("Lift test skipped, no lift wired");
            }
            return;
        };

        lift.lower();
        lift.get_status(verbose, self.sink);
        self.clock.sleep_millis(LIFT_RUN_MS);
        lift.stop();
        lift.get_status(verbose, self.sink);
        self.clock.sleep_millis(LIFT_REST_MS);
    }

    pub fn run_tests(&mut self, verbose: bool) {
        self.motors_test(verbose);
        self.link_test(verbose);
        self.lift_test(verbose);
        self.runs += 1;
        info!("Self-test run {} complete", self.runs);
    }
}

impl<D: DriveAssembly, L: CommandSource> Controller for SelfTestController<'_, D, L> {
    fn step(&mut self, verbosity: Verbosity) {
        self.run_tests(verbosity.verbose);
        if verbosity.echo {
            let status = self.drive.get_status(false, self.sink);
            self.link.send(&status);
        }
    }

    fn halt(&mut self) {
        self.drive.stop();
        if let Some(lift) = self.lift.as_mut() {
            lift.stop();
        }
    }

    fn name(&self) -> &'static str {
        "self-test"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::testing::RecordingDrive;
    use crate::hal::sim::PinWrite;
    use crate::hal::{Level, RecordingSink, SimClock, SimPins};
    use crate::link::ScriptedLink;
    use crate::motor::{L298n, L298nPins};

    #[test]
    fn test_motor_sequence_and_timing() {
        let clock = SimClock::new();
        let sink = RecordingSink::new();
        let mut controller = SelfTestController::new(
            RecordingDrive::new(&clock),
            None,
            ScriptedLink::new(*b""),
            &clock,
            &sink,
            200,
        );

        controller.motors_test(false);
        assert_eq!(
            controller.drive().calls,
            vec![
                (Direction::Forward, 200, 0),
                (Direction::Backward, 200, 2000),
                (Direction::SmoothLeft, 200, 4000),
                (Direction::HardRight, 200, 6000),
                (Direction::Stop, 0, 8000),
            ]
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_link_probe_and_reply() {
        let clock = SimClock::new();
        let sink = RecordingSink::new();
        let mut controller = SelfTestController::new(
            RecordingDrive::new(&clock),
            None,
            ScriptedLink::new(*b"pong"),
            &clock,
            &sink,
            200,
        );

        assert_eq!(controller.link_test(true), "pong");
        assert_eq!(controller.link().sent(), &[LINK_PROBE]);
        assert_eq!(
            sink.lines(),
            vec![
                "Link test, link ready".to_string(),
                "Sent: Send Test!".to_string(),
                "Received: pong".to_string(),
            ]
        );
        assert_eq!(clock.now_millis(), 200);
    }

    #[test]
    fn test_full_run_cycles_lift() {
        let clock = SimClock::new();
        let sink = RecordingSink::new();
        let pins = SimPins::new();
        let mut lift_port = L298n::new(pins.clone(), L298nPins::new(22, 23, 24, 25, 44, 45));
        let mut controller = SelfTestController::new(
            RecordingDrive::new(&clock),
            Some(Lift::new(&mut lift_port)),
            ScriptedLink::new(*b""),
            &clock,
            &sink,
            255,
        );

        Controller::step(
            &mut controller,
            Verbosity {
                verbose: false,
                echo: true,
            },
        );

        assert_eq!(controller.runs(), 1);
        assert_eq!(clock.now_millis(), 8000 + 200 + 1000 + 5000);
        assert_eq!(pins.level(23), Level::Low);
        assert_eq!(pins.pwm(44), Some(0));
        assert!(
            pins.writes()
                .contains(&PinWrite::Digital(23, Level::High))
        );
        assert_eq!(
            controller.link().sent(),
            &[LINK_PROBE, "test drive: stop"]
        );
    }

    #[test]
    fn test_missing_lift_is_skipped() {
        let clock = SimClock::new();
        let sink = RecordingSink::new();
        let mut controller = SelfTestController::new(
            RecordingDrive::new(&clock),
            None,
            ScriptedLink::new(*b""),
            &clock,
            &sink,
            255,
        );

        controller.lift_test(true);
        assert_eq!(sink.lines(), vec!["Lift test skipped, no lift wired".to_string()]);
        assert_eq!(clock.now_millis(), 0);
    }
}
