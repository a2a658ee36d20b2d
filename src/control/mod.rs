// Controllers: one is selected at startup and stepped once per loop tick
//
// - manual: one command byte per tick from a command link
// - autonomous: line following plus a scripted lift choreography
// - self_test: cycles every actuator and the link for bench checks

pub mod autonomous;
pub mod manual;
pub mod self_test;

pub use autonomous::{AutonomousController, Leg, Mission, Pivot};
pub use manual::ManualController;
pub use self_test::SelfTestController;

/// Per-step reporting flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verbosity {
    /// Report status to the diagnostic sink
    pub verbose: bool,
    /// Send status back over the command link
    pub echo: bool,
}

pub trait Controller {
    /// Run one tick. May block for scripted maneuvers.
    fn step(&mut self, verbosity: Verbosity);

    /// Stop every actuator the controller drives
    fn halt(&mut self);

    fn name(&self) -> &'static str;
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::hal::{Clock, SimClock};
    use crate::motor::{Direction, DriveAssembly, DriveStatus, Speed};

    /// Drive assembly that records each maneuver with the clock time it was issued
    pub struct RecordingDrive<'c> {
        clock: &'c SimClock,
        pub calls: Vec<(Direction, Speed, u64)>,
        status: DriveStatus,
    }

    impl<'c> RecordingDrive<'c> {
        pub fn new(clock: &'c SimClock) -> Self {
            Self {
                clock,
                calls: Vec::new(),
                status: DriveStatus::Ready,
            }
        }

        pub fn directions(&self) -> Vec<Direction> {
            self.calls.iter().map(|&(direction, _, _)| direction).collect()
        }
    }

    impl DriveAssembly for RecordingDrive<'_> {
        fn apply(&mut self, direction: Direction, speed: Speed) {
            let speed = if direction == Direction::Stop { 0 } else { speed };
            self.calls.push((direction, speed, self.clock.now_millis()));
            self.status = DriveStatus::Moving(direction);
        }

        fn status(&self) -> DriveStatus {
            self.status
        }

        fn status_line(&self) -> String {
            format!("test drive: {}", self.status)
        }
    }
}
