// Autonomous mission: follow the line, then run the lift choreography
//
// A mission is a list of legs. Each leg follows the line for `follow_ms`,
// waits for the marker sensor to read non-white, then blocks while it runs
// the pick-and-place sequence:
//
//   stop, lower lift, creep forward, raise lift,
//   reverse until the marker sensor reads white again, optional pivot
//
// The next leg's clock starts when the previous choreography ends. After the
// last leg the controller is halted and only ever stops the drive.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Controller, Verbosity};
use crate::hal::{Clock, DiagnosticSink, PinInput};
use crate::motor::{Direction, DriveAssembly, Lift, Speed};
use crate::sensors::{LineSensors, Side};

/// Timed turn after a leg's choreography
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pivot {
    pub direction: Direction,
    pub millis: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    /// Line-following time before the marker is checked
    pub follow_ms: u64,
    pub follow_speed: Speed,
    /// Speed for the forward creep, the reverse and the pivot
    pub drive_speed: Speed,
    pub lower_ms: u64,
    pub advance_ms: u64,
    pub raise_ms: u64,
    #[serde(default)]
    pub pivot: Option<Pivot>,
}

impl Default for Leg {
    fn default() -> Self {
        Self {
            follow_ms: 4000,
            follow_speed: 150,
            drive_speed: 150,
            lower_ms: 2000,
            advance_ms: 2000,
            raise_ms: 4000,
            pivot: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mission {
    pub legs: Vec<Leg>,
    /// Sensor that detects the marker
    pub marker: Side,
    /// Sensor poll period while reversing off the marker
    pub poll_ms: u64,
}

impl Default for Mission {
    fn default() -> Self {
        Self::single_marker()
    }
}

impl Mission {
    /// One marker, no turn afterwards
    pub fn single_marker() -> Self {
        Self {
            legs: vec![Leg::default()],
            marker: Side::Right,
            poll_ms: 5,
        }
    }

    /// Pick at the first marker, turn onto the second line, place at the second marker
    pub fn two_marker() -> Self {
        let first = Leg {
            pivot: Some(Pivot {
                direction: Direction::HardRight,
                millis: 600,
            }),
            ..Leg::default()
        };
        let second = Leg {
            follow_ms: 3000,
            follow_speed: 120,
            drive_speed: 120,
            advance_ms: 1500,
            pivot: Some(Pivot {
                direction: Direction::HardLeft,
                millis: 600,
            }),
            ..Leg::default()
        };
        Self {
            legs: vec![first, second],
            ..Self::single_marker()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Following { leg: usize, started_at: u64 },
    Halted,
}

pub struct AutonomousController<'a, D: DriveAssembly, I: PinInput> {
    drive: D,
    lift: Lift<'a>,
    sensors: LineSensors<I>,
    clock: &'a dyn Clock,
    sink: &'a dyn DiagnosticSink,
    mission: Mission,
    phase: Phase,
}

impl<'a, D: DriveAssembly, I: PinInput> AutonomousController<'a, D, I> {
    /// The first leg's clock starts now. An empty mission starts halted.
    pub fn new(
        drive: D,
        lift: Lift<'a>,
        sensors: LineSensors<I>,
        clock: &'a dyn Clock,
        sink: &'a dyn DiagnosticSink,
        mission: Mission,
    ) -> Self {
        let phase = if mission.legs.is_empty() {
            warn!("Mission has no legs; starting halted");
            Phase::Halted
        } else {
            Phase::Following {
                leg: 0,
                started_at: clock.now_millis(),
            }
        };

        Self {
            drive,
            lift,
            sensors,
            clock,
            sink,
            mission,
            phase,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    pub fn lift(&self) -> &Lift<'a> {
        &self.lift
    }

    fn follow_line(&mut self, speed: Speed) {
        let Some((left_white, right_white)) = self.sensors.read_pair() else {
            return;
        };
        match (left_white, right_white) {
            (true, true) => self.drive.forward(speed),
            (true, false) => self.drive.hard_left(speed),
            (false, true) => self.drive.hard_right(speed),
            (false, false) => self.drive.stop(),
        }
    }

    /// Blocks until the marker sensor reads white, polling every `poll_ms`
    fn reverse_off_marker(&mut self, speed: Speed) {
        self.drive.backward(speed);
        loop {
            match self.sensors.is_white(self.mission.marker) {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => debug!("Marker read failed while reversing: {}", e),
            }
            self.clock.sleep_millis(self.mission.poll_ms);
        }
        self.drive.stop();
    }

    fn run_choreography(&mut self, leg: &Leg) {
        self.drive.stop();

        self.lift.lower();
        self.clock.sleep_millis(leg.lower_ms);
        self.lift.stop();

        self.drive.forward(leg.drive_speed);
        self.clock.sleep_millis(leg.advance_ms);
        self.drive.stop();

        self.lift.raise();
        self.clock.sleep_millis(leg.raise_ms);
        self.lift.stop();

        self.reverse_off_marker(leg.drive_speed);

        if let Some(pivot) = leg.pivot {
            self.drive.apply(pivot.direction, leg.drive_speed);
            self.clock.sleep_millis(pivot.millis);
            self.drive.stop();
        }
    }

    fn finish_leg(&mut self, index: usize) {
        let next = index + 1;
        self.phase = if next < self.mission.legs.len() {
            info!("Leg {} done, following line for leg {}", index + 1, next + 1);
            Phase::Following {
                leg: next,
                started_at: self.clock.now_millis(),
            }
        } else {
            info!("Mission complete, halting");
            Phase::Halted
        };
    }

    pub fn step(&mut self, verbosity: Verbosity) {
        match self.phase {
            Phase::Halted => self.drive.stop(),
            Phase::Following { leg: index, started_at } => {
                let leg = self.mission.legs[index];
                let elapsed = self.clock.now_millis().saturating_sub(started_at);

                if elapsed < leg.follow_ms {
                    self.follow_line(leg.follow_speed);
                } else {
                    match self.sensors.is_white(self.mission.marker) {
                        Ok(false) => {
                            info!("Marker reached on leg {}", index + 1);
                            self.run_choreography(&leg);
                            self.finish_leg(index);
                        }
                        Ok(true) => {}
                        Err(e) => warn!("Marker read failed: {}", e),
                    }
                }
            }
        }

        if verbosity.verbose {
            self.drive.get_status(true, self.sink);
        }
    }
}

impl<D: DriveAssembly, I: PinInput> Controller for AutonomousController<'_, D, I> {
    fn step(&mut self, verbosity: Verbosity) {
        AutonomousController::step(self, verbosity);
    }

    fn halt(&mut self) {
        self.drive.stop();
        self.lift.stop();
    }

    fn name(&self) -> &'static str {
        "autonomous"
    }
}
