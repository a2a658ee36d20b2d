// Manual control over a command link
//
// One command byte per tick. Digits and `Q` change the remembered speed,
// letters drive or lift. Every drive movement is an impulse: after a short
// cooldown the drive is stopped again, so a dropped or garbled follow-up
// command cannot leave the robot running.

use tracing::{debug, warn};

use super::{Controller, Verbosity};
use crate::config::ManualConfig;
use crate::hal::{Clock, DiagnosticSink};
use crate::link::CommandSource;
use crate::messages::{Command, speed_for_level};
use crate::motor::{DriveAssembly, Lift, MAX_SPEED, Speed};

pub struct ManualController<'a, D: DriveAssembly, L: CommandSource> {
    drive: D,
    lift: Option<Lift<'a>>,
    link: L,
    clock: &'a dyn Clock,
    sink: &'a dyn DiagnosticSink,
    speed: Speed,
    cooldown_ms: u64,
    status: String,
}

impl<'a, D: DriveAssembly, L: CommandSource> ManualController<'a, D, L> {
    /// A link that is not ready is logged; construction still succeeds.
    pub fn new(
        drive: D,
        lift: Option<Lift<'a>>,
        link: L,
        clock: &'a dyn Clock,
        sink: &'a dyn DiagnosticSink,
        settings: &ManualConfig,
    ) -> Self {
        let readiness = link.readiness();
        if !readiness.is_ready() {
            warn!("Command link is not ready: {}", readiness);
        }

        Self {
            drive,
            lift,
            link,
            clock,
            sink,
            speed: settings.initial_speed,
            cooldown_ms: settings.cooldown_ms,
            status: "ready".to_string(),
        }
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// Status from the last reporting step
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn lift(&self) -> Option<&Lift<'a>> {
        self.lift.as_ref()
    }

    fn dispatch(&mut self, command: Command) {
        match command {
            Command::SpeedLevel(level) => self.speed = speed_for_level(level),
            Command::SpeedReset => self.speed = MAX_SPEED,
            Command::Drive(direction) => self.drive.apply(direction, self.speed),
            Command::LiftUp | Command::LiftDown | Command::LiftStop => {
                let Some(lift) = self.lift.as_mut() else {
                    debug!("No lift wired, ignoring {:?}", command);
                    return;
                };
                match command {
                    Command::LiftUp => lift.raise(),
                    Command::LiftDown => lift.lower(),
                    _ => lift.stop(),
                }
            }
        }
    }

    /// Rebuild the status from whichever component the command acted on
    fn refresh_status(&mut self, command: Option<Command>) {
        self.status = match (command, &self.lift) {
            (Some(command), Some(lift)) if command.is_lift() => lift.get_status(false, self.sink),
            _ => self.drive.get_status(false, self.sink),
        };
    }

    pub fn step(&mut self, verbosity: Verbosity) {
        let Some(byte) = self.link.receive_byte() else {
            return;
        };

        let command = Command::decode(byte, self.lift.is_some());
        match command {
            Some(command) => self.dispatch(command),
            None => debug!("Ignoring unknown command byte 0x{:02X}", byte),
        }

        if verbosity.verbose || verbosity.echo {
            self.refresh_status(command);
        }
        if verbosity.verbose {
            self.sink
                .report(&format!("Command: {}; Status: {}", byte as char, self.status));
        }
        if verbosity.echo {
            self.link.send(&self.status);
        }

        if command.is_some_and(Command::is_movement) {
            self.clock.sleep_millis(self.cooldown_ms);
            self.drive.stop();
        }
    }
}

impl<D: DriveAssembly, L: CommandSource> Controller for ManualController<'_, D, L> {
    fn step(&mut self, verbosity: Verbosity) {
        ManualController::step(self, verbosity);
    }

    fn halt(&mut self) {
        self.drive.stop();
        if let Some(lift) = self.lift.as_mut() {
            lift.stop();
        }
    }

    fn name(&self) -> &'static str {
        "manual"
    }
}
