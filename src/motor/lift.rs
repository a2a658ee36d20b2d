// Lift (claw) actuator driven through one motor driver port

use std::fmt;

use super::port::{MAX_SPEED, MotorDriverPort, Speed};
use crate::hal::DiagnosticSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiftStatus {
    #[default]
    Ready,
    Up,
    Down,
    Stopped,
}

impl fmt::Display for LiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LiftStatus::Ready => "ready",
            LiftStatus::Up => "up",
            LiftStatus::Down => "down",
            LiftStatus::Stopped => "stopped",
        })
    }
}

/// Raise / lower / stop vocabulary over a borrowed port
pub struct Lift<'a> {
    port: &'a mut dyn MotorDriverPort,
    status: LiftStatus,
}

impl<'a> Lift<'a> {
    pub fn new(port: &'a mut dyn MotorDriverPort) -> Self {
        Self {
            port,
            status: LiftStatus::Ready,
        }
    }

    pub fn move_up(&mut self, speed: Speed) {
        self.port.forward(speed);
        self.status = LiftStatus::Up;
    }

    pub fn move_down(&mut self, speed: Speed) {
        self.port.backward(speed);
        self.status = LiftStatus::Down;
    }

    /// Raise at full speed
    pub fn raise(&mut self) {
        self.move_up(MAX_SPEED);
    }

    /// Lower at full speed
    pub fn lower(&mut self) {
        self.move_down(MAX_SPEED);
    }

    pub fn stop(&mut self) {
        self.port.stop();
        self.status = LiftStatus::Stopped;
    }

    pub fn status(&self) -> LiftStatus {
        self.status
    }

    pub fn get_status(&self, verbose: bool, sink: &dyn DiagnosticSink) -> String {
        let status = self.status.to_string();
        if verbose {
            sink.report(&status);
        }
        status
    }
}
