// Single-byte command codes received over the command link
//
// Letters follow the common Bluetooth RC-car app layout, with a WASD alias:
//
//   F / w  forward          B / s  backward
//   G / a  smooth left      I / d  smooth right
//   L / q  hard left        R / e  hard right
//   S / ' ' stop            Q      speed back to 255
//   0-9    speed level      W / U  lift up / down
//   w / u  lift stop (only when a lift is wired; otherwise `w` is forward)

use crate::motor::{Direction, MAX_SPEED, Speed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Digit 0-9
    SpeedLevel(u8),
    SpeedReset,
    Drive(Direction),
    LiftUp,
    LiftDown,
    LiftStop,
}

impl Command {
    /// Decode one command byte. Unknown bytes yield `None`.
    pub fn decode(byte: u8, lift_wired: bool) -> Option<Command> {
        let command = match byte {
            b'0'..=b'9' => Command::SpeedLevel(byte - b'0'),
            b'Q' => Command::SpeedReset,
            b'w' if lift_wired => Command::LiftStop,
            b'u' if lift_wired => Command::LiftStop,
            b'F' | b'w' => Command::Drive(Direction::Forward),
            b'B' | b's' => Command::Drive(Direction::Backward),
            b'G' | b'a' => Command::Drive(Direction::SmoothLeft),
            b'I' | b'd' => Command::Drive(Direction::SmoothRight),
            b'L' | b'q' => Command::Drive(Direction::HardLeft),
            b'R' | b'e' => Command::Drive(Direction::HardRight),
            b'S' | b' ' => Command::Drive(Direction::Stop),
            b'W' => Command::LiftUp,
            b'U' => Command::LiftDown,
            _ => return None,
        };
        Some(command)
    }

    pub fn is_lift(self) -> bool {
        matches!(self, Command::LiftUp | Command::LiftDown | Command::LiftStop)
    }

    /// Drive maneuvers other than stop
    pub fn is_movement(self) -> bool {
        matches!(self, Command::Drive(direction) if direction != Direction::Stop)
    }
}

/// Speed for a digit key: `(level / 10) * 255` in integer arithmetic.
///
/// The division truncates first, so every digit 0-9 maps to 0.
pub fn speed_for_level(level: u8) -> Speed {
    let scaled = (level as u32 / 10) * MAX_SPEED as u32;
    scaled.min(MAX_SPEED as u32) as Speed
}
