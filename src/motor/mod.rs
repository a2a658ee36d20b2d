// Motor control module
//
// Provides:
// - The motor driver port capability and its default maneuvers
// - The L298N dual H-bridge driver
// - Drive assemblies (single pair and N boards)
// - The lift actuator

pub mod drive;
pub mod l298n;
pub mod lift;
pub mod port;

pub use drive::{DriveAssembly, FourWheelDrive, MultiDrive};
pub use l298n::{L298n, L298nPins};
pub use lift::{Lift, LiftStatus};
pub use port::{Direction, DriveStatus, MAX_SPEED, MotorDriverPort, Speed};
