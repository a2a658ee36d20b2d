// Firmware core for a small line-following robot driven by L298N boards.
//
// Layers, leaves first:
// - hal: pin, clock and diagnostic collaborators (bridge, simulation)
// - motor: motor driver ports, drive assemblies and the lift
// - link: where manual commands come from
// - control: manual, autonomous and self-test controllers
// - runtime: startup wiring and the fixed-rate control loop

pub mod config;
pub mod control;
pub mod hal;
pub mod link;
pub mod messages;
pub mod motor;
pub mod runtime;
pub mod sensors;
