// Fixed-rate control loop
//
// Wires the configured pins, drive, lift, sensors and command link into the
// selected controller and steps it once per tick. The loop runs on a blocking
// thread (controllers sleep through timed maneuvers); Ctrl-C sets a shutdown
// flag that the loop checks every tick, and every actuator is stopped on exit.

use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::config::{ControlMode, DRIVE_CAPACITY, LinkConfig, LinkKind, RailPin, RobotConfig};
use crate::control::{AutonomousController, Controller, ManualController, SelfTestController, Verbosity};
use crate::hal::{Clock, PinBridge, PinError, PinInput, PinOutput, SimPins, SystemClock, TracingSink};
use crate::link::{CommandSource, LinkError, SerialLink, ZenohLink};
use crate::motor::{DriveAssembly, FourWheelDrive, L298n, Lift, MotorDriverPort, MultiDrive};
use crate::sensors::LineSensors;

/// Error types for the runtime
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Pin bridge error: {0}")]
    Pin(#[from] PinError),

    #[error("Command link error: {0}")]
    Link(#[from] LinkError),

    #[error("No drive ports configured")]
    NoDrivePorts,

    #[error("Autonomous mode needs a lift")]
    NoLift,

    #[error("Control loop stopped unexpectedly: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub async fn run(config: RobotConfig) -> Result<(), RuntimeError> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let mut control = tokio::task::spawn_blocking(move || run_blocking(&config, &flag));

    tokio::select! {
        result = &mut control => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, stopping...");
            shutdown.store(true, Ordering::Relaxed);
            control.await?
        }
    }
}

fn run_blocking(config: &RobotConfig, shutdown: &AtomicBool) -> Result<(), RuntimeError> {
    if config.hardware.enabled {
        let bridge = PinBridge::open_with_baudrate(
            &config.hardware.bridge_port,
            config.hardware.baudrate,
        )?;
        if !bridge.ping()? {
            warn!("Pin bridge {} did not answer ping", bridge.id());
        }
        run_with_pins(config, Rc::new(bridge), shutdown)
    } else {
        info!("Hardware disabled, using simulated pins");
        run_with_pins(config, SimPins::new(), shutdown)
    }
}

/// Build every component on one pin backend and run the selected controller
pub fn run_with_pins<P>(config: &RobotConfig, pins: P, shutdown: &AtomicBool) -> Result<(), RuntimeError>
where
    P: PinOutput + PinInput + Clone,
{
    if config.drive.ports.is_empty() {
        return Err(RuntimeError::NoDrivePorts);
    }

    let clock = SystemClock::new();
    let sink = TracingSink;
    let verbosity = Verbosity {
        verbose: config.verbose,
        echo: config.echo,
    };

    let mut drive_ports: Vec<L298n<P>> = config
        .drive
        .ports
        .iter()
        .map(|port| L298n::new(pins.clone(), *port))
        .collect();
    let mut lift_port = config.lift.map(|port| L298n::new(pins.clone(), port));

    let drive = build_drive(config.drive.requested, &mut drive_ports);
    let lift = lift_port
        .as_mut()
        .map(|port| Lift::new(port as &mut dyn MotorDriverPort));

    match config.mode {
        ControlMode::Manual => {
            let link = open_link(&config.link)?;
            let mut controller =
                ManualController::new(drive, lift, link, &clock, &sink, &config.manual);
            run_loop(&mut controller, &clock, config.tick_millis(), verbosity, shutdown);
        }
        ControlMode::Autonomous => {
            let lift = lift.ok_or(RuntimeError::NoLift)?;
            power_sensor_rail(&pins, &config.sensors.rail);
            let sensors = LineSensors::new(pins.clone(), config.sensors.left, config.sensors.right);
            let mut controller = AutonomousController::new(
                drive,
                lift,
                sensors,
                &clock,
                &sink,
                config.mission.clone(),
            );
            run_loop(&mut controller, &clock, config.tick_millis(), verbosity, shutdown);
        }
        ControlMode::SelfTest => {
            let link = open_link(&config.link)?;
            let mut controller =
                SelfTestController::new(drive, lift, link, &clock, &sink, config.self_test.speed);
            run_loop(&mut controller, &clock, config.tick_millis(), verbosity, shutdown);
        }
    }

    Ok(())
}

/// Two kept boards form a front/back `FourWheelDrive`; any other count a `MultiDrive`
fn build_drive<'a, P: PinOutput + 'a>(
    requested: usize,
    ports: &'a mut [L298n<P>],
) -> Box<dyn DriveAssembly + 'a> {
    let retained = requested.min(DRIVE_CAPACITY).min(ports.len());
    match (retained, ports) {
        (2, [front, back, ..]) => {
            info!("Drive: four wheels on front and back boards");
            Box::new(FourWheelDrive::new(front, back))
        }
        (_, ports) => {
            info!("Drive: {} boards", retained);
            Box::new(MultiDrive::new(
                requested,
                ports
                    .iter_mut()
                    .map(|port| port as &mut dyn MotorDriverPort)
                    .collect(),
            ))
        }
    }
}

fn open_link(config: &LinkConfig) -> Result<Box<dyn CommandSource>, LinkError> {
    let link: Box<dyn CommandSource> = match config.kind {
        LinkKind::Serial => Box::new(SerialLink::open_with_baudrate(&config.port, config.baudrate)?),
        LinkKind::Zenoh => Box::new(ZenohLink::open(&config.cmd_topic, &config.status_topic)?),
    };
    Ok(link)
}

/// Drive the fixed-level pins that power the line sensors
fn power_sensor_rail<P: PinOutput>(pins: &P, rail: &[RailPin]) {
    for rail_pin in rail {
        let result = pins
            .configure_output(rail_pin.pin)
            .and_then(|()| pins.write_digital(rail_pin.pin, rail_pin.high.into()));
        if let Err(e) = result {
            warn!("Failed to drive sensor rail pin {}: {}", rail_pin.pin, e);
        }
    }
}

/// Step until `shutdown` is set, sleeping out the rest of each tick, then halt
pub fn run_loop(
    controller: &mut dyn Controller,
    clock: &dyn Clock,
    tick_ms: u64,
    verbosity: Verbosity,
    shutdown: &AtomicBool,
) {
    info!(
        "Runtime started: {} controller, {}ms tick",
        controller.name(),
        tick_ms
    );

    while !shutdown.load(Ordering::Relaxed) {
        let started = clock.now_millis();
        controller.step(verbosity);

        let elapsed = clock.now_millis().saturating_sub(started);
        if elapsed < tick_ms {
            clock.sleep_millis(tick_ms - elapsed);
        }
    }

    info!("Stopping {} controller", controller.name());
    controller.halt();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BACK_PINS, FRONT_PINS, LIFT_PINS};
    use crate::hal::{Level, RecordingSink, SimClock};
    use crate::motor::{Direction, L298nPins};

    /// Counts steps and raises the shutdown flag after `limit`
    struct CountingController<'a> {
        clock: &'a SimClock,
        shutdown: &'a AtomicBool,
        step_cost_ms: u64,
        steps: u32,
        limit: u32,
        halted: bool,
    }

    impl Controller for CountingController<'_> {
        fn step(&mut self, _verbosity: Verbosity) {
            self.clock.advance(self.step_cost_ms);
            self.steps += 1;
            if self.steps == self.limit {
                self.shutdown.store(true, Ordering::Relaxed);
            }
        }

        fn halt(&mut self) {
            self.halted = true;
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn counting<'a>(clock: &'a SimClock, shutdown: &'a AtomicBool, step_cost_ms: u64) -> CountingController<'a> {
        CountingController {
            clock,
            shutdown,
            step_cost_ms,
            steps: 0,
            limit: 3,
            halted: false,
        }
    }

    #[test]
    fn test_loop_sleeps_remainder_of_tick() {
        let clock = SimClock::new();
        let shutdown = AtomicBool::new(false);
        let mut controller = counting(&clock, &shutdown, 5);

        run_loop(&mut controller, &clock, 20, Verbosity::default(), &shutdown);

        assert_eq!(controller.steps, 3);
        assert!(controller.halted);
        assert_eq!(clock.now_millis(), 60);
        assert_eq!(clock.slept_millis(), 45);
    }

    #[test]
    fn test_slow_steps_are_not_padded() {
        let clock = SimClock::new();
        let shutdown = AtomicBool::new(false);
        let mut controller = counting(&clock, &shutdown, 50);

        run_loop(&mut controller, &clock, 20, Verbosity::default(), &shutdown);

        assert_eq!(clock.now_millis(), 150);
        assert_eq!(clock.slept_millis(), 0);
    }

    #[test]
    fn test_autonomous_dry_run_powers_rail_and_halts() {
        let pins = SimPins::new();
        let config = RobotConfig {
            mode: ControlMode::Autonomous,
            ..RobotConfig::default()
        };
        let shutdown = AtomicBool::new(true);

        run_with_pins(&config, pins.clone(), &shutdown).unwrap();

        assert!(pins.is_output(51));
        assert_eq!(pins.level(51), Level::Low);
        assert_eq!(pins.level(47), Level::High);
        assert_eq!(pins.level(49), Level::High);
        assert!(pins.is_input(config.sensors.left));
        assert!(pins.is_input(config.sensors.right));
        // halt stopped both the drive and the lift
        assert_eq!(pins.pwm(FRONT_PINS.enable_left.unwrap()), Some(0));
        assert_eq!(pins.pwm(LIFT_PINS.enable_right.unwrap()), Some(0));
    }

    #[test]
    fn test_autonomous_without_lift_is_rejected() {
        let config = RobotConfig {
            mode: ControlMode::Autonomous,
            lift: None,
            ..RobotConfig::default()
        };
        let shutdown = AtomicBool::new(true);
        let result = run_with_pins(&config, SimPins::new(), &shutdown);
        assert!(matches!(result, Err(RuntimeError::NoLift)));
    }

    #[test]
    fn test_empty_drive_is_rejected() {
        let mut config = RobotConfig::default();
        config.drive.ports.clear();
        let shutdown = AtomicBool::new(true);
        let result = run_with_pins(&config, SimPins::new(), &shutdown);
        assert!(matches!(result, Err(RuntimeError::NoDrivePorts)));
    }

    fn boards(pins: &SimPins, layout: &[L298nPins]) -> Vec<L298n<SimPins>> {
        layout.iter().map(|port| L298n::new(pins.clone(), *port)).collect()
    }

    #[test]
    fn test_two_boards_build_four_wheel_drive() {
        let pins = SimPins::new();
        let sink = RecordingSink::new();
        let mut ports = boards(&pins, &[FRONT_PINS, BACK_PINS]);
        let mut drive = build_drive(2, &mut ports);

        assert_eq!(
            drive.get_status(false, &sink),
            "4 Wheel Drive System Status: ready, Front: ready, Back: ready"
        );
        drive.apply(Direction::Forward, 200);
        assert_eq!(pins.pwm(FRONT_PINS.enable_left.unwrap()), Some(200));
        assert_eq!(pins.pwm(BACK_PINS.enable_right.unwrap()), Some(200));
    }

    #[test]
    fn test_other_board_counts_build_multi_drive() {
        let pins = SimPins::new();
        let sink = RecordingSink::new();
        let extra = L298nPins::new(22, 23, 24, 25, 26, 27);

        let mut three = boards(&pins, &[FRONT_PINS, BACK_PINS, extra]);
        let drive = build_drive(3, &mut three);
        assert!(drive.get_status(false, &sink).starts_with("3 Wheel Drive System Status: ready"));

        // only one of the two boards is requested
        let mut two = boards(&pins, &[FRONT_PINS, BACK_PINS]);
        let drive = build_drive(1, &mut two);
        assert_eq!(drive.get_status(false, &sink), "1 Wheel Drive System Status: ready, 1: ready");
    }

    #[test]
    fn test_default_config_halts_both_boards() {
        let pins = SimPins::new();
        let config = RobotConfig {
            mode: ControlMode::Autonomous,
            ..RobotConfig::default()
        };
        assert_eq!(config.drive.ports.len(), 2);
        let shutdown = AtomicBool::new(true);

        run_with_pins(&config, pins.clone(), &shutdown).unwrap();

        assert_eq!(pins.pwm(BACK_PINS.enable_left.unwrap()), Some(0));
        assert_eq!(pins.level(BACK_PINS.left_forward), Level::Low);
    }
}
