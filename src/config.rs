// Timing, wiring and topics, plus the one configuration value resolved at startup
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::control::autonomous::Mission;
use crate::hal::Pin;
use crate::motor::{L298nPins, MAX_SPEED, Speed};

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Most boards a multi-board drive keeps; extra boards are ignored
pub const DRIVE_CAPACITY: usize = 10;

// Manual control: stop this long after each movement command
pub const MANUAL_COOLDOWN_MS: u64 = 40;

// Zenoh topics
pub const TOPIC_CMD: &str = "linebot/cmd/bytes"; // command bytes
pub const TOPIC_STATUS: &str = "linebot/state/status"; // status text

// Serial devices: Bluetooth command link and the pin bridge
pub const LINK_PORT: &str = "/dev/rfcomm0";
pub const BRIDGE_PORT: &str = "/dev/ttyACM0";

// Default wiring (Arduino Mega pin numbers)
pub const FRONT_PINS: L298nPins = L298nPins::new(2, 3, 4, 5, 6, 7);
pub const BACK_PINS: L298nPins = L298nPins::new(8, 9, 10, 11, 12, 13);
pub const LIFT_PINS: L298nPins = L298nPins::new(22, 23, 24, 25, 44, 45);
pub const LEFT_IR_PIN: Pin = 50;
pub const RIGHT_IR_PIN: Pin = 52;

// Sensor power rail: ground on 51, supply on 47 and 49
pub const SENSOR_RAIL: [RailPin; 3] = [
    RailPin { pin: 51, high: false },
    RailPin { pin: 47, high: true },
    RailPin { pin: 49, high: true },
];

/// Which controller the run loop drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ControlMode {
    #[default]
    Manual,
    Autonomous,
    SelfTest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
    #[default]
    Serial,
    Zenoh,
}

/// Output pin driven to a fixed level at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailPin {
    pub pin: Pin,
    pub high: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// false = simulated pins (dry run)
    pub enabled: bool,
    pub bridge_port: String,
    pub baudrate: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bridge_port: BRIDGE_PORT.to_string(),
            baudrate: crate::hal::bridge::DEFAULT_BAUDRATE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub kind: LinkKind,
    pub port: String,
    pub baudrate: u32,
    pub cmd_topic: String,
    pub status_topic: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            kind: LinkKind::Serial,
            port: LINK_PORT.to_string(),
            baudrate: crate::link::serial::DEFAULT_BAUDRATE,
            cmd_topic: TOPIC_CMD.to_string(),
            status_topic: TOPIC_STATUS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Boards to keep; capped at `DRIVE_CAPACITY`
    pub requested: usize,
    pub ports: Vec<L298nPins>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            requested: 2,
            ports: vec![FRONT_PINS, BACK_PINS],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub left: Pin,
    pub right: Pin,
    pub rail: Vec<RailPin>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            left: LEFT_IR_PIN,
            right: RIGHT_IR_PIN,
            rail: SENSOR_RAIL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualConfig {
    pub cooldown_ms: u64,
    pub initial_speed: Speed,
}

impl Default for ManualConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: MANUAL_COOLDOWN_MS,
            initial_speed: MAX_SPEED,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfTestConfig {
    pub speed: Speed,
}

impl Default for SelfTestConfig {
    fn default() -> Self {
        Self { speed: MAX_SPEED }
    }
}

/// Everything the runtime needs to wire one robot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub mode: ControlMode,
    pub loop_hz: u64,
    /// Report controller status to the diagnostic log
    pub verbose: bool,
    /// Send controller status back over the command link
    pub echo: bool,
    pub hardware: HardwareConfig,
    pub link: LinkConfig,
    pub drive: DriveConfig,
    pub lift: Option<L298nPins>,
    pub sensors: SensorConfig,
    pub manual: ManualConfig,
    pub mission: Mission,
    pub self_test: SelfTestConfig,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            mode: ControlMode::default(),
            loop_hz: LOOP_HZ,
            verbose: false,
            echo: false,
            hardware: HardwareConfig::default(),
            link: LinkConfig::default(),
            drive: DriveConfig::default(),
            lift: Some(LIFT_PINS),
            sensors: SensorConfig::default(),
            manual: ManualConfig::default(),
            mission: Mission::default(),
            self_test: SelfTestConfig::default(),
        }
    }
}

/// Error types for loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("loop_hz must be greater than zero")]
    ZeroLoopRate,
}

impl RobotConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(path: &Path, text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loop_hz == 0 {
            return Err(ConfigError::ZeroLoopRate);
        }
        Ok(())
    }

    /// Tick period in milliseconds
    pub fn tick_millis(&self) -> u64 {
        1000 / self.loop_hz.max(1)
    }
}

/// Command line: picks a config file and overrides individual settings
#[derive(Debug, Parser)]
#[command(name = "linebot-runtime", version, about = "Line-following robot runtime")]
pub struct Cli {
    /// Controller to run
    #[arg(long, value_enum)]
    pub mode: Option<ControlMode>,

    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Use simulated pins instead of the serial pin bridge
    #[arg(long)]
    pub simulate: bool,

    /// Report status to the diagnostic log every step
    #[arg(long)]
    pub verbose: bool,

    /// Echo status back over the command link
    #[arg(long)]
    pub echo: bool,

    /// Command link transport
    #[arg(long, value_enum)]
    pub link: Option<LinkKind>,

    /// Serial device for the command link
    #[arg(long)]
    pub link_port: Option<String>,

    /// Serial device for the pin bridge
    #[arg(long)]
    pub bridge_port: Option<String>,

    /// Run the two-marker arena mission
    #[arg(long)]
    pub two_marker: bool,
}

impl Cli {
    /// Load the config file (or defaults) and apply command-line overrides
    pub fn resolve(&self) -> Result<RobotConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => RobotConfig::load(path)?,
            None => RobotConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(kind) = self.link {
            config.link.kind = kind;
        }
        if let Some(port) = &self.link_port {
            config.link.port = port.clone();
        }
        if let Some(port) = &self.bridge_port {
            config.hardware.bridge_port = port.clone();
        }
        if self.simulate {
            config.hardware.enabled = false;
        }
        if self.two_marker {
            config.mission = Mission::two_marker();
        }
        config.verbose |= self.verbose;
        config.echo |= self.echo;

        config.validate()?;
        Ok(config)
    }
}
