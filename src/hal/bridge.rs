// Serial pin bridge protocol
//
// The host drives a small microcontroller that owns the real GPIO/PWM pins.
// Packet format: [0xFF, 0xFF, ID, Length, Instruction, Params..., Checksum]
// Reply format:  [0xFF, 0xFF, ID, Length, Error, Params..., Checksum]

use serialport::{self, SerialPort};
use std::cell::RefCell;
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

use super::{Level, Pin, PinError, PinInput, PinOutput};

/// Default serial configuration for the pin bridge
pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_MS: u64 = 50;

/// Bridge device ID (one bridge per serial line)
pub const DEFAULT_BRIDGE_ID: u8 = 1;

/// Packet header bytes
const HEADER: [u8; 2] = [0xFF, 0xFF];

/// Instruction set
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    Ping = 0x01,
    ConfigureOutput = 0x02,
    ConfigureInput = 0x03,
    WriteDigital = 0x04,
    WritePwm = 0x05,
    ReadDigital = 0x06,
}

pub type Result<T> = std::result::Result<T, PinError>;

/// Pin bridge on a serial line
pub struct PinBridge {
    port: RefCell<Box<dyn SerialPort>>,
    id: u8,
}

impl PinBridge {
    /// Open a new connection to the pin bridge
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self {
            port: RefCell::new(port),
            id: DEFAULT_BRIDGE_ID,
        })
    }

    /// Calculate checksum for a packet (excluding header)
    fn checksum(data: &[u8]) -> u8 {
        let sum: u16 = data.iter().map(|&b| b as u16).sum();
        (!sum & 0xFF) as u8
    }

    /// Build a packet with header and checksum
    fn build_packet(id: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
        let length = (params.len() + 2) as u8; // params + instruction + checksum
        let mut packet = Vec::with_capacity(6 + params.len());

        packet.extend_from_slice(&HEADER);
        packet.push(id);
        packet.push(length);
        packet.push(instruction as u8);
        packet.extend_from_slice(params);

        let checksum_data = &packet[2..];
        packet.push(Self::checksum(checksum_data));

        packet
    }

    /// Parse a reply body (everything after the header) into its parameters
    fn parse_reply(expected_id: u8, id: u8, body: &[u8]) -> Result<Vec<u8>> {
        if id != expected_id {
            return Err(PinError::InvalidResponse {
                id: expected_id,
                reason: format!("ID mismatch: expected {}, got {}", expected_id, id),
            });
        }
        if body.len() < 2 {
            return Err(PinError::InvalidResponse {
                id,
                reason: format!("Reply too short: {} bytes", body.len()),
            });
        }

        let mut checksum_data = vec![id, body.len() as u8];
        checksum_data.extend_from_slice(&body[..body.len() - 1]);
        if Self::checksum(&checksum_data) != body[body.len() - 1] {
            return Err(PinError::ChecksumMismatch { id });
        }

        let status = body[0];
        if status != 0 {
            return Err(PinError::DeviceError { id, status });
        }

        Ok(body[1..body.len() - 1].to_vec())
    }

    /// `read_exact` with timeouts reported as `PinError::Timeout`
    fn read_frame(reader: &mut dyn Read, id: u8, buf: &mut [u8]) -> Result<()> {
        reader.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                PinError::Timeout { id }
            } else {
                PinError::Io(e)
            }
        })
    }

    /// Read one status reply: header, id and length, then the body
    fn read_reply_from(reader: &mut dyn Read, id: u8) -> Result<Vec<u8>> {
        let mut header = [0u8; 2];
        Self::read_frame(reader, id, &mut header)?;

        if header != HEADER {
            return Err(PinError::InvalidResponse {
                id,
                reason: format!("Invalid header: {:02X?}", header),
            });
        }

        let mut id_length = [0u8; 2];
        Self::read_frame(reader, id, &mut id_length)?;
        let mut body = vec![0u8; id_length[1] as usize];
        Self::read_frame(reader, id, &mut body)?;

        Self::parse_reply(id, id_length[0], &body)
    }

    fn read_reply(&self) -> Result<Vec<u8>> {
        let mut port = self.port.borrow_mut();
        Self::read_reply_from(&mut *port, self.id)
    }

    /// Send one instruction and wait for its status reply
    fn transact(&self, instruction: Instruction, params: &[u8]) -> Result<Vec<u8>> {
        let packet = Self::build_packet(self.id, instruction, params);
        debug!("Bridge {:?} params={:?}", instruction, params);
        {
            let mut port = self.port.borrow_mut();
            port.write_all(&packet)?;
            port.flush()?;
        }
        self.read_reply()
    }

    /// Ping the bridge to check if it's connected
    pub fn ping(&self) -> Result<bool> {
        match self.transact(Instruction::Ping, &[]) {
            Ok(_) => Ok(true),
            Err(PinError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }
}

impl PinOutput for PinBridge {
    fn configure_output(&self, pin: Pin) -> Result<()> {
        self.transact(Instruction::ConfigureOutput, &[pin]).map(drop)
    }

    fn write_digital(&self, pin: Pin, level: Level) -> Result<()> {
        self.transact(Instruction::WriteDigital, &[pin, level.into()])
            .map(drop)
    }

    fn write_pwm(&self, pin: Pin, duty: u8) -> Result<()> {
        self.transact(Instruction::WritePwm, &[pin, duty]).map(drop)
    }
}

impl PinInput for PinBridge {
    fn configure_input(&self, pin: Pin) -> Result<()> {
        self.transact(Instruction::ConfigureInput, &[pin]).map(drop)
    }

    fn read_digital(&self, pin: Pin) -> Result<Level> {
        let reply = self.transact(Instruction::ReadDigital, &[pin])?;
        match reply.first() {
            Some(&raw) => Ok(Level::from(raw != 0)),
            None => Err(PinError::InvalidResponse {
                id: self.id,
                reason: "Empty response".to_string(),
            }),
        }
    }
}
