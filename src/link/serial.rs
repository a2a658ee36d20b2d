// Serial command link (HC-05 Bluetooth module or plain USB serial)

use serialport::{self, SerialPort};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{info, warn};

use super::{CommandSource, LinkError, LinkStatus};

/// HC-05 modules ship at 9600 baud
pub const DEFAULT_BAUDRATE: u32 = 9600;
pub const DEFAULT_TIMEOUT_MS: u64 = 10;

pub struct SerialLink {
    port: Box<dyn SerialPort>,
    status: LinkStatus,
}

impl SerialLink {
    pub fn open(port_name: &str) -> Result<Self, LinkError> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self, LinkError> {
        info!("Opening command link on {} at {} baud", port_name, baudrate);
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self {
            port,
            status: LinkStatus::Ready,
        })
    }
}

impl CommandSource for SerialLink {
    fn receive_byte(&mut self) -> Option<u8> {
        match self.port.bytes_to_read() {
            Ok(0) => return None,
            Ok(_) => {}
            Err(e) => {
                warn!("Command link unavailable: {}", e);
                self.status = LinkStatus::NotReady(e.to_string());
                return None;
            }
        }

        let mut byte = [0u8; 1];
        match self.port.read_exact(&mut byte) {
            Ok(()) => Some(byte[0]),
            Err(e) => {
                warn!("Failed to read command byte: {}", e);
                None
            }
        }
    }

    fn send(&mut self, text: &str) {
        let result = self
            .port
            .write_all(text.as_bytes())
            .and_then(|_| self.port.write_all(b"\r\n"))
            .and_then(|_| self.port.flush());
        if let Err(e) = result {
            warn!("Failed to send status over link: {}", e);
        }
    }

    fn readiness(&self) -> LinkStatus {
        self.status.clone()
    }
}
