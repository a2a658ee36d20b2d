// Command links: where manual command bytes come from and where status goes
//
// Provides:
// - Serial link (HC-05 Bluetooth module or USB serial)
// - Zenoh link (command bytes and status text over topics)
// - Scripted link for dry runs and tests

pub mod serial;
pub mod pubsub;

use std::collections::VecDeque;
use std::fmt;

pub use serial::SerialLink;
pub use pubsub::ZenohLink;

/// Readiness reported by a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Ready,
    NotReady(String),
}

impl LinkStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, LinkStatus::Ready)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Ready => f.write_str("ready"),
            LinkStatus::NotReady(reason) => write!(f, "not ready ({})", reason),
        }
    }
}

/// Error types for opening links
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Zenoh error: {0}")]
    Zenoh(String),
}

/// Source of single-byte commands and sink for status text
pub trait CommandSource {
    /// Next command byte, if one is waiting. Never blocks.
    fn receive_byte(&mut self) -> Option<u8>;

    /// Send one line of status text back over the link
    fn send(&mut self, text: &str);

    fn readiness(&self) -> LinkStatus;

    /// Drain every byte currently available
    fn receive_string(&mut self) -> String {
        let mut message = String::new();
        while let Some(byte) = self.receive_byte() {
            message.push(byte as char);
        }
        message
    }
}

impl<T: CommandSource + ?Sized> CommandSource for Box<T> {
    fn receive_byte(&mut self) -> Option<u8> {
        (**self).receive_byte()
    }

    fn send(&mut self, text: &str) {
        (**self).send(text);
    }

    fn readiness(&self) -> LinkStatus {
        (**self).readiness()
    }
}

/// In-memory link fed from a script of bytes
#[derive(Debug, Clone)]
pub struct ScriptedLink {
    incoming: VecDeque<u8>,
    sent: Vec<String>,
    status: LinkStatus,
}

impl ScriptedLink {
    pub fn new(script: impl IntoIterator<Item = u8>) -> Self {
        Self {
            incoming: script.into_iter().collect(),
            sent: Vec::new(),
            status: LinkStatus::Ready,
        }
    }

    pub fn with_status(mut self, status: LinkStatus) -> Self {
        self.status = status;
        self
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes);
    }

    /// Lines sent so far
    pub fn sent(&self) -> &[String] {
        &self.sent
    }
}

impl CommandSource for ScriptedLink {
    fn receive_byte(&mut self) -> Option<u8> {
        match self.incoming.pop_front() {
            // a NUL byte stands for "nothing received this tick"
            Some(0) | None => None,
            Some(byte) => Some(byte),
        }
    }

    fn send(&mut self, text: &str) {
        self.sent.push(text.to_string());
    }

    fn readiness(&self) -> LinkStatus {
        self.status.clone()
    }
}
