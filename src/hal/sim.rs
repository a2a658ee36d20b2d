// In-memory collaborators for dry runs and tests

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;
use tracing::debug;

use super::{Clock, DiagnosticSink, Level, Pin, PinError, PinInput, PinOutput};

/// Most recent writes kept by `SimPins`; older ones are dropped
pub const WRITE_LOG_CAPACITY: usize = 1024;

/// One recorded output write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinWrite {
    Digital(Pin, Level),
    Pwm(Pin, u8),
}

#[derive(Debug, Default)]
struct PinBank {
    outputs: BTreeSet<Pin>,
    inputs: BTreeSet<Pin>,
    digital: BTreeMap<Pin, Level>,
    pwm: BTreeMap<Pin, u8>,
    input_levels: BTreeMap<Pin, Level>,
    input_script: BTreeMap<Pin, VecDeque<Level>>,
    log: VecDeque<PinWrite>,
}

impl PinBank {
    fn record(&mut self, write: PinWrite) {
        if self.log.len() == WRITE_LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(write);
    }
}

/// Simulated pin bank. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct SimPins {
    bank: Rc<RefCell<PinBank>>,
}

impl SimPins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last digital level written to `pin` (low if never written)
    pub fn level(&self, pin: Pin) -> Level {
        self.bank
            .borrow()
            .digital
            .get(&pin)
            .copied()
            .unwrap_or_default()
    }

    /// Last PWM duty written to `pin`, if any
    pub fn pwm(&self, pin: Pin) -> Option<u8> {
        self.bank.borrow().pwm.get(&pin).copied()
    }

    pub fn is_output(&self, pin: Pin) -> bool {
        self.bank.borrow().outputs.contains(&pin)
    }

    pub fn is_input(&self, pin: Pin) -> bool {
        self.bank.borrow().inputs.contains(&pin)
    }

    /// The last `WRITE_LOG_CAPACITY` writes, oldest first
    pub fn writes(&self) -> Vec<PinWrite> {
        self.bank.borrow().log.iter().copied().collect()
    }

    pub fn clear_writes(&self) {
        self.bank.borrow_mut().log.clear();
    }

    /// Set the steady level an input pin reads
    pub fn set_input(&self, pin: Pin, level: Level) {
        self.bank.borrow_mut().input_levels.insert(pin, level);
    }

    /// Queue levels returned by successive reads of `pin`, before the steady level
    pub fn script_input(&self, pin: Pin, levels: impl IntoIterator<Item = Level>) {
        self.bank
            .borrow_mut()
            .input_script
            .entry(pin)
            .or_default()
            .extend(levels);
    }
}

impl PinOutput for SimPins {
    fn configure_output(&self, pin: Pin) -> Result<(), PinError> {
        self.bank.borrow_mut().outputs.insert(pin);
        Ok(())
    }

    fn write_digital(&self, pin: Pin, level: Level) -> Result<(), PinError> {
        debug!("sim: pin {} <- {:?}", pin, level);
        let mut bank = self.bank.borrow_mut();
        bank.digital.insert(pin, level);
        bank.record(PinWrite::Digital(pin, level));
        Ok(())
    }

    fn write_pwm(&self, pin: Pin, duty: u8) -> Result<(), PinError> {
        debug!("sim: pin {} <- pwm {}", pin, duty);
        let mut bank = self.bank.borrow_mut();
        bank.pwm.insert(pin, duty);
        bank.record(PinWrite::Pwm(pin, duty));
        Ok(())
    }
}

impl PinInput for SimPins {
    fn configure_input(&self, pin: Pin) -> Result<(), PinError> {
        self.bank.borrow_mut().inputs.insert(pin);
        Ok(())
    }

    fn read_digital(&self, pin: Pin) -> Result<Level, PinError> {
        let mut bank = self.bank.borrow_mut();
        if let Some(level) = bank.input_script.get_mut(&pin).and_then(VecDeque::pop_front) {
            return Ok(level);
        }
        Ok(bank.input_levels.get(&pin).copied().unwrap_or_default())
    }
}

/// Manually advanced clock. Sleeping advances time instantly.
#[derive(Debug, Default)]
pub struct SimClock {
    now: Cell<u64>,
    slept: Cell<u64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, millis: u64) {
        self.now.set(self.now.get() + millis);
    }

    /// Total time spent in `sleep_millis`
    pub fn slept_millis(&self) -> u64 {
        self.slept.get()
    }
}

impl Clock for SimClock {
    fn now_millis(&self) -> u64 {
        self.now.get()
    }

    fn sleep_millis(&self, millis: u64) {
        self.advance(millis);
        self.slept.set(self.slept.get() + millis);
    }
}

/// Diagnostic sink that keeps every reported line
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: RefCell<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}
