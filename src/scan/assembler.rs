// src/scan/assembler.rs  —  Decoded keys → completed barcode
use crate::hid::Key;
use std::time::{Duration, Instant};

/// Default gap after which a partial buffer counts as abandoned
pub const IDLE_TIMEOUT: Duration = Duration::from_millis(100);

/// State machine: accumulated characters + time of the last keystroke.
///
/// The scanner streams keystrokes far faster than anybody types, so a long
/// gap inside one scan does not happen.  A gap means the partial buffer is
/// stray input and must not leak into the next real scan.
pub struct Assembler {
    buffer:         String,
    last_keystroke: Option<Instant>,
    idle_timeout:   Duration,
}

impl Assembler {
    pub fn new(idle_timeout: Duration) -> Self {
        Self { buffer: String::new(), last_keystroke: None, idle_timeout }
    }

    /// Feed one decoded key.  Returns the barcode when `Enter` completes it.
    pub fn feed(&mut self, key: Key, now: Instant) -> Option<String> {
        if let Some(last) = self.last_keystroke {
            if !self.buffer.is_empty() && now.saturating_duration_since(last) > self.idle_timeout {
                log::debug!("[scan] timeout — discarding partial buffer '{}'", self.buffer);
                self.buffer.clear();
            }
        }
        self.last_keystroke = Some(now);

        match key {
            Key::Enter if self.buffer.is_empty() => None,
            Key::Enter => Some(std::mem::take(&mut self.buffer)),
            Key::Char(c) => {
                self.buffer.push(c);
                log::debug!("[scan] buffer '{}'", self.buffer);
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_keystroke = None;
    }

    pub fn buffer(&self) -> &str { &self.buffer }
}

impl Default for Assembler {
    fn default() -> Self { Self::new(IDLE_TIMEOUT) }
}
