// src/hid/report.rs  —  Boot-protocol keyboard report
//
// 8-byte interrupt-IN packet:
//   byte 0     = modifier bitmask
//     0x02  →  Left Shift
//     0x20  →  Right Shift
//   byte 1     = reserved
//   bytes 2-7  = up to six pressed usage codes (0x00 = empty slot)
use std::collections::BTreeSet;

pub type KeyCode = u8;

/// Non-zero key codes of one report, kept ordered for the debouncer
pub type PressedKeySet = BTreeSet<KeyCode>;

pub const LEFT_SHIFT_MASK:  u8 = 0x02;
pub const RIGHT_SHIFT_MASK: u8 = 0x20;

const KEYS_START: usize = 2;
const KEYS_END:   usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidReport {
    pub modifiers: u8,
    pub keys:      PressedKeySet,
}

impl HidReport {
    /// Interpret whatever bytes the transfer delivered.  Short packets are
    /// read as far as they go; anything past byte 7 is ignored.
    pub fn parse(data: &[u8]) -> Self {
        let modifiers = data.first().copied().unwrap_or(0);
        let end = data.len().min(KEYS_END);
        let keys = if end > KEYS_START {
            data[KEYS_START..end].iter().copied().filter(|&k| k != 0).collect()
        } else {
            PressedKeySet::new()
        };
        Self { modifiers, keys }
    }

    pub fn shift(&self) -> bool {
        self.modifiers & (LEFT_SHIFT_MASK | RIGHT_SHIFT_MASK) != 0
    }
}
