// src/hid/decoder.rs  —  HID usage code (+ shift) → character / Enter
//
// Only the symbol subset a keyboard-emulating barcode scanner emits on a US
// layout is covered.  Anything outside the table decodes to nothing.
use super::report::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    /// 0x28 — terminates a barcode
    Enter,
}

const USAGE_A:     KeyCode = 0x04;
const USAGE_Z:     KeyCode = 0x1D;
const USAGE_1:     KeyCode = 0x1E;
const USAGE_0:     KeyCode = 0x27;
const USAGE_ENTER: KeyCode = 0x28;

/// Shifted digit row, indexed from usage 0x1E ('1') to 0x27 ('0')
const DIGIT_SHIFTED: [char; 10] = ['!', '@', '#', '$', '%', '^', '&', '*', '(', ')'];

/// (usage, unshifted, shifted)
const SYMBOLS: [(KeyCode, char, char); 12] = [
    (0x2C, ' ',  ' '),
    (0x2D, '-',  '_'),
    (0x2E, '=',  '+'),
    (0x2F, '[',  '{'),
    (0x30, ']',  '}'),
    (0x31, '\\', '|'),
    (0x33, ';',  ':'),
    (0x34, '\'', '"'),
    (0x35, '`',  '~'),
    (0x36, ',',  '<'),
    (0x37, '.',  '>'),
    (0x38, '/',  '?'),
];

pub fn decode(code: KeyCode, shift: bool) -> Option<Key> {
    match code {
        USAGE_A..=USAGE_Z => {
            let c = (b'a' + (code - USAGE_A)) as char;
            Some(Key::Char(if shift { c.to_ascii_uppercase() } else { c }))
        }
        USAGE_1..=USAGE_0 => {
            let idx = (code - USAGE_1) as usize;
            let c = if shift {
                DIGIT_SHIFTED[idx]
            } else if code == USAGE_0 {
                '0'
            } else {
                (b'1' + idx as u8) as char
            };
            Some(Key::Char(c))
        }
        USAGE_ENTER => Some(Key::Enter),
        _ => SYMBOLS.iter()
            .find(|(usage, _, _)| *usage == code)
            .map(|&(_, plain, shifted)| Key::Char(if shift { shifted } else { plain })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(code: u8, shift: bool) -> Option<Key> {
        let pick = |plain: char, shifted: char| Some(Key::Char(if shift { shifted } else { plain }));
        match code {
            0x04..=0x1D => {
                let lower = (b'a' + code - 0x04) as char;
                pick(lower, lower.to_ascii_uppercase())
            }
            0x1E..=0x26 => pick((b'1' + code - 0x1E) as char, "!@#$%^&*("
                .chars().nth((code - 0x1E) as usize).unwrap()),
            0x27 => pick('0', ')'),
            0x28 => Some(Key::Enter),
            0x2C => pick(' ', ' '),
            0x2D => pick('-', '_'),
            0x2E => pick('=', '+'),
            0x2F => pick('[', '{'),
            0x30 => pick(']', '}'),
            0x31 => pick('\\', '|'),
            0x33 => pick(';', ':'),
            0x34 => pick('\'', '"'),
            0x35 => pick('`', '~'),
            0x36 => pick(',', '<'),
            0x37 => pick('.', '>'),
            0x38 => pick('/', '?'),
            _ => None,
        }
    }

    #[test]
    fn full_domain_matches_table() {
        for code in 0u8..=0xFF {
            for shift in [false, true] {
                assert_eq!(decode(code, shift), expected(code, shift),
                    "code=0x{code:02X} shift={shift}");
            }
        }
    }

    #[test]
    fn letters_follow_shift() {
        for (i, code) in (0x04u8..=0x1D).enumerate() {
            let lower = (b'a' + i as u8) as char;
            assert_eq!(decode(code, false), Some(Key::Char(lower)));
            assert_eq!(decode(code, true), Some(Key::Char(lower.to_ascii_uppercase())));
        }
    }

    #[test]
    fn digit_row() {
        assert_eq!(decode(0x1E, false), Some(Key::Char('1')));
        assert_eq!(decode(0x26, false), Some(Key::Char('9')));
        assert_eq!(decode(0x27, false), Some(Key::Char('0')));
        assert_eq!(decode(0x1E, true), Some(Key::Char('!')));
        assert_eq!(decode(0x27, true), Some(Key::Char(')')));
    }

    #[test]
    fn enter_ignores_shift() {
        assert_eq!(decode(0x28, false), Some(Key::Enter));
        assert_eq!(decode(0x28, true), Some(Key::Enter));
    }

    #[test]
    fn gaps_in_symbol_range_are_unmapped() {
        // 0x29 Esc, 0x2A Backspace, 0x2B Tab, 0x32 non-US hash, 0x39 CapsLock
        for code in [0x00, 0x29, 0x2A, 0x2B, 0x32, 0x39, 0x58, 0xE1] {
            assert_eq!(decode(code, false), None, "code=0x{code:02X}");
            assert_eq!(decode(code, true), None, "code=0x{code:02X}");
        }
    }
}
