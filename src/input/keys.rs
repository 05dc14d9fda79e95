//! Keys and the byte → key table

use std::fmt;

use crate::error::{Error, Result};
use crate::terminal::escape::key as bytes;

/// A decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable ASCII character, space and punctuation included.
    Char(char),
    /// `ctrl+<letter>`, letter in lowercase.
    Ctrl(char),
    Up,
    Down,
    Left,
    Right,
    Enter,
    Tab,
    Delete,
    Esc,
}

impl Key {
    /// Look a key up by its canonical name (`"a"`, `"ctrl+x"`, `"up"`...).
    /// Only names the key table can actually produce are accepted.
    pub fn from_name(name: &str) -> Result<Key> {
        KeyTable::keys()
            .find(|key| key.to_string() == name)
            .ok_or_else(|| Error::UnknownKey(name.to_string()))
    }

    /// The text this key inserts when echoed, if any.
    pub fn printable(&self) -> Option<char> {
        match self {
            Key::Char(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Ctrl(c) => write!(f, "ctrl+{}", c),
            Key::Up => f.write_str("up"),
            Key::Down => f.write_str("down"),
            Key::Left => f.write_str("left"),
            Key::Right => f.write_str("right"),
            Key::Enter => f.write_str("enter"),
            Key::Tab => f.write_str("tab"),
            Key::Delete => f.write_str("delete"),
            Key::Esc => f.write_str("esc"),
        }
    }
}

const TABLE: [Option<Key>; 128] = build_table();

const fn build_table() -> [Option<Key>; 128] {
    let mut table = [None; 128];

    let mut b = 1;
    while b <= 26 {
        table[b] = Some(Key::Ctrl((b'a' + b as u8 - 1) as char));
        b += 1;
    }
    table[bytes::TAB as usize] = Some(Key::Tab);
    table[bytes::LF as usize] = Some(Key::Enter);
    table[bytes::ESC as usize] = Some(Key::Esc);

    let mut b = 32;
    while b <= 126 {
        table[b] = Some(Key::Char(b as u8 as char));
        b += 1;
    }
    table[bytes::DEL as usize] = Some(Key::Delete);

    table
}

const DIRECTIONS: [(u8, Key); 4] = [
    (bytes::ARROW_UP, Key::Up),
    (bytes::ARROW_DOWN, Key::Down),
    (bytes::ARROW_RIGHT, Key::Right),
    (bytes::ARROW_LEFT, Key::Left),
];

/// Static mapping from input bytes to keys.
///
/// Accepted input: 1–27 and 32–127. NUL, 28–31 (`ctrl+\` and friends have
/// no stable name) and anything above 127 are outside the alphabet.
pub struct KeyTable;

impl KeyTable {
    /// Whether `byte` is part of the alphabet the table must cover.
    pub const fn accepts(byte: u8) -> bool {
        matches!(byte, 1..=27 | 32..=127)
    }

    /// Key for a single input byte.
    pub fn lookup(byte: u8) -> Option<Key> {
        TABLE.get(byte as usize).copied().flatten()
    }

    /// Directional key for the final byte of `ESC [ <byte>`.
    pub fn direction(byte: u8) -> Option<Key> {
        DIRECTIONS
            .iter()
            .find(|(b, _)| *b == byte)
            .map(|(_, key)| *key)
    }

    /// Every key the decoder can produce.
    pub fn keys() -> impl Iterator<Item = Key> {
        TABLE
            .iter()
            .filter_map(|key| *key)
            .chain(DIRECTIONS.iter().map(|(_, key)| *key))
    }

    /// Check the table covers its whole alphabet. Run once at startup so a
    /// gap shows up as a configuration error rather than a dropped keypress.
    pub fn validate() -> Result<()> {
        for byte in 0..=u8::MAX {
            if Self::accepts(byte) && Self::lookup(byte).is_none() {
                return Err(Error::IncompleteKeyTable(byte));
            }
        }
        for (byte, _) in DIRECTIONS {
            if Self::lookup(byte).is_none() {
                return Err(Error::IncompleteKeyTable(byte));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_complete() {
        assert!(KeyTable::validate().is_ok());
    }

    #[test]
    fn test_control_bytes() {
        assert_eq!(KeyTable::lookup(1), Some(Key::Ctrl('a')));
        assert_eq!(KeyTable::lookup(3), Some(Key::Ctrl('c')));
        assert_eq!(KeyTable::lookup(9), Some(Key::Tab));
        assert_eq!(KeyTable::lookup(10), Some(Key::Enter));
        assert_eq!(KeyTable::lookup(13), Some(Key::Ctrl('m')));
        assert_eq!(KeyTable::lookup(21), Some(Key::Ctrl('u')));
        assert_eq!(KeyTable::lookup(26), Some(Key::Ctrl('z')));
        assert_eq!(KeyTable::lookup(27), Some(Key::Esc));
        assert_eq!(KeyTable::lookup(127), Some(Key::Delete));
    }

    #[test]
    fn test_printable_bytes() {
        assert_eq!(KeyTable::lookup(b' '), Some(Key::Char(' ')));
        assert_eq!(KeyTable::lookup(b'\\'), Some(Key::Char('\\')));
        assert_eq!(KeyTable::lookup(b'~'), Some(Key::Char('~')));
    }

    #[test]
    fn test_gaps_are_unmapped() {
        for byte in [0u8, 28, 29, 30, 31, 128, 200, 255] {
            assert!(!KeyTable::accepts(byte));
            assert_eq!(KeyTable::lookup(byte), None, "byte {byte}");
        }
    }

    #[test]
    fn test_directions() {
        assert_eq!(KeyTable::direction(b'A'), Some(Key::Up));
        assert_eq!(KeyTable::direction(b'B'), Some(Key::Down));
        assert_eq!(KeyTable::direction(b'C'), Some(Key::Right));
        assert_eq!(KeyTable::direction(b'D'), Some(Key::Left));
        assert_eq!(KeyTable::direction(b'E'), None);
    }

    #[test]
    fn test_names_round_trip() {
        for key in KeyTable::keys() {
            assert_eq!(Key::from_name(&key.to_string()).unwrap(), key);
        }
        assert_eq!(Key::from_name("ctrl+x").unwrap(), Key::Ctrl('x'));
        assert_eq!(Key::from_name(" ").unwrap(), Key::Char(' '));
    }

    #[test]
    fn test_unknown_names_are_configuration_errors() {
        for name in ["garbage key", "ctrl+i", "F1", ""] {
            let err = Key::from_name(name).unwrap_err();
            assert!(err.is_configuration(), "{name}: {err}");
        }
    }
}
