//! ANSI escape sequence constants and helpers
//!
//! Centralizes every control sequence the terminal backend emits and the
//! raw key bytes the decoder recognises, so both sides name the same codes.

/// Control Sequence Introducer (ESC [)
pub const CSI: &str = "\x1b[";

// === Erase ===

/// Clear from the cursor to the end of the line (EL)
pub const CLEAR_TO_EOL: &str = "\x1b[K";

/// Clear the entire display (ED 2). Does not move the cursor.
pub const CLEAR_DISPLAY: &str = "\x1b[2J";

// === Cursor Motion ===

/// Move cursor up `n` rows (CUU)
#[inline]
pub fn cursor_up(n: usize) -> String {
    format!("\x1b[{}A", n)
}

/// Move cursor down `n` rows (CUD)
#[inline]
pub fn cursor_down(n: usize) -> String {
    format!("\x1b[{}B", n)
}

/// Move cursor right `n` columns (CUF)
#[inline]
pub fn cursor_right(n: usize) -> String {
    format!("\x1b[{}C", n)
}

/// Move cursor left `n` columns (CUB)
#[inline]
pub fn cursor_left(n: usize) -> String {
    format!("\x1b[{}D", n)
}

/// Absolute position as `CSI y;x k`, zero-based
#[inline]
pub fn cursor_absolute(x: usize, y: usize) -> String {
    format!("\x1b[{};{}k", y, x)
}

/// Line break as sent to the terminal. The carriage return keeps the column
/// reset even when the tty does no output post-processing.
pub const NEWLINE: &str = "\r\n";

// === Key Bytes ===

pub mod key {
    /// Escape byte (0x1b / 27)
    pub const ESC: u8 = 0x1b;

    /// Second byte of a CSI introducer
    pub const BRACKET: u8 = b'[';

    /// Delete/backspace byte (0x7f / 127)
    pub const DEL: u8 = 0x7f;

    /// Tab byte
    pub const TAB: u8 = b'\t';

    /// Line feed, what Enter produces once the tty maps CR to NL
    pub const LF: u8 = b'\n';

    /// Arrow key final bytes after ESC [
    pub const ARROW_UP: u8 = b'A';
    pub const ARROW_DOWN: u8 = b'B';
    pub const ARROW_RIGHT: u8 = b'C';
    pub const ARROW_LEFT: u8 = b'D';

    /// Arrow key without modifiers (ESC [ direction)
    #[inline]
    pub fn arrow(direction: u8) -> [u8; 3] {
        [ESC, BRACKET, direction]
    }
}
