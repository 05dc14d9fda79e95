//! ANSI terminal backend
//!
//! Emits CSI sequences into an output buffer and keeps a bookkeeping copy of
//! the cursor. Nothing reaches the device until `flush`, so a failed write
//! never leaves the bookkeeping half-updated.

use std::io::{self, Write};

use log::trace;

use super::backend::TerminalBackend;
use super::escape;
use crate::buffer::Cursor;

pub struct AnsiTerminal<W: Write> {
    out: W,
    pending: String,
    cursor: Cursor,
}

impl AnsiTerminal<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> AnsiTerminal<W> {
    /// Wrap `out`, assuming the physical cursor is where editing starts.
    pub fn new(out: W) -> Self {
        Self {
            out,
            pending: String::new(),
            cursor: Cursor::ORIGIN,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Bytes queued since the last flush.
    pub fn pending(&self) -> &str {
        &self.pending
    }
}

impl<W: Write> TerminalBackend for AnsiTerminal<W> {
    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn move_relative(&mut self, rows: isize, cols: isize) {
        // Terminals stop at the top row and the left margin; track the same.
        let rows = rows.max(-(self.cursor.y as isize));
        let cols = cols.max(-(self.cursor.x as isize));

        if rows < 0 {
            self.pending.push_str(&escape::cursor_up(rows.unsigned_abs()));
        } else if rows > 0 {
            self.pending.push_str(&escape::cursor_down(rows as usize));
        }
        if cols < 0 {
            self.pending.push_str(&escape::cursor_left(cols.unsigned_abs()));
        } else if cols > 0 {
            self.pending.push_str(&escape::cursor_right(cols as usize));
        }

        self.cursor.y = (self.cursor.y as isize + rows) as usize;
        self.cursor.x = (self.cursor.x as isize + cols) as usize;
    }

    fn move_absolute(&mut self, x: usize, y: usize) {
        self.pending.push_str(&escape::cursor_absolute(x, y));
        self.cursor = Cursor::new(x, y);
    }

    fn clear_to_eol(&mut self) {
        self.pending.push_str(escape::CLEAR_TO_EOL);
    }

    fn clear_display(&mut self) {
        self.pending.push_str(escape::CLEAR_DISPLAY);
    }

    fn write_raw(&mut self, text: &str) {
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                self.pending.push_str(escape::NEWLINE);
                self.cursor.y += 1;
                self.cursor.x = 0;
            }
            self.pending.push_str(segment);
            self.cursor.x += segment.chars().count();
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        trace!("flushing {} bytes to terminal", self.pending.len());
        // Clear before writing so a failing device doesn't replay stale
        // output on the next flush.
        let pending = std::mem::take(&mut self.pending);
        self.out.write_all(pending.as_bytes())?;
        self.out.flush()
    }
}
