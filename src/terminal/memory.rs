//! In-memory terminal
//!
//! A character grid with the same contract as the ANSI backend, for tests and
//! for embedding the engine where there is no real device.

use std::io;

use super::backend::TerminalBackend;
use crate::buffer::Cursor;

/// Screen rows are stored without trailing blanks; writing past the end of a
/// row pads it with spaces, as a terminal would show them.
#[derive(Debug, Clone, Default)]
pub struct MemoryTerminal {
    rows: Vec<Vec<char>>,
    cursor: Cursor,
}

impl MemoryTerminal {
    pub fn new() -> Self {
        Self {
            rows: vec![Vec::new()],
            cursor: Cursor::ORIGIN,
        }
    }

    /// Every row that has been touched, including blank ones.
    pub fn rows(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.iter().collect()).collect()
    }

    /// Visible text: rows joined by newlines, trailing blank rows dropped.
    pub fn text(&self) -> String {
        let mut rows = self.rows();
        while rows.len() > 1 && rows.last().is_some_and(|r| r.trim_end().is_empty()) {
            rows.pop();
        }
        rows.join("\n")
    }

    fn row_mut(&mut self, y: usize) -> &mut Vec<char> {
        if self.rows.len() <= y {
            self.rows.resize_with(y + 1, Vec::new);
        }
        &mut self.rows[y]
    }

    fn put(&mut self, ch: char) {
        let Cursor { x, y } = self.cursor;
        let row = self.row_mut(y);
        if row.len() < x {
            row.resize(x, ' ');
        }
        if x < row.len() {
            row[x] = ch;
        } else {
            row.push(ch);
        }
        self.cursor.x += 1;
    }
}

impl TerminalBackend for MemoryTerminal {
    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn move_relative(&mut self, rows: isize, cols: isize) {
        self.cursor.y = self.cursor.y.saturating_add_signed(rows);
        self.cursor.x = self.cursor.x.saturating_add_signed(cols);
    }

    fn move_absolute(&mut self, x: usize, y: usize) {
        self.cursor = Cursor::new(x, y);
    }

    fn clear_to_eol(&mut self) {
        let Cursor { x, y } = self.cursor;
        if let Some(row) = self.rows.get_mut(y) {
            row.truncate(x);
        }
    }

    fn clear_display(&mut self) {
        for row in &mut self.rows {
            row.clear();
        }
    }

    fn write_raw(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.cursor.y += 1;
                self.cursor.x = 0;
                self.row_mut(self.cursor.y);
            } else {
                self.put(ch);
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
