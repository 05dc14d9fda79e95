//! Editing engine
//!
//! Pairs a `LineBuffer` with a `TerminalBackend` and applies every edit to
//! both. The backend's render cursor and the buffer cursor must agree before
//! and after each public operation; a mismatch is a bug in this module and
//! panics.

use std::borrow::Cow;

use clap::ValueEnum;
use log::trace;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use crate::buffer::{Cursor, Delta, LineBuffer};
use crate::error::{Error, Result};
use crate::terminal::TerminalBackend;

/// Columns between tab stops.
pub const TAB_WIDTH: usize = 8;

/// What happens to text after the cursor when new text is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Trailing text moves along behind the inserted text.
    #[default]
    Insert,
    /// Trailing text is discarded before writing.
    Overwrite,
}

pub struct Engine<B: TerminalBackend> {
    buffer: LineBuffer,
    backend: B,
    write_mode: WriteMode,
}

impl<B: TerminalBackend> Engine<B> {
    /// The backend's cursor must start at the origin.
    pub fn new(backend: B) -> Self {
        Self::with_write_mode(backend, WriteMode::default())
    }

    pub fn with_write_mode(backend: B, write_mode: WriteMode) -> Self {
        Self {
            buffer: LineBuffer::new(),
            backend,
            write_mode,
        }
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    pub fn set_write_mode(&mut self, write_mode: WriteMode) {
        self.write_mode = write_mode;
    }

    pub fn cursor(&self) -> Cursor {
        self.buffer.cursor()
    }

    pub fn lines(&self) -> &[String] {
        self.buffer.lines()
    }

    pub fn current_line(&self) -> &str {
        self.buffer.current_line()
    }

    pub fn trailing_output(&self) -> String {
        self.buffer.trailing_output()
    }

    pub fn contents(&self) -> String {
        self.buffer.contents()
    }

    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    // === Editing ===

    /// Write `text` at the cursor. In insert mode the rest of the buffer is
    /// redrawn after it; in overwrite mode the rest of the buffer is dropped.
    ///
    /// Tabs are expanded to spaces. Any other character that is not exactly
    /// one column wide is refused with `Error::Unprintable` and nothing changes.
    pub fn write(&mut self, text: &str) -> Result<()> {
        self.check_sync("write");
        let text = expand_for_display(text, self.buffer.cursor().x)?;
        if self.write_mode == WriteMode::Overwrite {
            self.clear_after_cursor();
        }
        self.insert(&text);
        self.finish("write")
    }

    /// Delete the `n` characters before the cursor, line breaks counting as
    /// one each. Deleting past the start of the buffer stops there.
    pub fn delete(&mut self, n: usize) -> Result<()> {
        self.check_sync("delete");
        let target = self.buffer.ending_position(n);
        if target != self.buffer.cursor() {
            let trailing = self.buffer.trailing_output();
            self.jump_to(target);
            self.clear_after_cursor();
            self.insert(&trailing);
            self.jump_to(target);
        }
        self.finish("delete")
    }

    /// Drop everything after the cursor, on screen and in the buffer.
    pub fn delete_trailing(&mut self) -> Result<()> {
        self.check_sync("delete_trailing");
        self.clear_after_cursor();
        self.finish("delete_trailing")
    }

    /// Move to column `from_x` and erase the rest of the current line.
    pub fn clear_line(&mut self, from_x: usize) -> Result<()> {
        self.check_sync("clear_line");
        let delta = self.buffer.move_cursor_to_x(from_x);
        self.backend.apply(delta);
        self.backend.clear_to_eol();
        self.buffer.truncate_line();
        self.finish("clear_line")
    }

    /// Return to where editing started, blank the screen and start over with
    /// an empty buffer.
    pub fn reset(&mut self) -> Result<()> {
        self.check_sync("reset");
        let Cursor { x, y } = self.buffer.cursor();
        self.backend.move_relative(-(y as isize), -(x as isize));
        self.backend.clear_display();
        self.buffer.reset();
        self.finish("reset")
    }

    // === Motion ===

    pub fn move_cursor(&mut self, rows: isize, cols: isize) -> Result<()> {
        self.motion("move_cursor", |buf| buf.move_cursor(rows, cols))
    }

    pub fn move_cursor_to(&mut self, x: Option<usize>, y: Option<usize>) -> Result<()> {
        self.motion("move_cursor_to", |buf| buf.move_cursor_to(x, y))
    }

    pub fn move_cursor_to_x(&mut self, x: usize) -> Result<()> {
        self.motion("move_cursor_to_x", |buf| buf.move_cursor_to_x(x))
    }

    pub fn move_cursor_to_eol(&mut self, rows: isize) -> Result<()> {
        self.motion("move_cursor_to_eol", |buf| buf.move_cursor_to_eol(rows))
    }

    pub fn move_cursor_to_beginning(&mut self, rows: isize) -> Result<()> {
        self.motion("move_cursor_to_beginning", |buf| {
            buf.move_cursor_to_beginning(rows)
        })
    }

    pub fn move_cursor_to_eof(&mut self) -> Result<()> {
        self.motion("move_cursor_to_eof", |buf| buf.move_cursor_to_eof())
    }

    /// Remember the cursor position. Snapshots are plain values.
    pub fn save_cursor(&self) -> Cursor {
        self.buffer.cursor()
    }

    /// Go back to a saved position, clamped to the buffer as it is now.
    pub fn restore(&mut self, snapshot: Cursor) -> Result<()> {
        self.motion("restore", |buf| {
            buf.move_cursor_to(Some(snapshot.x), Some(snapshot.y))
        })
    }

    // === Internals ===

    fn motion(&mut self, op: &str, f: impl FnOnce(&mut LineBuffer) -> Delta) -> Result<()> {
        self.check_sync(op);
        let delta = f(&mut self.buffer);
        self.backend.apply(delta);
        self.finish(op)
    }

    /// Insert at the cursor, redrawing the trailing text behind it.
    fn insert(&mut self, text: &str) {
        let trailing = self.buffer.trailing_output();
        self.backend.write_lines(&format!("{text}{trailing}"));
        self.buffer.insert(text);
        // The backend is now at the end of the trailing text.
        self.follow_buffer();
    }

    /// Blank the rest of the current row and every row below it that holds
    /// text, then truncate the buffer at the cursor.
    fn clear_after_cursor(&mut self) {
        let start = self.buffer.cursor();
        let last = self.buffer.line_count() - 1;
        self.backend.clear_to_eol();
        for _ in start.y..last {
            let x = self.backend.cursor().x as isize;
            self.backend.move_relative(1, -x);
            self.backend.clear_to_eol();
        }
        self.buffer.truncate_after_cursor();
        self.follow_buffer();
    }

    fn jump_to(&mut self, to: Cursor) {
        let delta = self.buffer.move_cursor_to(Some(to.x), Some(to.y));
        self.backend.apply(delta);
    }

    /// Move the render cursor to wherever the buffer cursor is.
    fn follow_buffer(&mut self) {
        let delta = Delta::between(self.backend.cursor(), self.buffer.cursor());
        self.backend.apply(delta);
    }

    fn finish(&mut self, op: &str) -> Result<()> {
        self.check_sync(op);
        trace!("{} -> cursor {:?}", op, self.buffer.cursor());
        self.backend.flush()?;
        Ok(())
    }

    fn check_sync(&self, op: &str) {
        assert_eq!(
            self.backend.cursor(),
            self.buffer.cursor(),
            "render cursor diverged from buffer cursor around `{op}`"
        );
    }
}

/// Buffer columns count chars, so every char written must fill exactly one
/// screen column. `start_x` is the column the text starts at.
fn expand_for_display(text: &str, start_x: usize) -> Result<Cow<'_, str>> {
    if text.chars().all(|c| c == '\n' || c.width() == Some(1)) {
        return Ok(Cow::Borrowed(text));
    }
    let mut out = String::with_capacity(text.len());
    let mut x = start_x;
    for c in text.chars() {
        match c {
            '\n' => {
                out.push(c);
                x = 0;
            }
            '\t' => {
                let spaces = TAB_WIDTH - x % TAB_WIDTH;
                out.extend(std::iter::repeat(' ').take(spaces));
                x += spaces;
            }
            c if c.width() == Some(1) => {
                out.push(c);
                x += 1;
            }
            c => return Err(Error::Unprintable(c)),
        }
    }
    Ok(Cow::Owned(out))
}
