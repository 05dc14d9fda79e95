//! The capability set the engine drives.

use std::io;

use crate::buffer::{Cursor, Delta};

/// Physical effects of editing, plus the backend's own idea of where the
/// cursor is (the render cursor).
///
/// The render cursor only changes as a side effect of the commands below.
/// Like a real terminal, motion stops at row 0 and column 0 but is otherwise
/// unbounded: backends do not know where text ends.
pub trait TerminalBackend {
    /// Where this backend believes the cursor is.
    fn cursor(&self) -> Cursor;

    /// Move `rows` down (negative: up), then `cols` right (negative: left).
    fn move_relative(&mut self, rows: isize, cols: isize);

    /// Jump to column `x` of row `y`.
    fn move_absolute(&mut self, x: usize, y: usize);

    /// Erase from the cursor to the end of the current row.
    fn clear_to_eol(&mut self);

    /// Erase everything on screen. The cursor does not move.
    fn clear_display(&mut self);

    /// Write `text` at the cursor, overwriting what is there. `\n` moves to
    /// column 0 of the next row.
    fn write_raw(&mut self, text: &str);

    /// Push pending output to the device.
    fn flush(&mut self) -> io::Result<()>;

    /// Replay a buffer motion.
    fn apply(&mut self, delta: Delta) {
        if !delta.is_zero() {
            self.move_relative(delta.rows, delta.cols);
        }
    }

    /// Write `text` row by row, clearing each row from the write position
    /// before its new content goes in. A shorter replacement would otherwise
    /// leave stale characters behind.
    fn write_lines(&mut self, text: &str) {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.write_raw("\n");
            }
            self.clear_to_eol();
            self.write_raw(line);
        }
    }
}
