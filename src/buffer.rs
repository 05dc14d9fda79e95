//! Line buffer and cursor model
//!
//! The logical side of the editor: an ordered list of lines plus a cursor.
//! Nothing in here performs I/O. Every operation leaves the cursor inside
//! the buffer (`y < lines.len()`, `x <= lines[y]` length in chars).

/// Cursor position. `x` is a column in chars, `y` a line index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
}

impl Cursor {
    pub const ORIGIN: Cursor = Cursor { x: 0, y: 0 };

    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// A signed cursor displacement, rows first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delta {
    pub rows: isize,
    pub cols: isize,
}

impl Delta {
    pub const fn new(rows: isize, cols: isize) -> Self {
        Self { rows, cols }
    }

    /// The displacement that takes `from` to `to`.
    pub fn between(from: Cursor, to: Cursor) -> Self {
        Self {
            rows: to.y as isize - from.y as isize,
            cols: to.x as isize - from.x as isize,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.rows == 0 && self.cols == 0
    }

    pub fn inverse(&self) -> Self {
        Self {
            rows: -self.rows,
            cols: -self.cols,
        }
    }
}

/// Number of chars in `s`.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of char column `col` in `s`, clamped to the end of the string.
fn byte_offset(s: &str, col: usize) -> usize {
    s.char_indices().nth(col).map(|(i, _)| i).unwrap_or(s.len())
}

fn offset_by(value: usize, delta: isize) -> usize {
    if delta < 0 {
        value.saturating_sub(delta.unsigned_abs())
    } else {
        value.saturating_add(delta as usize)
    }
}

/// Multi-line text with a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
    cursor: Cursor,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    /// A buffer holding one empty line, cursor at the origin.
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor: Cursor::ORIGIN,
        }
    }

    /// Build a buffer from `text` (split on `\n`) with the cursor at the origin.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
            cursor: Cursor::ORIGIN,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Length in chars of line `y`, zero if out of range.
    pub fn line_len(&self, y: usize) -> usize {
        self.lines.get(y).map(|l| char_len(l)).unwrap_or(0)
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn current_line(&self) -> &str {
        &self.lines[self.cursor.y]
    }

    /// Whole buffer joined with newlines.
    pub fn contents(&self) -> String {
        self.lines.join("\n")
    }

    /// Current line up to the cursor.
    pub fn text_before_cursor(&self) -> &str {
        let line = self.current_line();
        &line[..byte_offset(line, self.cursor.x)]
    }

    /// Current line from the cursor to its end.
    pub fn text_after_cursor_on_line(&self) -> &str {
        let line = self.current_line();
        &line[byte_offset(line, self.cursor.x)..]
    }

    /// Everything from the cursor to the end of the buffer.
    pub fn trailing_output(&self) -> String {
        let mut out = self.text_after_cursor_on_line().to_string();
        for line in &self.lines[self.cursor.y + 1..] {
            out.push('\n');
            out.push_str(line);
        }
        out
    }

    // === Cursor Motion ===

    /// Move relative to the current position. The row is clamped first, then
    /// the column against the *destination* line. Returns the delta applied.
    pub fn move_cursor(&mut self, rows: isize, cols: isize) -> Delta {
        let y = offset_by(self.cursor.y, rows).min(self.lines.len() - 1);
        let x = offset_by(self.cursor.x, cols).min(self.line_len(y));
        self.set_cursor(Cursor::new(x, y))
    }

    /// Absolute move; `None` leaves that coordinate as it is. The column is
    /// re-clamped against the destination line even when left unchanged.
    pub fn move_cursor_to(&mut self, x: Option<usize>, y: Option<usize>) -> Delta {
        let y = y.unwrap_or(self.cursor.y).min(self.lines.len() - 1);
        let x = x.unwrap_or(self.cursor.x).min(self.line_len(y));
        self.set_cursor(Cursor::new(x, y))
    }

    pub fn move_cursor_to_x(&mut self, x: usize) -> Delta {
        self.move_cursor_to(Some(x), None)
    }

    /// End of the line `rows` away from the current one.
    pub fn move_cursor_to_eol(&mut self, rows: isize) -> Delta {
        let y = offset_by(self.cursor.y, rows).min(self.lines.len() - 1);
        self.move_cursor_to(Some(usize::MAX), Some(y))
    }

    /// Start of the line `rows` away from the current one.
    pub fn move_cursor_to_beginning(&mut self, rows: isize) -> Delta {
        let y = offset_by(self.cursor.y, rows).min(self.lines.len() - 1);
        self.move_cursor_to(Some(0), Some(y))
    }

    /// End of the last line.
    pub fn move_cursor_to_eof(&mut self) -> Delta {
        self.move_cursor_to(Some(usize::MAX), Some(usize::MAX))
    }

    fn set_cursor(&mut self, to: Cursor) -> Delta {
        let delta = Delta::between(self.cursor, to);
        self.cursor = to;
        delta
    }

    // === Editing ===

    /// Insert `text` at the cursor, reflowing the trailing content after it.
    /// The cursor ends up just past the inserted text.
    pub fn insert(&mut self, text: &str) {
        let trailing = self.trailing_output();
        let before = self.text_before_cursor().to_string();
        let combined = format!("{text}{trailing}");

        let mut parts = combined.split('\n');
        let first = parts.next().unwrap_or_default();
        let y = self.cursor.y;
        self.lines[y] = before + first;
        self.lines.truncate(y + 1);
        self.lines.extend(parts.map(str::to_string));

        self.cursor = Self::position_after(self.cursor, text);
    }

    /// Where the cursor lands after writing `text` starting at `from`.
    fn position_after(from: Cursor, text: &str) -> Cursor {
        match text.rsplit_once('\n') {
            Some((head, last)) => Cursor::new(
                char_len(last),
                from.y + head.matches('\n').count() + 1,
            ),
            None => Cursor::new(from.x + char_len(text), from.y),
        }
    }

    /// Where `delete(n)` would leave the cursor: walk back `n` chars, each
    /// crossed line break counting as one.
    pub fn ending_position(&self, n: usize) -> Cursor {
        let Cursor { mut x, mut y } = self.cursor;
        let mut n = n;
        while n > x && y > 0 {
            n -= x + 1;
            y -= 1;
            x = self.line_len(y);
        }
        Cursor::new(x.saturating_sub(n), y)
    }

    /// Remove the `n` chars before the cursor, merging lines as needed.
    /// Content after the cursor is preserved.
    pub fn delete(&mut self, n: usize) {
        let target = self.ending_position(n);
        let trailing = self.trailing_output();
        self.cursor = target;
        self.truncate_after_cursor();
        self.insert(&trailing);
        self.cursor = target;
    }

    /// Drop everything from the cursor to the end of the buffer.
    pub fn truncate_after_cursor(&mut self) {
        self.truncate_line();
        self.lines.truncate(self.cursor.y + 1);
    }

    /// Drop the rest of the current line only.
    pub fn truncate_line(&mut self) {
        let line = &mut self.lines[self.cursor.y];
        let at = byte_offset(line, self.cursor.x);
        line.truncate(at);
    }

    /// Back to a single empty line at the origin.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.lines.push(String::new());
        self.cursor = Cursor::ORIGIN;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `["hello", "world"]` with the cursor after "wo".
    fn hello() -> LineBuffer {
        let mut buf = LineBuffer::new();
        buf.insert("hello\nworld");
        assert_eq!(buf.cursor(), Cursor::new(5, 1));
        buf.move_cursor(0, -3);
        assert_eq!(buf.cursor(), Cursor::new(2, 1));
        buf
    }

    /// Five lines with the cursor at (3, 3), inside "dishwasher".
    fn long() -> LineBuffer {
        let mut buf = LineBuffer::new();
        buf.insert("hello\nworld\nmonkey\ndishwasher\nbrains");
        buf.move_cursor(-1, -3);
        assert_eq!(buf.cursor(), Cursor::new(3, 3));
        buf
    }

    fn assert_in_bounds(buf: &LineBuffer) {
        let c = buf.cursor();
        assert!(c.y < buf.line_count(), "row {} out of range", c.y);
        assert!(c.x <= buf.line_len(c.y), "col {} out of range", c.x);
    }

    #[test]
    fn test_new_buffer_has_one_empty_line() {
        let buf = LineBuffer::new();
        assert_eq!(buf.lines(), &[String::new()]);
        assert_eq!(buf.cursor(), Cursor::ORIGIN);
        assert_eq!(buf.trailing_output(), "");
    }

    #[test]
    fn test_text_around_cursor() {
        let buf = hello();
        assert_eq!(buf.text_before_cursor(), "wo");
        assert_eq!(buf.text_after_cursor_on_line(), "rld");
        assert_eq!(buf.trailing_output(), "rld");

        let mut buf = long();
        assert_eq!(buf.trailing_output(), "hwasher\nbrains");
        buf.move_cursor_to(Some(3), Some(0));
        assert_eq!(buf.trailing_output(), "lo\nworld\nmonkey\ndishwasher\nbrains");
    }

    #[test]
    fn test_before_and_trailing_cover_the_rest_of_the_buffer() {
        let mut buf = long();
        for y in 0..buf.line_count() {
            for x in 0..=buf.line_len(y) {
                buf.move_cursor_to(Some(x), Some(y));
                let joined = format!("{}{}", buf.text_before_cursor(), buf.trailing_output());
                assert_eq!(joined, buf.lines()[y..].join("\n"));
            }
        }
    }

    #[test]
    fn test_write_reflows_trailing_text() {
        let mut buf = hello();
        buf.insert("pancakes\nbananas");
        assert_eq!(buf.lines(), &["hello", "wopancakes", "bananasrld"]);
        assert_eq!(buf.cursor(), Cursor::new(7, 2));

        buf.move_cursor(-1, -2);
        assert_eq!(buf.cursor(), Cursor::new(5, 1));
        buf.insert("\npancakes\nbananas");
        assert_eq!(
            buf.lines(),
            &["hello", "wopan", "pancakes", "bananascakes", "bananasrld"]
        );
        assert_eq!(buf.cursor(), Cursor::new(7, 3));
    }

    #[test]
    fn test_insert_newline_splits_line() {
        let mut buf = hello();
        buf.insert("\n");
        assert_eq!(buf.lines(), &["hello", "wo", "rld"]);
        assert_eq!(buf.cursor(), Cursor::new(0, 2));
    }

    #[test]
    fn test_insert_trailing_newline_at_end() {
        let mut buf = hello();
        buf.insert("muffin\ntop");
        buf.move_cursor_to_eol(0);
        assert_eq!(buf.cursor(), Cursor::new(6, 2));
        buf.insert("s\n");
        assert_eq!(buf.lines(), &["hello", "womuffin", "toprlds", ""]);
        assert_eq!(buf.cursor(), Cursor::new(0, 3));
    }

    #[test]
    fn test_insert_before_empty_line() {
        let mut buf = LineBuffer::new();
        buf.insert("s");
        buf.move_cursor(0, -1);
        buf.insert("\n");
        assert_eq!(buf.lines(), &["", "s"]);
        assert_eq!(buf.cursor(), Cursor::new(0, 1));
        assert_eq!(buf.trailing_output(), "s");

        buf.move_cursor(-1, 0);
        assert_eq!(buf.trailing_output(), "\ns");
        buf.insert("\n");
        assert_eq!(buf.lines(), &["", "", "s"]);
        assert_eq!(buf.cursor(), Cursor::new(0, 1));
        assert_eq!(buf.trailing_output(), "\ns");
    }

    #[test]
    fn test_delete_across_lines() {
        let mut buf = hello();
        buf.delete(4);
        assert_eq!(buf.lines(), &["hellrld"]);
        assert_eq!(buf.cursor(), Cursor::new(4, 0));
        assert_eq!(buf.trailing_output(), "rld");

        buf.delete(25);
        assert_eq!(buf.lines(), &["rld"]);
        assert_eq!(buf.cursor(), Cursor::ORIGIN);
    }

    #[test]
    fn test_delete_within_line() {
        let mut buf = hello();
        buf.move_cursor(-1, 2);
        assert_eq!(buf.cursor(), Cursor::new(4, 0));
        buf.delete(3);
        assert_eq!(buf.lines(), &["ho", "world"]);
        assert_eq!(buf.cursor(), Cursor::new(1, 0));

        buf.move_cursor(1, 2);
        assert_eq!(buf.cursor(), Cursor::new(3, 1));
        buf.delete(2);
        assert_eq!(buf.lines(), &["ho", "wld"]);
        assert_eq!(buf.cursor(), Cursor::new(1, 1));
    }

    #[test]
    fn test_delete_zero_is_a_no_op() {
        let mut buf = hello();
        buf.delete(0);
        assert_eq!(buf.lines(), &["hello", "world"]);
        assert_eq!(buf.cursor(), Cursor::new(2, 1));
    }

    #[test]
    fn test_delete_joins_split_line() {
        let mut buf = hello();
        buf.insert("\n");
        buf.delete(4);
        assert_eq!(buf.lines(), &["hellorld"]);
        assert_eq!(buf.cursor(), Cursor::new(5, 0));
    }

    #[test]
    fn test_ending_position() {
        let mut buf = long();
        assert_eq!(buf.ending_position(0), Cursor::new(3, 3));
        assert_eq!(buf.ending_position(2), Cursor::new(1, 3));
        assert_eq!(buf.ending_position(16), Cursor::new(0, 1));
        assert_eq!(buf.ending_position(9), Cursor::new(1, 2));
        buf.move_cursor_to_beginning(0);
        assert_eq!(buf.ending_position(1), Cursor::new(6, 2));
        assert_eq!(buf.ending_position(1000), Cursor::ORIGIN);
    }

    #[test]
    fn test_move_cursor_clamps() {
        let mut buf = hello();
        assert_eq!(buf.move_cursor(-1, -1), Delta::new(-1, -1));
        assert_eq!(buf.cursor(), Cursor::new(1, 0));
        assert_eq!(buf.move_cursor(0, -100), Delta::new(0, -1));
        assert_eq!(buf.cursor(), Cursor::ORIGIN);
        assert_eq!(buf.move_cursor(100, 100), Delta::new(1, 5));
        assert_eq!(buf.cursor(), Cursor::new(5, 1));
    }

    #[test]
    fn test_move_cursor_clamps_column_against_destination_line() {
        let mut buf = LineBuffer::new();
        buf.insert("a\nlonger line");
        assert_eq!(buf.cursor(), Cursor::new(11, 1));
        buf.move_cursor(-1, 0);
        assert_eq!(buf.cursor(), Cursor::new(1, 0));
    }

    #[test]
    fn test_move_cursor_to() {
        let mut buf = long();
        buf.move_cursor_to(Some(4), Some(4));
        assert_eq!(buf.cursor(), Cursor::new(4, 4));
        buf.move_cursor_to(Some(0), None);
        assert_eq!(buf.cursor(), Cursor::new(0, 4));
        buf.move_cursor_to(Some(100), Some(100));
        assert_eq!(buf.cursor(), Cursor::new(6, 4));
    }

    #[test]
    fn test_move_cursor_to_keeps_column_in_range_when_x_unchanged() {
        let mut buf = long();
        buf.move_cursor_to_eol(0);
        assert_eq!(buf.cursor(), Cursor::new(10, 3));
        buf.move_cursor_to(None, Some(0));
        assert_eq!(buf.cursor(), Cursor::new(5, 0));
    }

    #[test]
    fn test_line_relative_moves() {
        let mut buf = hello();
        buf.move_cursor_to_x(3);
        assert_eq!(buf.cursor(), Cursor::new(3, 1));
        buf.move_cursor_to_x(1000);
        assert_eq!(buf.cursor(), Cursor::new(5, 1));
        buf.move_cursor_to_beginning(0);
        assert_eq!(buf.cursor(), Cursor::new(0, 1));
        buf.move_cursor_to_eol(-1);
        assert_eq!(buf.cursor(), Cursor::new(5, 0));
        buf.move_cursor_to_beginning(-1);
        assert_eq!(buf.cursor(), Cursor::ORIGIN);

        let mut buf = long();
        buf.move_cursor_to_eof();
        assert_eq!(buf.cursor(), Cursor::new(6, 4));
    }

    #[test]
    fn test_inverse_motion_round_trips_when_unclamped() {
        let mut buf = long();
        let start = buf.cursor();
        for (rows, cols) in [(-1, 2), (1, -3), (-3, 1), (0, 5), (-2, 0)] {
            let forward = buf.move_cursor(rows, cols);
            assert_eq!(forward, Delta::new(rows, cols), "clamped on ({rows}, {cols})");
            let back = buf.move_cursor(-rows, -cols);
            assert_eq!(back, forward.inverse());
            assert_eq!(buf.cursor(), start);
        }
    }

    #[test]
    fn test_clamp_invariant_holds_under_arbitrary_moves() {
        let mut buf = long();
        let moves: [(isize, isize); 8] = [
            (isize::MIN, 0),
            (0, isize::MAX),
            (3, -7),
            (-2, 40),
            (isize::MAX, isize::MIN),
            (1, 1),
            (-1, 9),
            (2, -1),
        ];
        for (rows, cols) in moves {
            buf.move_cursor(rows, cols);
            assert_in_bounds(&buf);
        }
        for (x, y) in [(Some(usize::MAX), None), (None, Some(2)), (Some(0), Some(usize::MAX))] {
            buf.move_cursor_to(x, y);
            assert_in_bounds(&buf);
        }
    }

    #[test]
    fn test_columns_count_chars() {
        let mut buf = LineBuffer::new();
        buf.insert("héllo wörld");
        assert_eq!(buf.cursor(), Cursor::new(11, 0));
        buf.move_cursor_to_x(2);
        assert_eq!(buf.text_before_cursor(), "hé");
        buf.delete(1);
        assert_eq!(buf.lines(), &["hllo wörld"]);
        buf.move_cursor_to_x(7);
        buf.truncate_line();
        assert_eq!(buf.lines(), &["hllo wö"]);
    }

    #[test]
    fn test_truncate_after_cursor() {
        let mut buf = long();
        buf.move_cursor_to(Some(3), Some(2));
        buf.truncate_after_cursor();
        assert_eq!(buf.lines(), &["hello", "world", "mon"]);
        assert_eq!(buf.cursor(), Cursor::new(3, 2));
    }

    #[test]
    fn test_reset() {
        let mut buf = hello();
        buf.reset();
        assert_eq!(buf, LineBuffer::new());
    }

    #[test]
    fn test_from_text() {
        let buf = LineBuffer::from_text("a\n\nb");
        assert_eq!(buf.lines(), &["a", "", "b"]);
        assert_eq!(buf.contents(), "a\n\nb");
    }
}
