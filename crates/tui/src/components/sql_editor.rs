//! Multi-line SQL buffer. The cursor is a char index into `text`, so
//! multi-byte input never splits a code point.

use ratatui::layout::{Position, Rect};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::panel;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorBuffer {
    text: String,
    cursor: usize,
}

impl EditorBuffer {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut buffer = Self::default();
        buffer.set_text(text);
        buffer
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replaces the content and moves the cursor to the end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.char_len();
    }

    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, ch);
        self.cursor += 1;
    }

    pub fn newline(&mut self) {
        self.insert('\n');
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn home(&mut self) {
        let (row, _) = self.row_col();
        self.cursor = self.line_start(row);
    }

    pub fn end(&mut self) {
        let (row, _) = self.row_col();
        self.cursor = self.line_start(row) + self.line_len(row);
    }

    pub fn up(&mut self) {
        let (row, col) = self.row_col();
        if row > 0 {
            self.cursor = self.line_start(row - 1) + col.min(self.line_len(row - 1));
        }
    }

    pub fn down(&mut self) {
        let (row, col) = self.row_col();
        if row + 1 < self.line_count() {
            self.cursor = self.line_start(row + 1) + col.min(self.line_len(row + 1));
        }
    }

    /// Zero-based line and column of the cursor, both in chars.
    #[must_use]
    pub fn row_col(&self) -> (usize, usize) {
        let mut row = 0;
        let mut col = 0;
        for ch in self.text.chars().take(self.cursor) {
            if ch == '\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (row, col)
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(index, _)| index)
    }

    fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    fn line_len(&self, row: usize) -> usize {
        self.text
            .split('\n')
            .nth(row)
            .map_or(0, |line| line.chars().count())
    }

    fn line_start(&self, row: usize) -> usize {
        self.text
            .split('\n')
            .take(row)
            .map(|line| line.chars().count() + 1)
            .sum()
    }
}

pub fn render(frame: &mut Frame<'_>, area: Rect, buffer: &EditorBuffer, focused: bool, busy: bool) {
    let title = if busy { "SQL (running...)" } else { "SQL" };
    let (row, col) = buffer.row_col();
    let inner_height = usize::from(area.height.saturating_sub(2)).max(1);
    let scroll = row.saturating_sub(inner_height - 1);

    let paragraph = Paragraph::new(buffer.text())
        .block(panel(title, focused))
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
    frame.render_widget(paragraph, area);

    if focused {
        let x = (area.x + 1).saturating_add(u16::try_from(col).unwrap_or(u16::MAX));
        let y = (area.y + 1).saturating_add(u16::try_from(row - scroll).unwrap_or(u16::MAX));
        let max_x = area.right().saturating_sub(2);
        let max_y = area.bottom().saturating_sub(2);
        frame.set_cursor_position(Position::new(x.min(max_x), y.min(max_y)));
    }
}

#[cfg(test)]
mod tests {
    use super::{render, EditorBuffer};
    use crate::components::test_support::render_lines;

    #[test]
    fn typing_appends_at_the_cursor() {
        let mut buffer = EditorBuffer::new("select ");
        for ch in "1".chars() {
            buffer.insert(ch);
        }
        assert_eq!(buffer.text(), "select 1");
        assert_eq!(buffer.cursor(), 8);
    }

    #[test]
    fn editing_respects_multibyte_chars() {
        let mut buffer = EditorBuffer::new("'é'");
        buffer.left();
        buffer.backspace();
        assert_eq!(buffer.text(), "''");
        buffer.insert('ü');
        assert_eq!(buffer.text(), "'ü'");
        buffer.home();
        buffer.delete();
        assert_eq!(buffer.text(), "ü'");
    }

    #[test]
    fn vertical_moves_clamp_to_line_length() {
        let mut buffer = EditorBuffer::new("select *\nfrom t\nwhere id = 1");
        assert_eq!(buffer.row_col(), (2, 12));

        buffer.up();
        assert_eq!(buffer.row_col(), (1, 6));
        buffer.up();
        assert_eq!(buffer.row_col(), (0, 6));
        buffer.up();
        assert_eq!(buffer.row_col(), (0, 6));

        buffer.end();
        buffer.down();
        assert_eq!(buffer.row_col(), (1, 6));
    }

    #[test]
    fn newline_splits_the_current_line() {
        let mut buffer = EditorBuffer::new("select 1 from t");
        for _ in 0..7 {
            buffer.left();
        }
        buffer.newline();
        assert_eq!(buffer.text(), "select 1\n from t");
        assert_eq!(buffer.row_col(), (1, 0));
    }

    #[test]
    fn backspace_and_delete_stop_at_the_edges() {
        let mut buffer = EditorBuffer::new("a");
        buffer.delete();
        assert_eq!(buffer.text(), "a");
        buffer.backspace();
        buffer.backspace();
        assert_eq!(buffer.text(), "");
        assert_eq!(buffer.cursor(), 0);
    }

    #[test]
    fn renders_buffer_lines() {
        let buffer = EditorBuffer::new("select 1\nfrom dual");
        let lines = render_lines(30, 5, |frame| {
            let area = frame.area();
            render(frame, area, &buffer, true, false);
        });
        assert!(lines[0].contains("SQL"));
        assert!(lines[1].contains("select 1"));
        assert!(lines[2].contains("from dual"));
    }
}
