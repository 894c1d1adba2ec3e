/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Text field contents plus a cursor measured in characters.
#[derive(Debug, Clone, Default)]
pub struct InputLine {
    text: String,
    cursor: usize,
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    /// Insert pasted text at the cursor; `\r\n` and `\r` become `\n`.
    pub fn insert_str(&mut self, text: &str) {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        for c in normalized.chars() {
            self.insert(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Cursor position as (row, column) within the text, splitting on `\n`.
    pub fn cursor_row_col(&self) -> (usize, usize) {
        let before: String = self.text.chars().take(self.cursor).collect();
        let row = before.matches('\n').count();
        let col = before
            .rsplit('\n')
            .next()
            .map(|line| line.chars().count())
            .unwrap_or(0);
        (row, col)
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(s: &str) -> InputLine {
        let mut input = InputLine::new();
        for c in s.chars() {
            input.insert(c);
        }
        input
    }

    #[test]
    fn test_insert_and_backspace_multibyte() {
        let mut input = typed("héllo✓");
        assert_eq!(input.text(), "héllo✓");
        assert_eq!(input.cursor(), 6);

        input.backspace();
        assert_eq!(input.text(), "héllo");

        input.move_home();
        input.move_right();
        input.delete();
        assert_eq!(input.text(), "hllo");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn test_insert_in_middle() {
        let mut input = typed("ac");
        input.move_left();
        input.insert('b');
        assert_eq!(input.text(), "abc");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn test_cursor_bounds() {
        let mut input = typed("ab");
        input.move_right();
        assert_eq!(input.cursor(), 2);
        input.move_home();
        input.move_left();
        assert_eq!(input.cursor(), 0);
        input.backspace();
        assert_eq!(input.text(), "ab");
        input.move_end();
        input.delete();
        assert_eq!(input.text(), "ab");
    }

    #[test]
    fn test_cursor_row_col_across_newlines() {
        let input = typed("first\nsecond");
        assert_eq!(input.cursor_row_col(), (1, 6));

        let mut input = typed("ab\n");
        assert_eq!(input.cursor_row_col(), (1, 0));
        input.move_home();
        assert_eq!(input.cursor_row_col(), (0, 0));
    }

    #[test]
    fn test_insert_str_normalizes_line_endings() {
        let mut input = typed("> ");
        input.insert_str("one\r\ntwo\rthree");
        assert_eq!(input.text(), "> one\ntwo\nthree");
        assert_eq!(input.cursor(), input.text().chars().count());
    }

    #[test]
    fn test_clear_resets_cursor() {
        let mut input = typed("hello");
        input.clear();
        assert!(input.is_empty());
        assert_eq!(input.cursor(), 0);
    }
}
