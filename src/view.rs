//! Rendered transcript entries and the scroll state of the transcript pane.
//!
//! Lines are wrapped here, not by the paragraph widget, so the row count
//! used for scrolling is exactly what gets drawn.

use chrono::{DateTime, Local};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::state::Role;

/// A turn as it is shown on screen.
///
/// Error placeholders live only here; they never become a [`crate::Turn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTurn {
    pub role: Role,
    pub text: String,
    pub time_label: String,
    pub is_error: bool,
}

/// Build the visual block for one message: avatar marker, verbatim text and
/// a local `HH:MM` label.
pub fn render_turn(role: Role, text: &str, timestamp: DateTime<Local>) -> RenderedTurn {
    RenderedTurn {
        role,
        text: text.to_string(),
        time_label: timestamp.format("%H:%M").to_string(),
        is_error: false,
    }
}

/// Pack space-separated tokens into lines no wider than `width` columns.
///
/// Breaks on word boundaries; a token wider than the line is split by
/// character. Runs of spaces survive as empty tokens. Always returns at
/// least one line.
fn wrap_tokens(tokens: Vec<(String, Style)>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        let mut spans = Vec::new();
        for (i, (word, style)) in tokens.into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(word, style));
        }
        return vec![Line::from(spans)];
    }

    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;
    let mut has_token = false;

    for (word, style) in tokens {
        let word_width = word.width();

        if has_token && current_width + 1 + word_width <= width {
            // Word fits on current line
            current.push(Span::raw(" "));
            current.push(Span::styled(word, style));
            current_width += 1 + word_width;
            continue;
        }

        if has_token {
            lines.push(Line::from(std::mem::take(&mut current)));
            current_width = 0;
        }

        if word_width <= width {
            current.push(Span::styled(word, style));
            current_width = word_width;
        } else {
            // Too long for any line: hard break it
            let mut chunk = String::new();
            let mut chunk_width = 0;
            for c in word.chars() {
                let char_width = c.width().unwrap_or(0);
                if chunk_width + char_width > width && !chunk.is_empty() {
                    lines.push(Line::from(Span::styled(std::mem::take(&mut chunk), style)));
                    chunk_width = 0;
                }
                chunk.push(c);
                chunk_width += char_width;
            }
            current.push(Span::styled(chunk, style));
            current_width = chunk_width;
        }
        has_token = true;
    }

    lines.push(Line::from(current));
    lines
}

fn words(text: &str, style: Style) -> Vec<(String, Style)> {
    text.split(' ').map(|word| (word.to_string(), style)).collect()
}

impl RenderedTurn {
    pub fn error(mut self) -> Self {
        self.is_error = true;
        self
    }

    pub fn avatar(&self) -> &'static str {
        match self.role {
            Role::User => "U",
            Role::Assistant => "A",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self.role {
            Role::User => "You",
            Role::Assistant => "Alfred",
        }
    }

    /// Terminal lines for this entry, wrapped at `width` columns. Text goes in
    /// as raw spans, so nothing in it is ever parsed as markup.
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let width = width as usize;
        let color = match (self.role, self.is_error) {
            (_, true) => Color::Red,
            (Role::User, false) => Color::Cyan,
            (Role::Assistant, false) => Color::Yellow,
        };

        let header = vec![
            (
                format!("[{}]", self.avatar()),
                Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD),
            ),
            (
                self.display_name().to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            (self.time_label.clone(), Style::default().fg(Color::DarkGray)),
        ];
        let mut lines = wrap_tokens(header, width);

        let body_style = if self.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        for line in self.text.split('\n') {
            lines.extend(wrap_tokens(words(line, body_style), width));
        }
        lines.push(Line::default());
        lines
    }

    /// Rows this entry occupies at `width` columns.
    pub fn height(&self, width: u16) -> usize {
        self.lines(width).len()
    }
}

/// The "Thinking..." indicator shown under the last entry while a request is
/// outstanding. Dots are padded so every frame has the same width.
pub fn pending_lines(width: u16, frame: u8) -> Vec<Line<'static>> {
    let width = width as usize;
    let mut lines = wrap_tokens(
        vec![
            (
                "[A]".to_string(),
                Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            (
                "Alfred".to_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ],
        width,
    );
    // Animated ellipsis: cycles through ".", "..", "..."
    let dots = ".".repeat((frame as usize % 3) + 1);
    lines.extend(wrap_tokens(
        vec![(
            format!("Thinking{:<3}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )],
        width,
    ));
    lines
}

#[derive(Debug)]
pub struct ChatView {
    entries: Vec<RenderedTurn>,
    pending: bool,
    scroll: u16,
    /// Stay pinned to the newest line until the user scrolls up.
    follow_bottom: bool,
    viewport_width: u16,
    viewport_height: u16,
}

impl Default for ChatView {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            pending: false,
            scroll: 0,
            follow_bottom: true,
            viewport_width: 0,
            viewport_height: 0,
        }
    }
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[RenderedTurn] {
        &self.entries
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_following(&self) -> bool {
        self.follow_bottom
    }

    /// Append an entry and jump to the newest line.
    pub fn push(&mut self, entry: RenderedTurn) {
        self.entries.push(entry);
        self.scroll_to_bottom();
    }

    pub fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
        self.scroll_to_bottom();
    }

    /// Record the inner size of the transcript pane (called on every draw).
    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport_width = width;
        self.viewport_height = height;
        if self.follow_bottom {
            self.scroll = self.max_scroll();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    /// Every line of the pane at the current width, pending indicator included.
    pub fn lines(&self, frame: u8) -> Vec<Line<'static>> {
        let width = self.wrap_width();
        let mut lines: Vec<Line<'static>> =
            self.entries.iter().flat_map(|entry| entry.lines(width)).collect();
        if self.pending {
            lines.extend(pending_lines(width, frame));
        }
        lines
    }

    pub fn scroll_up(&mut self, lines: u16) {
        if lines > 0 {
            self.follow_bottom = false;
        }
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add(lines).min(max);
        if self.scroll == max {
            self.follow_bottom = true;
        }
    }

    /// Rows visible in the pane, for page-wise scrolling.
    pub fn page_height(&self) -> u16 {
        if self.viewport_height > 0 {
            self.viewport_height
        } else {
            20
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
        self.scroll = self.max_scroll();
    }

    fn wrap_width(&self) -> u16 {
        // Default to 50 columns until the first draw reports the real size
        if self.viewport_width > 0 {
            self.viewport_width
        } else {
            50
        }
    }

    fn max_scroll(&self) -> u16 {
        let width = self.wrap_width();

        let mut total_lines: usize = self
            .entries
            .iter()
            .map(|entry| entry.height(width))
            .fold(0, usize::saturating_add);
        if self.pending {
            total_lines = total_lines.saturating_add(pending_lines(width, 0).len());
        }

        let overflow = total_lines.saturating_sub(self.page_height() as usize);
        u16::try_from(overflow).unwrap_or(u16::MAX)
    }
}
