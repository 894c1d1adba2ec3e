use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use crate::app::{App, InputMode};

/// Input box grows with newlines up to this many text rows.
const MAX_INPUT_ROWS: u16 = 5;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let input_rows = (app.input.text().matches('\n').count() as u16 + 1).min(MAX_INPUT_ROWS);

    // Main layout: header, transcript, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_rows + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Alfred ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("[{}]", app.endpoint), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.input_mode == InputMode::Normal;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Conversation ({}) ", app.session.transcript().len()));

    // Inner size minus borders, for scroll calculations
    let view = app.session.view_mut();
    view.set_viewport(area.width.saturating_sub(2), area.height.saturating_sub(2));

    let text = if view.entries().is_empty() && !view.is_pending() {
        Text::from(Span::styled(
            "Ask Alfred anything...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        // Already wrapped to the pane width by the view
        Text::from(view.lines(app.animation_frame))
    };

    let total_lines = text.lines.len();
    let scroll = view.scroll();

    let chat = Paragraph::new(text).block(block).scroll((scroll, 0));
    frame.render_widget(chat, area);

    let mut scrollbar_state = ScrollbarState::new(total_lines).position(scroll as usize);
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        area,
        &mut scrollbar_state,
    );
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.input_enabled();
    let editing = app.input_mode == InputMode::Editing;

    let (border_color, title) = if !enabled {
        (Color::DarkGray, " Waiting for Alfred... ")
    } else if editing {
        (Color::Yellow, " Message (Enter to send, Shift+Enter for newline) ")
    } else {
        (Color::DarkGray, " Message (i to type) ")
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Keep the cursor row visible when the input is taller than the box
    let inner_height = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2) as usize;
    let (row, col) = app.input.cursor_row_col();
    let row_offset = if inner_height == 0 { 0 } else { (row + 1).saturating_sub(inner_height) };
    let col_offset = if inner_width == 0 { 0 } else { (col + 1).saturating_sub(inner_width) };

    let text_style = if enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let input = Paragraph::new(app.input.text())
        .style(text_style)
        .scroll((row_offset as u16, col_offset as u16))
        .block(block);
    frame.render_widget(input, area);

    // Show cursor only when the field is usable
    if editing && enabled {
        frame.set_cursor_position((
            area.x + (col - col_offset) as u16 + 1,
            area.y + (row - row_offset) as u16 + 1,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let hints = match app.input_mode {
        InputMode::Normal => " i:type  j/k:scroll  PgUp/PgDn:page  G:bottom  q:quit",
        InputMode::Editing => " Enter:send  Esc:browse  PgUp/PgDn:scroll  Ctrl-C:quit",
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}
