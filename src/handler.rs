use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Reply(outcome) => app.on_reply(outcome),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    let page = app.session.view().page_height();
    let view = app.session.view_mut();
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
        }

        KeyCode::Char('j') | KeyCode::Down => view.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => view.scroll_up(1),
        KeyCode::PageDown => view.scroll_down(page),
        KeyCode::PageUp => view.scroll_up(page),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            view.scroll_down(page / 2)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            view.scroll_up(page / 2)
        }
        KeyCode::Char('g') | KeyCode::Home => view.scroll_up(u16::MAX),
        KeyCode::Char('G') | KeyCode::End => view.scroll_to_bottom(),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            return;
        }
        KeyCode::PageUp => {
            let page = app.session.view().page_height();
            app.session.view_mut().scroll_up(page);
            return;
        }
        KeyCode::PageDown => {
            let page = app.session.view().page_height();
            app.session.view_mut().scroll_down(page);
            return;
        }
        _ => {}
    }

    // Field and submit are disabled while a request is outstanding
    if !app.input_enabled() {
        return;
    }

    match key.code {
        KeyCode::Enter => {
            // Shift/Alt+Enter inserts a newline instead of submitting
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                app.input.insert('\n');
            } else {
                app.submit();
            }
        }
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left => app.input.move_left(),
        KeyCode::Right => app.input.move_right(),
        KeyCode::Home => app.input.move_home(),
        KeyCode::End => app.input.move_end(),
        KeyCode::Char(c) => app.input.insert(c),
        _ => {}
    }
}

fn handle_paste(app: &mut App, text: &str) {
    // Same gate as typing: only into an enabled field that has focus
    if app.input_mode == InputMode::Editing && app.input_enabled() {
        app.input.insert_str(text);
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.session.view_mut().scroll_down(3),
        MouseEventKind::ScrollUp => app.session.view_mut().scroll_up(3),
        _ => {}
    }
}
