use anyhow::Result;
use contentcraft_core::{ExportOrigin, FieldKind, View};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
    }
    app.poll_generation().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Any key dismisses the previous status message
    app.status = None;

    if app.show_clear_confirm {
        handle_clear_confirm(app, key);
        return;
    }

    match (app.view(), app.input_mode) {
        (View::Catalog, InputMode::Normal) => handle_catalog_normal(app, key),
        (View::Catalog, InputMode::Editing) => handle_search_editing(app, key),
        (View::Generate, InputMode::Normal) => handle_generate_normal(app, key),
        (View::Generate, InputMode::Editing) => handle_field_editing(app, key),
        (View::History, _) => handle_history(app, key),
    }
}

fn handle_catalog_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => app.catalog_down(),
        KeyCode::Char('k') | KeyCode::Up => app.catalog_up(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
            if let Some(template) = app.selected_catalog_template() {
                app.open_template(template);
            }
        }
        KeyCode::Char('/') | KeyCode::Char('i') => app.input_mode = InputMode::Editing,
        KeyCode::Esc => {
            app.search_input.clear();
            app.apply_search();
        }
        KeyCode::Char('h') | KeyCode::Char('H') => app.go_to(View::History),
        _ => {}
    }
}

fn handle_search_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Down => app.input_mode = InputMode::Normal,
        KeyCode::Backspace => {
            app.search_input.pop();
            app.apply_search();
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
            app.apply_search();
        }
        _ => {}
    }
}

fn handle_generate_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => app.go_to(View::Catalog),
        KeyCode::Char('H') => app.go_to(View::History),

        KeyCode::Tab | KeyCode::Char('j') | KeyCode::Down => app.next_field(),
        KeyCode::BackTab | KeyCode::Char('k') | KeyCode::Up => app.prev_field(),
        KeyCode::Left | KeyCode::Char('h') => app.cycle_option(-1),
        KeyCode::Right | KeyCode::Char('l') => app.cycle_option(1),
        KeyCode::Enter | KeyCode::Char('e') => app.begin_edit(),

        // Ignored while a request is in flight
        KeyCode::Char('g') => app.submit(),

        KeyCode::Char('c') => {
            if let Some(content) = app.output_content().map(str::to_string) {
                app.copy_text(&content);
            }
        }
        KeyCode::Char('d') => {
            if let Some(content) = app.output_content().map(str::to_string) {
                app.download(&content, ExportOrigin::Generator);
            }
        }

        KeyCode::PageDown => app.output_scroll = app.output_scroll.saturating_add(5),
        KeyCode::PageUp => app.output_scroll = app.output_scroll.saturating_sub(5),
        _ => {}
    }
}

fn handle_field_editing(app: &mut App, key: KeyEvent) {
    let is_textarea = app.current_field().map(|f| f.kind) == Some(FieldKind::Textarea);
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Char('g') if ctrl => app.submit(),
        // Alt+Enter adds a line break inside multi-line fields
        KeyCode::Enter if is_textarea && key.modifiers.contains(KeyModifiers::ALT) => {
            app.insert_char('\n')
        }
        KeyCode::Enter if app.is_last_field() => app.submit(),
        KeyCode::Enter | KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.next_field();
        }
        KeyCode::BackTab => {
            app.input_mode = InputMode::Normal;
            app.prev_field();
        }
        KeyCode::Backspace => app.delete_char_before_cursor(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.field_cursor = 0,
        KeyCode::End => app.field_cursor = app.current_value().chars().count(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_history(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => app.go_to(View::Catalog),
        KeyCode::Char('j') | KeyCode::Down => app.history_down(),
        KeyCode::Char('k') | KeyCode::Up => app.history_up(),
        KeyCode::Char('c') => {
            if let Some(content) = app.selected_history_item().map(|i| i.content.clone()) {
                app.copy_text(&content);
            }
        }
        KeyCode::Char('d') => {
            if let Some(content) = app.selected_history_item().map(|i| i.content.clone()) {
                app.download(&content, ExportOrigin::History);
            }
        }
        KeyCode::Char('C') => {
            if !app.history.is_empty() {
                app.show_clear_confirm = true;
            }
        }
        KeyCode::Char('b') => app.go_to(View::Generate),
        _ => {}
    }
}

fn handle_clear_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_clear_history(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.show_clear_confirm = false,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentcraft_core::{ElevenLabsClient, GeminiClient, Generator, HistoryStore, MemoryStore};
    use std::sync::Arc;

    fn app() -> App {
        let gemini = Arc::new(GeminiClient::new(None).with_base_url("http://127.0.0.1:9"));
        let speech = Arc::new(ElevenLabsClient::new(None).with_base_url("http://127.0.0.1:9"));
        let generator = Generator::new(gemini.clone(), gemini, speech);
        App::new(generator, HistoryStore::open(Box::new(MemoryStore::new())), std::env::temp_dir())
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_search_typing_does_not_quit() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "quick");
        assert!(!app.should_quit);
        assert_eq!(app.search_input, "quick");

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_while_editing() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn test_open_edit_and_return_to_catalog() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view(), View::Generate);
        assert_eq!(app.template().map(|t| t.id), Some("blog-post"));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Editing);
        type_str(&mut app, "hjkl");
        assert_eq!(app.form.get("topic"), Some("hjkl"));

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view(), View::Catalog);
        assert!(app.template().is_none());
    }

    #[test]
    fn test_clear_confirm_cancel_and_accept() {
        let mut app = app();
        let template = app.catalog.find("rewrite").unwrap();
        let input = contentcraft_core::GenerationInput::with_defaults(template);
        app.history.record(template, &input, "Rewritten").unwrap();

        press(&mut app, KeyCode::Char('H'));
        assert_eq!(app.view(), View::History);
        assert!(app.selected_history_item().is_some());

        press(&mut app, KeyCode::Char('C'));
        assert!(app.show_clear_confirm);
        press(&mut app, KeyCode::Char('n'));
        assert!(!app.show_clear_confirm);
        assert_eq!(app.history.len(), 1);

        press(&mut app, KeyCode::Char('C'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.history.is_empty());
        assert!(app.selected_history_item().is_none());
    }

    #[test]
    fn test_download_refused_for_text_history() {
        let mut app = app();
        let template = app.catalog.find("rewrite").unwrap();
        let input = contentcraft_core::GenerationInput::with_defaults(template);
        app.history.record(template, &input, "Plain words").unwrap();

        press(&mut app, KeyCode::Char('H'));
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.status.as_deref(), Some("Text results can be copied with c"));
    }
}
