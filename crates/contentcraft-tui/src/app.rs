use std::path::PathBuf;

use contentcraft_core::content::{self, ContentKind, ExportOrigin};
use contentcraft_core::{
    Catalog, FieldKind, FormField, GenerationError, GenerationInput, Generator, HistoryItem,
    HistoryStore, Navigator, Template, View,
};
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// What the output pane shows after a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Content(String),
    Error(String),
}

/// A submission waiting on its provider
pub struct PendingGeneration {
    pub template: &'static Template,
    pub input: GenerationInput,
    pub task: JoinHandle<Result<String, GenerationError>>,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub nav: Navigator,
    pub input_mode: InputMode,
    pub status: Option<String>,

    // Catalog state
    pub catalog: Catalog,
    pub search_input: String,
    pub filtered: Vec<&'static Template>,
    pub catalog_state: ListState,

    // Generate state
    pub form: GenerationInput,
    pub field_idx: usize,
    pub field_cursor: usize, // char position inside the focused text field
    pub output: Option<Output>,
    pub output_scroll: u16,
    pub pending: Option<PendingGeneration>,
    pub animation_frame: u8,

    // History state
    pub history: HistoryStore,
    pub history_state: ListState,
    pub show_clear_confirm: bool,

    generator: Generator,
    export_dir: PathBuf,
}

impl App {
    pub fn new(generator: Generator, history: HistoryStore, export_dir: PathBuf) -> Self {
        let catalog = Catalog::builtin();
        let filtered = catalog.filter("");

        let mut catalog_state = ListState::default();
        catalog_state.select(Some(0));

        let mut history_state = ListState::default();
        if !history.is_empty() {
            history_state.select(Some(0));
        }

        let status = (!history.is_persistent())
            .then(|| "History database unavailable; this session's history won't be saved".to_string());

        Self {
            should_quit: false,
            nav: Navigator::new(),
            input_mode: InputMode::Normal,
            status,

            catalog,
            search_input: String::new(),
            filtered,
            catalog_state,

            form: GenerationInput::new(),
            field_idx: 0,
            field_cursor: 0,
            output: None,
            output_scroll: 0,
            pending: None,
            animation_frame: 0,

            history,
            history_state,
            show_clear_confirm: false,

            generator,
            export_dir,
        }
    }

    pub fn view(&self) -> View {
        self.nav.view()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    // Catalog

    pub fn apply_search(&mut self) {
        self.filtered = self.catalog.filter(&self.search_input);
        self.catalog_state
            .select(if self.filtered.is_empty() { None } else { Some(0) });
    }

    pub fn selected_catalog_template(&self) -> Option<&'static Template> {
        self.catalog_state
            .selected()
            .and_then(|i| self.filtered.get(i).copied())
    }

    pub fn catalog_down(&mut self) {
        select_next(&mut self.catalog_state, self.filtered.len());
    }

    pub fn catalog_up(&mut self) {
        select_prev(&mut self.catalog_state);
    }

    /// Bind a template to a fresh form and switch to the generate view.
    pub fn open_template(&mut self, template: &'static Template) {
        self.nav.select(template);
        self.form = GenerationInput::with_defaults(template);
        self.field_idx = 0;
        self.field_cursor = self.current_value().chars().count();
        self.output = None;
        self.output_scroll = 0;
        self.input_mode = InputMode::Normal;
    }

    pub fn go_to(&mut self, view: View) {
        match self.nav.navigate(view) {
            Ok(()) => {
                self.input_mode = InputMode::Normal;
                if view == View::Catalog {
                    self.output = None;
                }
                if view == View::History {
                    self.clamp_history_selection();
                }
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    // Generate form

    pub fn template(&self) -> Option<&'static Template> {
        self.nav.selected()
    }

    pub fn current_field(&self) -> Option<&'static FormField> {
        self.template().and_then(|t| t.fields.get(self.field_idx))
    }

    pub fn current_value(&self) -> &str {
        self.current_field()
            .map(|f| self.form.value_or_empty(f.name))
            .unwrap_or("")
    }

    pub fn is_last_field(&self) -> bool {
        self.template()
            .map(|t| self.field_idx + 1 >= t.fields.len())
            .unwrap_or(false)
    }

    pub fn next_field(&mut self) {
        if let Some(template) = self.template() {
            if !template.fields.is_empty() {
                self.field_idx = (self.field_idx + 1) % template.fields.len();
                self.field_cursor = self.current_value().chars().count();
            }
        }
    }

    pub fn prev_field(&mut self) {
        if let Some(template) = self.template() {
            let len = template.fields.len();
            if len > 0 {
                self.field_idx = (self.field_idx + len - 1) % len;
                self.field_cursor = self.current_value().chars().count();
            }
        }
    }

    /// Move a select field to its next (`step = 1`) or previous option.
    pub fn cycle_option(&mut self, step: isize) {
        let Some(field) = self.current_field() else { return };
        if field.kind != FieldKind::Select || field.options.is_empty() {
            return;
        }
        let len = field.options.len() as isize;
        let current = field
            .options
            .iter()
            .position(|o| *o == self.form.value_or_empty(field.name))
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len) as usize;
        self.form.set(field.name, field.options[next]);
    }

    /// Start editing the focused field; select fields cycle instead.
    pub fn begin_edit(&mut self) {
        match self.current_field().map(|f| f.kind) {
            Some(FieldKind::Select) => self.cycle_option(1),
            Some(_) => {
                self.field_cursor = self.current_value().chars().count();
                self.input_mode = InputMode::Editing;
            }
            None => {}
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let Some(field) = self.current_field() else { return };
        let mut value = self.form.value_or_empty(field.name).to_string();
        let byte_pos = char_to_byte_index(&value, self.field_cursor);
        value.insert(byte_pos, c);
        self.form.set(field.name, value);
        self.field_cursor += 1;
    }

    pub fn delete_char_before_cursor(&mut self) {
        let Some(field) = self.current_field() else { return };
        if self.field_cursor == 0 {
            return;
        }
        let mut value = self.form.value_or_empty(field.name).to_string();
        self.field_cursor -= 1;
        let byte_pos = char_to_byte_index(&value, self.field_cursor);
        value.remove(byte_pos);
        self.form.set(field.name, value);
    }

    pub fn cursor_left(&mut self) {
        self.field_cursor = self.field_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.current_value().chars().count();
        self.field_cursor = (self.field_cursor + 1).min(char_count);
    }

    /// Spawn a generation for the current form. Ignored while one is running.
    pub fn submit(&mut self) {
        if self.is_loading() {
            return;
        }
        let Some(template) = self.template() else { return };

        if let Err(e) = self.form.validate(template) {
            self.output = Some(Output::Error(e.to_string()));
            return;
        }

        let input = self.form.clone();
        let generator = self.generator.clone();
        let task_input = input.clone();
        let task = tokio::spawn(async move { generator.generate(template, &task_input).await });

        self.input_mode = InputMode::Normal;
        self.output = None;
        self.output_scroll = 0;
        self.pending = Some(PendingGeneration {
            template,
            input,
            task,
        });
    }

    /// Collect a finished generation, if any. Successful results are saved to
    /// history even when the user has since left the generate view.
    pub async fn poll_generation(&mut self) {
        let finished = self
            .pending
            .as_ref()
            .map(|p| p.task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }
        let Some(pending) = self.pending.take() else { return };

        let output = match pending.task.await {
            Ok(Ok(content)) => {
                if let Err(e) = self.history.record(pending.template, &pending.input, &content) {
                    tracing::warn!("Failed to save history: {:#}", e);
                    self.status = Some("Generated, but history could not be saved".to_string());
                }
                self.clamp_history_selection();
                Output::Content(content)
            }
            Ok(Err(e)) => Output::Error(e.to_string()),
            Err(e) => Output::Error(format!("Generation task failed: {}", e)),
        };

        let still_open = self.view() == View::Generate
            && self.template().map(|t| t.id) == Some(pending.template.id);
        if still_open {
            self.output = Some(output);
        }
    }

    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn output_content(&self) -> Option<&str> {
        match &self.output {
            Some(Output::Content(content)) => Some(content),
            _ => None,
        }
    }

    // History

    pub fn selected_history_item(&self) -> Option<&HistoryItem> {
        self.history_state
            .selected()
            .and_then(|i| self.history.items().get(i))
    }

    pub fn history_down(&mut self) {
        select_next(&mut self.history_state, self.history.len());
    }

    pub fn history_up(&mut self) {
        select_prev(&mut self.history_state);
    }

    fn clamp_history_selection(&mut self) {
        let len = self.history.len();
        match self.history_state.selected() {
            _ if len == 0 => self.history_state.select(None),
            Some(i) if i >= len => self.history_state.select(Some(len - 1)),
            None => self.history_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn confirm_clear_history(&mut self) {
        self.show_clear_confirm = false;
        match self.history.clear() {
            Ok(()) => self.status = Some("History cleared".to_string()),
            Err(e) => {
                tracing::error!("Failed to clear history: {:#}", e);
                self.status = Some(format!("Failed to clear history: {}", e));
            }
        }
        self.clamp_history_selection();
    }

    // Copy / download. Copy is offered for text only, download for media only.

    pub fn copy_text(&mut self, content: &str) {
        if ContentKind::of(content).is_media() {
            self.status = Some("Media results can be downloaded with d".to_string());
            return;
        }
        self.status = Some(if copy_to_clipboard(content) {
            "Copied!".to_string()
        } else {
            "No clipboard command available".to_string()
        });
    }

    pub fn download(&mut self, content: &str, origin: ExportOrigin) {
        if !ContentKind::of(content).is_media() {
            self.status = Some("Text results can be copied with c".to_string());
            return;
        }
        self.status = Some(match content::export(content, &self.export_dir, origin) {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => {
                tracing::error!("Export failed: {:#}", e);
                format!("Download failed: {}", e)
            }
        });
    }
}

fn select_next(state: &mut ListState, len: usize) {
    if len > 0 {
        let i = state.selected().unwrap_or(0);
        state.select(Some((i + 1).min(len - 1)));
    }
}

fn select_prev(state: &mut ListState) {
    let i = state.selected().unwrap_or(0);
    state.select(Some(i.saturating_sub(1)));
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn copy_to_clipboard(text: &str) -> bool {
    let candidates: &[(&str, &[&str])] = &[
        ("pbcopy", &[]),
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
    ];

    for (program, args) in candidates {
        let mut command = std::process::Command::new(program);
        command.args(*args);
        if let Some(copied) = pipe_to(command, text) {
            return copied;
        }
    }
    false
}

/// Feed `text` to the command's stdin. `None` when the command can't be
/// spawned; otherwise whether the whole text was written and it exited 0.
fn pipe_to(mut command: std::process::Command, text: &str) -> Option<bool> {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = command.stdin(Stdio::piped()).spawn().ok()?;
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()).is_ok(),
        None => false,
    };
    // stdin is closed here so the command sees EOF
    let exited_ok = child.wait().map(|s| s.success()).unwrap_or(false);
    Some(written && exited_ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentcraft_core::{ElevenLabsClient, GeminiClient, MemoryStore};
    use std::sync::Arc;

    // Keyless clients pointed at a dead port; requests fail before any I/O.
    fn app() -> App {
        let gemini = Arc::new(GeminiClient::new(None).with_base_url("http://127.0.0.1:9"));
        let speech = Arc::new(ElevenLabsClient::new(None).with_base_url("http://127.0.0.1:9"));
        let generator = Generator::new(gemini.clone(), gemini, speech);
        let history = HistoryStore::open(Box::new(MemoryStore::new()));
        App::new(generator, history, std::env::temp_dir())
    }

    #[test]
    fn test_search_filters_and_resets_selection() {
        let mut app = app();
        app.search_input = "script".to_string();
        app.apply_search();
        let ids: Vec<_> = app.filtered.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["youtube-script"]);
        assert_eq!(app.catalog_state.selected(), Some(0));

        app.search_input = "nothing matches this".to_string();
        app.apply_search();
        assert!(app.filtered.is_empty());
        assert_eq!(app.selected_catalog_template().map(|t| t.id), None);
    }

    #[test]
    fn test_open_template_seeds_form() {
        let mut app = app();
        let template = app.catalog.find("social-media").unwrap();
        app.open_template(template);
        assert_eq!(app.view(), View::Generate);
        assert_eq!(app.form.get("platform"), Some("Instagram"));
        assert_eq!(app.form.get("tone"), Some("Excited"));
    }

    #[test]
    fn test_editing_and_cycling() {
        let mut app = app();
        app.open_template(app.catalog.find("blog-post").unwrap());

        for c in "Rüst".chars() {
            app.insert_char(c);
        }
        app.cursor_left();
        app.delete_char_before_cursor();
        assert_eq!(app.form.get("topic"), Some("Rüt"));

        app.next_field();
        app.next_field();
        assert_eq!(app.current_field().map(|f| f.name), Some("tone"));
        app.cycle_option(1);
        assert_eq!(app.form.get("tone"), Some("Casual"));
        app.cycle_option(-1);
        app.cycle_option(-1);
        assert_eq!(app.form.get("tone"), Some("Inspirational"));

        assert!(app.is_last_field());
        app.next_field();
        assert_eq!(app.current_field().map(|f| f.name), Some("topic"));
        assert!(!app.is_last_field());
    }

    #[test]
    fn test_submit_with_missing_fields_shows_error_without_task() {
        let mut app = app();
        app.open_template(app.catalog.find("rewrite").unwrap());
        app.submit();
        assert!(!app.is_loading());
        assert!(matches!(app.output, Some(Output::Error(ref m)) if m.contains("Content to Rewrite")));
    }

    #[tokio::test]
    async fn test_missing_key_surfaces_as_output_error() {
        let mut app = app();
        app.open_template(app.catalog.find("rewrite").unwrap());
        for c in "hello".chars() {
            app.insert_char(c);
        }
        app.submit();
        assert!(app.is_loading());

        while app.is_loading() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            app.poll_generation().await;
        }
        assert!(matches!(app.output, Some(Output::Error(ref m)) if m.contains("API_KEY")));
        assert!(app.history.is_empty());
    }

    #[test]
    fn test_memory_only_history_is_announced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.sqlite");
        std::fs::write(&path, "garbage that is not a database, repeated. ".repeat(200)).unwrap();

        let gemini = Arc::new(GeminiClient::new(None).with_base_url("http://127.0.0.1:9"));
        let speech = Arc::new(ElevenLabsClient::new(None).with_base_url("http://127.0.0.1:9"));
        let generator = Generator::new(gemini.clone(), gemini, speech);
        let app = App::new(generator, HistoryStore::open_file(&path), std::env::temp_dir());

        assert!(app.history.is_empty());
        assert!(app.status.as_deref().unwrap_or("").contains("History database unavailable"));
    }

    #[test]
    fn test_fresh_app_has_no_status() {
        assert!(app().status.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_to_reports_success() {
        let mut command = std::process::Command::new("sh");
        command.args(["-c", "cat > /dev/null"]);
        assert_eq!(pipe_to(command, "hello"), Some(true));
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_to_fails_when_stdin_is_not_read() {
        // Closes stdin straight away and exits 0; the write hits a broken pipe
        let mut command = std::process::Command::new("sh");
        command.args(["-c", "exec 0<&-; exit 0"]);
        let text = "x".repeat(1 << 20);
        assert_eq!(pipe_to(command, &text), Some(false));
    }

    #[test]
    fn test_pipe_to_missing_program() {
        let command = std::process::Command::new("contentcraft-no-such-program");
        assert_eq!(pipe_to(command, "hello"), None);
    }

    #[test]
    fn test_back_to_catalog_clears_selection() {
        let mut app = app();
        app.open_template(app.catalog.find("rewrite").unwrap());
        app.go_to(View::Catalog);
        assert!(app.template().is_none());
        app.go_to(View::Generate);
        assert_eq!(app.view(), View::Catalog);
        assert!(app.status.is_some());
    }
}
