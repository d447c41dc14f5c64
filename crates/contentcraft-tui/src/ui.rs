use contentcraft_core::content::{ContentKind, DataUrl};
use contentcraft_core::{FieldKind, HistoryItem, Template, View};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, Output};

/// Ensure the selected item in a list is visible by adjusting the ListState offset.
fn ensure_selected_visible(state: &mut ListState, visible_height: usize) {
    let visible_height = visible_height.max(1);

    if let Some(selected) = state.selected() {
        let min_offset = selected.saturating_sub(visible_height - 1);
        let max_offset = selected;
        let new_offset = state.offset().clamp(min_offset, max_offset);
        if new_offset != state.offset() {
            *state.offset_mut() = new_offset;
        }
    }
}

/// Map a template's colour tag onto the terminal palette.
fn tag_color(tag: &str) -> Color {
    match tag {
        "blue" => Color::Blue,
        "purple" => Color::Magenta,
        "red" => Color::Red,
        "yellow" | "amber" => Color::Yellow,
        "orange" => Color::LightRed,
        "green" => Color::Green,
        "pink" => Color::LightMagenta,
        _ => Color::White,
    }
}

fn highlight_style() -> Style {
    Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

fn border(focused: bool) -> Style {
    Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray })
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, status_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.view() {
        View::Catalog => render_catalog(app, frame, body_area),
        View::Generate => render_generate(app, frame, body_area),
        View::History => render_history(app, frame, body_area),
    }

    render_status(app, frame, status_area);
    render_footer(app, frame, footer_area);

    if app.show_clear_confirm {
        render_clear_confirm(frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" ContentCraft ", Style::default().fg(Color::Cyan).bold()),
        Span::raw(" "),
    ];

    for view in [View::Catalog, View::Generate, View::History] {
        let style = if app.view() == view {
            Style::default().fg(Color::Black).bg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", view.title()), style));
        spans.push(Span::raw(" "));
    }

    if !app.history.is_empty() {
        spans.push(Span::styled(
            format!("[{} saved] ", app.history.len()),
            Style::default().fg(Color::Gray),
        ));
    }
    spans.push(Span::styled(
        format!("v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::Gray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let line = match &app.status {
        Some(message) => Line::from(Span::styled(
            format!(" {}", message),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::default(),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match (app.view(), app.input_mode) {
        (View::Catalog, InputMode::Editing) => " SEARCH ",
        (View::Catalog, _) => " TEMPLATES ",
        (View::Generate, InputMode::Editing) => " EDIT ",
        (View::Generate, _) => " GENERATE ",
        (View::History, _) => " HISTORY ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let mut hints: Vec<Span> = Vec::new();
    match (app.view(), app.input_mode) {
        (View::Catalog, InputMode::Normal) => {
            hints.extend(hint("j/k", "nav"));
            hints.extend(hint("Enter", "open"));
            hints.extend(hint("/", "search"));
            hints.extend(hint("H", "history"));
            hints.extend(hint("q", "quit"));
        }
        (View::Catalog, InputMode::Editing) => {
            hints.extend(hint("Enter", "done"));
            hints.extend(hint("Esc", "stop typing"));
        }
        (View::Generate, InputMode::Normal) => {
            hints.extend(hint("Tab", "field"));
            hints.extend(hint("Enter", "edit"));
            hints.extend(hint("h/l", "option"));
            hints.extend(hint("g", "generate"));
            match app.output_content().map(ContentKind::of) {
                Some(kind) if kind.is_media() => hints.extend(hint("d", "download")),
                Some(_) => hints.extend(hint("c", "copy")),
                None => {}
            }
            hints.extend(hint("H", "history"));
            hints.extend(hint("Esc", "back"));
        }
        (View::Generate, InputMode::Editing) => {
            hints.extend(hint("Enter", "next field"));
            if app.current_field().map(|f| f.kind) == Some(FieldKind::Textarea) {
                hints.extend(hint("Alt+Enter", "newline"));
            }
            hints.extend(hint("Ctrl+G", "generate"));
            hints.extend(hint("Esc", "stop typing"));
        }
        (View::History, _) => {
            hints.extend(hint("j/k", "nav"));
            match app.selected_history_item().map(HistoryItem::kind) {
                Some(kind) if kind.is_media() => hints.extend(hint("d", "download")),
                Some(_) => hints.extend(hint("c", "copy")),
                None => {}
            }
            if !app.history.is_empty() {
                hints.extend(hint("C", "clear"));
            }
            hints.extend(hint("Esc", "templates"));
        }
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

// Catalog

fn render_catalog(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, results_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);

    let editing = app.input_mode == InputMode::Editing;
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(" Search templates ");

    let input = Paragraph::new(app.search_input.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    if editing {
        frame.set_cursor_position((
            input_area.x + app.search_input.chars().count() as u16 + 1,
            input_area.y + 1,
        ));
    }

    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
            .areas(results_area);

    let list_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border(!editing))
        .title(format!(" Templates ({}) ", app.filtered.len()));

    if app.filtered.is_empty() {
        let empty = Paragraph::new(format!(
            "No templates found matching \"{}\"",
            app.search_input
        ))
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true })
        .block(list_block);
        frame.render_widget(empty, list_area);
    } else {
        let items: Vec<ListItem> = app
            .filtered
            .iter()
            .map(|t| {
                ListItem::new(Line::from(vec![
                    Span::styled("● ", Style::default().fg(tag_color(t.color))),
                    Span::raw(t.name),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(list_block)
            .highlight_style(highlight_style())
            .highlight_symbol("> ");

        ensure_selected_visible(
            &mut app.catalog_state,
            list_area.height.saturating_sub(2) as usize,
        );
        frame.render_stateful_widget(list, list_area, &mut app.catalog_state);
    }

    render_template_detail(app.selected_catalog_template(), frame, detail_area);
}

fn render_template_detail(template: Option<&Template>, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border(false))
        .title(" Details ");

    let Some(template) = template else {
        let placeholder = Paragraph::new("Select a template to see what it needs")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            template.name,
            Style::default().fg(tag_color(template.color)).bold(),
        )),
        Line::from(Span::styled(
            format!("{} output", template.output.as_str()),
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
        Line::from(template.description),
        Line::default(),
        Line::from(Span::styled("Fields", Style::default().fg(Color::Yellow).bold())),
    ];

    for field in template.fields {
        let marker = if field.required { " *" } else { "" };
        let kind = match field.kind {
            FieldKind::Text => "text",
            FieldKind::Textarea => "long text",
            FieldKind::Select => "choice",
        };
        lines.push(Line::from(vec![
            Span::raw(format!("  {}{}", field.label, marker)),
            Span::styled(format!("  ({})", kind), Style::default().fg(Color::DarkGray)),
        ]));
    }

    let detail = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(detail, area);
}

// Generate

fn render_generate(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(template) = app.template() else {
        return;
    };

    let [form_area, output_area] =
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(area);

    render_form(app, template, frame, form_area);
    render_output(app, frame, output_area);
}

fn render_form(app: &App, template: &Template, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border(true))
        .title(Line::from(vec![
            Span::raw(" "),
            Span::styled(template.name, Style::default().fg(tag_color(template.color)).bold()),
            Span::raw(" "),
        ]));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    let mut cursor: Option<(u16, u16)> = None;
    let width = inner.width.saturating_sub(4) as usize;

    for (idx, field) in template.fields.iter().enumerate() {
        let focused = idx == app.field_idx;
        let label_style = if focused {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        let mut label = vec![Span::styled(
            format!("{} {}", if focused { ">" } else { " " }, field.label),
            label_style,
        )];
        if field.required {
            label.push(Span::styled(" *", Style::default().fg(Color::Red)));
        }
        lines.push(Line::from(label));

        let value = app.form.value_or_empty(field.name);
        let value_style = if focused && app.input_mode == InputMode::Editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };

        match field.kind {
            FieldKind::Select => {
                let arrows = if focused { Color::Cyan } else { Color::DarkGray };
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled("< ", Style::default().fg(arrows)),
                    Span::styled(value.to_string(), value_style),
                    Span::styled(" >", Style::default().fg(arrows)),
                ]));
            }
            _ if value.is_empty() => {
                if focused && app.input_mode == InputMode::Editing {
                    cursor = Some((4, lines.len() as u16));
                }
                lines.push(Line::from(Span::styled(
                    format!("    {}", field.placeholder.unwrap_or("")),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
            _ => {
                // Multi-line values keep their line breaks; long lines are
                // cut to the pane width with the cursor kept in view.
                let mut consumed = 0usize;
                for segment in value.split('\n') {
                    let count = segment.chars().count();
                    let in_segment = app.field_cursor >= consumed
                        && app.field_cursor <= consumed + count;
                    let col = app.field_cursor.saturating_sub(consumed);
                    let skip = if in_segment && width > 0 && col >= width {
                        col - width + 1
                    } else {
                        0
                    };
                    if focused && app.input_mode == InputMode::Editing && in_segment && cursor.is_none() {
                        cursor = Some(((4 + col - skip) as u16, lines.len() as u16));
                    }
                    let visible: String = segment.chars().skip(skip).take(width.max(1)).collect();
                    lines.push(Line::from(vec![
                        Span::raw("    "),
                        Span::styled(visible, value_style),
                    ]));
                    consumed += count + 1;
                }
            }
        }
        lines.push(Line::default());
    }

    let submit_style = if app.is_loading() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Black).bg(Color::Green).bold()
    };
    let submit_label = if app.is_loading() { " Generating... " } else { " g  Generate " };
    lines.push(Line::from(Span::styled(submit_label, submit_style)));

    // Scroll the form so the focused field stays on screen
    let focus_line = lines
        .iter()
        .position(|l| l.spans.first().is_some_and(|s| s.content.starts_with('>')))
        .unwrap_or(0) as u16;
    let scroll = focus_line.saturating_sub(inner.height.saturating_sub(4));

    let form = Paragraph::new(Text::from(lines)).scroll((scroll, 0));
    frame.render_widget(form, inner);

    if let Some((x, y)) = cursor {
        if y >= scroll && y - scroll < inner.height {
            frame.set_cursor_position((inner.x + x, inner.y + y - scroll));
        }
    }
}

fn render_output(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border(false))
        .title(" Result ");

    let text = if app.is_loading() {
        let dots = ".".repeat(app.animation_frame as usize + 1);
        Text::from(Span::styled(
            format!("Generating{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        match &app.output {
            None => Text::from(Span::styled(
                "Fill in the form and press g to generate.",
                Style::default().fg(Color::DarkGray),
            )),
            Some(Output::Error(message)) => Text::from(vec![
                Line::from(Span::styled("Error", Style::default().fg(Color::Red).bold())),
                Line::default(),
                Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
            ]),
            Some(Output::Content(content)) => content_text(content),
        }
    };

    let output = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.output_scroll, 0));
    frame.render_widget(output, area);
}

/// Text shown for a result: the text itself, or a summary for media.
fn content_text(content: &str) -> Text<'static> {
    let kind = ContentKind::of(content);
    if !kind.is_media() {
        return Text::from(content.to_string());
    }

    let (label, color) = match kind {
        ContentKind::Image => ("Image ready", Color::Magenta),
        _ => ("Audio ready", Color::Green),
    };
    let detail = match DataUrl::parse(content) {
        Some(data) => format!("{} ({} KB)", data.mime, data.bytes.len().div_ceil(1024)),
        None => "unreadable data".to_string(),
    };

    Text::from(vec![
        Line::from(Span::styled(label, Style::default().fg(color).bold())),
        Line::from(Span::styled(detail, Style::default().fg(Color::DarkGray))),
        Line::default(),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("d", Style::default().fg(Color::Yellow).bold()),
            Span::raw(format!(" to save it as a .{} file.", kind.extension())),
        ]),
    ])
}

// History

fn render_history(app: &mut App, frame: &mut Frame, area: Rect) {
    let [list_area, preview_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border(true))
        .title(format!(" History ({}) ", app.history.len()));

    if app.history.is_empty() {
        let placeholder = Paragraph::new("No history yet.\nGenerated content shows up here.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, list_area);
    } else {
        let summary_width = list_area.width.saturating_sub(6) as usize;
        let items: Vec<ListItem> = app
            .history
            .items()
            .iter()
            .map(|item| {
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(item.template_name.clone(), Style::default().fg(Color::Yellow).bold()),
                        Span::styled(
                            format!("  {}", item.created_at.format("%Y-%m-%d %H:%M")),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]),
                    Line::from(item.summary(summary_width.max(10))),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(highlight_style())
            .highlight_symbol("> ");

        // Each item is 2 lines
        let visible_items = (list_area.height.saturating_sub(2) / 2) as usize;
        ensure_selected_visible(&mut app.history_state, visible_items);
        frame.render_stateful_widget(list, list_area, &mut app.history_state);
    }

    let preview_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border(false))
        .title(" Preview ");

    let preview_text = match app.selected_history_item() {
        Some(item) => {
            let mut lines = vec![
                Line::from(Span::styled(item.template_name.clone(), Style::default().fg(Color::Yellow).bold())),
                Line::from(Span::styled(
                    item.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                    Style::default().fg(Color::DarkGray),
                )),
                Line::default(),
            ];
            lines.extend(content_text(&item.content).lines);
            Text::from(lines)
        }
        None => Text::from(Span::styled(
            "Select an entry to preview",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let preview = Paragraph::new(preview_text)
        .block(preview_block)
        .wrap(Wrap { trim: false });
    frame.render_widget(preview, preview_area);
}

fn render_clear_confirm(frame: &mut Frame, area: Rect) {
    let popup_width = 44.min(area.width.saturating_sub(4));
    let popup_height = 5.min(area.height);

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Clear history ");

    let text = Text::from(vec![
        Line::from("Delete every saved result?"),
        Line::default(),
        Line::from(vec![
            Span::styled(" y ", Style::default().bg(Color::Red).fg(Color::White)),
            Span::raw(" yes   "),
            Span::styled(" n ", Style::default().bg(Color::DarkGray).fg(Color::White)),
            Span::raw(" cancel"),
        ]),
    ]);

    frame.render_widget(Paragraph::new(text).block(block), popup_area);
}
