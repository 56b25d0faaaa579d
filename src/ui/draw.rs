use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::line::NORMAL as LINE;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Paragraph,
};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render modals
use tui_widgets::popup::Popup;

use crate::config::{Keys, RgbColor};
use crate::list::{DisplayMode, DraftField, Item};

use super::app::{App, EditRow};
use super::edit::FieldEditor;

const HELP_MODAL_FOOTER: &str = "j/k: scroll  Esc/q: close";
const EMPTY_LIST: &str = "Nothing on the list yet";

const HIGHLIGHT_SYMBOL: &str = "> ";
// Both labels share a width so the two inputs line up.
const NAME_LABEL: &str = "ITEM NAME: ";
const QUANTITY_LABEL: &str = "QUANTITY:  ";

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_list(frame, layout[1], app);
    draw_footer(frame, layout[2], app);
    draw_add_dialog(frame, size, app);
    draw_help_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let count = app.snapshot.items.len();
    let noun = if count == 1 { "item" } else { "items" };
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(16)])
        .split(area);

    frame.render_widget(
        Paragraph::new(Span::styled("MY SHOPPING LIST", header_text_style(app))),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(format!("{} {}", count, noun)).alignment(Alignment::Right),
        chunks[1],
    );
}

fn draw_list(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.snapshot.items.is_empty() {
        render_centered_words(frame, inner, EMPTY_LIST);
        return;
    }

    let items: Vec<ListItem> = app
        .snapshot
        .items
        .iter()
        .map(|item| build_item_row(item, app))
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.selected));

    let list = List::new(items)
        .highlight_style(selection_style(app))
        .highlight_symbol(HIGHLIGHT_SYMBOL)
        .highlight_spacing(HighlightSpacing::Always)
        .repeat_highlight_symbol(false);

    frame.render_stateful_widget(list, inner, &mut state);

    if let Some(row) = app.edit_row.as_ref() {
        place_editor_cursor(frame, inner, app, row, state.offset());
    }
}

fn build_item_row(item: &Item, app: &App) -> ListItem<'static> {
    match item.mode {
        DisplayMode::Viewing => ListItem::new(Line::from(vec![
            Span::styled(format!("ID: {:<4}", item.id), separator_style(app)),
            Span::raw(format!(" Item: {}", item.name)),
            Span::styled(format!("  Quantity: {}", item.quantity), separator_style(app)),
        ])),
        DisplayMode::Editing => {
            let style = editing_style(app);
            let (name, quantity) = match app.edit_row.as_ref() {
                Some(row) if row.session.id() == item.id => (
                    row.fields.value(DraftField::Name).to_string(),
                    row.fields.value(DraftField::Quantity).to_string(),
                ),
                _ => (item.name.clone(), item.quantity.to_string()),
            };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(NAME_LABEL, style),
                    Span::raw(name),
                ]),
                Line::from(vec![
                    Span::styled(QUANTITY_LABEL, style),
                    Span::raw(quantity),
                ]),
            ])
        }
    }
}

/// Put the terminal cursor inside the focused field of the editing row.
/// Rows above it in the viewport are all single-line cards.
fn place_editor_cursor(frame: &mut Frame<'_>, inner: Rect, app: &App, row: &EditRow, offset: usize) {
    let Some(index) = app
        .snapshot
        .items
        .iter()
        .position(|item| item.id == row.session.id())
    else {
        return;
    };
    if index < offset {
        return;
    }

    let line = (index - offset) as u16 + field_line(&row.fields);
    let y = inner.y.saturating_add(line);
    let x = inner
        .x
        .saturating_add(HIGHLIGHT_SYMBOL.len() as u16)
        .saturating_add(NAME_LABEL.len() as u16)
        .saturating_add(row.fields.visual_cursor() as u16);
    if y < inner.y + inner.height && x < inner.x + inner.width {
        frame.set_cursor_position((x, y));
    }
}

fn field_line(fields: &FieldEditor) -> u16 {
    match fields.focus() {
        DraftField::Name => 0,
        DraftField::Quantity => 1,
    }
}

/// Footer hint built from the first binding of each action.
fn key_hint(actions: &[(&[String], &str)]) -> String {
    actions
        .iter()
        .filter_map(|(bindings, label)| {
            bindings
                .first()
                .map(|binding| format!("{}: {}", binding, label))
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn list_hint(keys: &Keys) -> String {
    key_hint(&[
        (&keys.list.add, "add"),
        (&keys.list.edit, "edit"),
        (&keys.list.delete, "delete"),
        (&keys.global.help, "help"),
        (&keys.global.quit, "quit"),
    ])
}

fn dialog_hint(keys: &Keys) -> String {
    key_hint(&[
        (&keys.dialog.next_field, "next field"),
        (&keys.dialog.confirm, "add"),
        (&keys.dialog.cancel, "cancel"),
    ])
}

fn editor_hint(keys: &Keys) -> String {
    key_hint(&[
        (&keys.editor.confirm, "save"),
        (&keys.editor.next_field, "field"),
        (&keys.editor.edit_item, "edit row"),
        (&keys.editor.delete_item, "delete row"),
    ])
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let keys = app.keys();
    let message = if app.snapshot.dialog_open {
        dialog_hint(keys)
    } else if app.edit_row.is_some() {
        editor_hint(keys)
    } else {
        app.status.clone().unwrap_or_else(|| list_hint(keys))
    };
    let colors = app.ui_colors();
    let style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let background = Block::default().style(Style::default().bg(color(colors.status_bg)));
    frame.render_widget(background, area);

    frame.render_widget(Paragraph::new(message).style(style), area);
}

fn draw_add_dialog(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    if !app.snapshot.dialog_open {
        return;
    }

    let focus = app.dialog.focus();
    let label_style = |field: DraftField| {
        if field == focus {
            selection_style(app)
        } else {
            header_text_style(app)
        }
    };
    let lines = vec![
        Line::from(vec![
            Span::styled(NAME_LABEL, label_style(DraftField::Name)),
            Span::raw(app.dialog.value(DraftField::Name).to_string()),
        ]),
        Line::from(vec![
            Span::styled(QUANTITY_LABEL, label_style(DraftField::Quantity)),
            Span::raw(app.dialog.value(DraftField::Quantity).to_string()),
        ]),
        Line::from(""),
        Line::from(dialog_hint(app.keys())),
    ];

    let title_line = Line::from(Span::styled("ADD NEW ITEM", header_text_style(app)));
    let popup = Popup::new(Text::from(lines))
        .title(title_line)
        .border_style(border_style(app));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);

    if let Some(area) = app.modal_popup.area() {
        let inner = Block::default().borders(Borders::ALL).inner(*area);
        let x = inner
            .x
            .saturating_add(NAME_LABEL.len() as u16 + app.dialog.visual_cursor() as u16);
        let y = inner.y + field_line(&app.dialog);
        frame.set_cursor_position((x, y));
    }
}

fn draw_help_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    if app.help_modal.is_none() {
        return;
    }

    // Calculate modal size: 2/3 width, 80% height
    let width = area.width.saturating_mul(2).saturating_div(3).max(40).min(area.width);
    let height = area.height.saturating_mul(4).saturating_div(5).max(10).min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let modal_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, modal_area);

    let header_style = header_text_style(app);
    let border_s = border_style(app);

    let sections = app.help_entries();
    let mut lines: Vec<Line> = Vec::new();

    let content_width = width.saturating_sub(4) as usize;
    let action_width = 20usize;

    for (section_idx, section) in sections.iter().enumerate() {
        let header_text = format!(" {} ", section.title);
        let padding_total = content_width.saturating_sub(header_text.len());
        let left_pad = padding_total / 2;
        let right_pad = padding_total - left_pad;
        let header_line = format!(
            "{}{}{}",
            LINE.horizontal.repeat(left_pad),
            header_text,
            LINE.horizontal.repeat(right_pad)
        );
        lines.push(Line::from(Span::styled(header_line, header_style)));

        for entry in &section.entries {
            let action = format!("{:<width$}", entry.action, width = action_width);
            lines.push(Line::from(vec![
                Span::raw(action),
                Span::styled(entry.keys.clone(), header_style),
            ]));
        }

        if section_idx < sections.len() - 1 {
            lines.push(Line::from(""));
        }
    }

    let total_lines = lines.len();
    // borders (2) + footer line (1)
    let inner_height = height.saturating_sub(3) as usize;

    let Some(modal) = app.help_modal.as_mut() else {
        return;
    };
    modal.total_lines = total_lines;
    modal.viewport_height = inner_height;
    let max_scroll = modal.total_lines.saturating_sub(modal.viewport_height);
    modal.scroll = modal.scroll.min(max_scroll);

    let scroll_indicator = match (modal.can_scroll_up(), modal.can_scroll_down()) {
        (true, true) => "▲▼",
        (true, false) => "▲ ",
        (false, true) => " ▼",
        (false, false) => "  ",
    };
    let visible_lines: Vec<Line> = lines
        .into_iter()
        .skip(modal.scroll)
        .take(modal.viewport_height)
        .collect();

    let title = Line::from(vec![
        Span::styled(" HELP ", header_style),
        Span::styled(scroll_indicator, header_style),
    ]);
    let footer = Line::from(Span::styled(
        format!(" {} ", HELP_MODAL_FOOTER),
        header_style,
    ));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_s)
        .title(title)
        .title_bottom(footer)
        .title_alignment(Alignment::Center);

    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);
    frame.render_widget(Paragraph::new(visible_lines), inner);
}

fn render_centered_words(frame: &mut Frame<'_>, area: Rect, text: &str) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let mut lines: Vec<Line> = text
        .split_whitespace()
        .map(|word| Line::from(word.to_string()))
        .collect();

    if lines.is_empty() {
        return;
    }

    if lines.len() as u16 > area.height {
        lines.truncate(area.height as usize);
    }

    let height = lines.len() as u16;
    let start_y = area.y + (area.height.saturating_sub(height)) / 2;
    let target = Rect {
        x: area.x,
        y: start_y,
        width: area.width,
        height,
    };

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), target);
}

fn selection_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn editing_style(app: &App) -> Style {
    Style::default()
        .fg(color(app.ui_colors().editing_fg))
        .add_modifier(Modifier::BOLD)
}

fn border_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().border))
}

fn header_text_style(app: &App) -> Style {
    Style::default()
        .fg(color(app.ui_colors().border))
        .add_modifier(Modifier::BOLD)
}

fn separator_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().border))
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::config::Config;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        render(&mut terminal, app).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for row in buffer.content.chunks(buffer.area.width as usize) {
            for cell in row {
                out.push_str(cell.symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_render_empty_list() {
        let config = Config::for_tests();
        let mut app = App::new(&config);
        let text = screen(&mut app);
        assert!(text.contains("MY SHOPPING LIST"));
        assert!(text.contains("0 items"));
        assert!(text.contains("Nothing"));
    }

    #[test]
    fn test_render_rows_and_editor() {
        let config = Config::for_tests();
        let mut app = App::new(&config);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Milk");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "2");

        let text = screen(&mut app);
        assert!(text.contains("ADD NEW ITEM"));
        assert!(text.contains("ITEM NAME: Milk"));

        press(&mut app, KeyCode::Enter);
        let text = screen(&mut app);
        assert!(!text.contains("ADD NEW ITEM"));
        assert!(text.contains("Item: Milk"));
        assert!(text.contains("Quantity: 2"));
        assert!(text.contains("1 item"));

        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "s");
        let text = screen(&mut app);
        assert!(text.contains("ITEM NAME: Milks"));
        assert!(text.contains("QUANTITY:  2"));
    }

    #[test]
    fn test_footer_follows_bindings() {
        let mut config = Config::for_tests();
        config.keys.list.add = vec!["n".into()];
        config.keys.dialog.confirm = vec!["F5".into()];
        config.keys.editor.delete_item = vec!["F9".into()];
        let mut app = App::new(&config);

        let text = screen(&mut app);
        assert!(text.contains("n: add"));
        assert!(!text.contains("a: add"));

        press(&mut app, KeyCode::Char('n'));
        let text = screen(&mut app);
        assert!(text.contains("F5: add"));
        type_text(&mut app, "Milk");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "2");
        press(&mut app, KeyCode::F(5));

        press(&mut app, KeyCode::Char('e'));
        let text = screen(&mut app);
        assert!(text.contains("F9: delete row"));
    }

    #[test]
    fn test_render_help() {
        let config = Config::for_tests();
        let mut app = App::new(&config);
        press(&mut app, KeyCode::F(1));
        let text = screen(&mut app);
        assert!(text.contains("HELP"));
        assert!(text.contains("Add item"));
    }
}
