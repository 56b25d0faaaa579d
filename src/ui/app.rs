use std::io::stdout;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::debug;
use tui_widgets::popup::PopupState;

use crate::config::{Config, Keys, UiColors};
use crate::list::{DraftField, EditSession, Intent, Item, Snapshot};

use super::draw;
use super::edit::FieldEditor;

/// Help modal state with scroll support
#[derive(Debug, Clone)]
pub struct HelpModal {
    /// Current scroll offset (line index at top of viewport)
    pub scroll: usize,
    pub total_lines: usize,
    /// Viewport height (set during rendering)
    pub viewport_height: usize,
}

impl HelpModal {
    pub fn new(total_lines: usize) -> Self {
        Self {
            scroll: 0,
            total_lines,
            viewport_height: 10,
        }
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max_scroll = self.total_lines.saturating_sub(self.viewport_height);
        self.scroll = (self.scroll + lines).min(max_scroll);
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn can_scroll_up(&self) -> bool {
        self.scroll > 0
    }

    pub fn can_scroll_down(&self) -> bool {
        self.scroll + self.viewport_height < self.total_lines
    }
}

/// A section in the help modal (e.g., "List", "Add Dialog")
pub struct HelpSection {
    pub title: &'static str,
    pub entries: Vec<HelpEntry>,
}

/// A single help entry (action name + key bindings)
pub struct HelpEntry {
    pub action: &'static str,
    pub keys: String,
}

/// The item currently open in the inline editor: its draft plus the widgets
/// the draft is typed into.
pub struct EditRow {
    pub session: EditSession,
    pub fields: FieldEditor,
}

impl EditRow {
    fn begin(item: &Item) -> Self {
        let session = EditSession::begin(item);
        let mut fields = FieldEditor::default();
        fields.start(session.name(), session.quantity_text());
        Self { session, fields }
    }
}

pub struct App<'a> {
    config: &'a Config,
    pub snapshot: Snapshot,
    pub selected: usize,
    pub dialog: FieldEditor,
    pub edit_row: Option<EditRow>,
    pub help_modal: Option<HelpModal>,
    pub modal_popup: PopupState,
    pub status: Option<String>,
}

impl<'a> App<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            snapshot: Snapshot::new(),
            selected: 0,
            dialog: FieldEditor::default(),
            edit_row: None,
            help_modal: None,
            modal_popup: PopupState::default(),
            status: None,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;

            // Every transition runs to completion here before the next event is read.
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if self.handle_key(key) {
                        break;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    pub fn keys(&self) -> &Keys {
        &self.config.keys
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.snapshot.items.get(self.selected)
    }

    /// Apply an intent and replace the current snapshot with the result.
    fn dispatch(&mut self, intent: Intent) {
        let before = self.snapshot.items.len();
        self.snapshot = self.snapshot.apply(&intent);

        if let Some(row) = &self.edit_row {
            if !row.session.still_valid(&self.snapshot) {
                debug!(id = row.session.id(), "edit draft discarded");
                self.edit_row = None;
            }
        }
        if self.edit_row.is_none() {
            self.edit_row = self.snapshot.editing_item().map(EditRow::begin);
        }

        if !self.snapshot.dialog_open {
            self.dialog.reset();
        }

        if matches!(intent, Intent::ConfirmAdd) && self.snapshot.items.len() > before {
            self.selected = self.snapshot.items.len() - 1;
            self.set_status("Item added");
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let max_index = self.snapshot.items.len().saturating_sub(1);
        self.selected = self.selected.min(max_index);
    }

    /// Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Ctrl+C always quits (hardcoded for safety)
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return true;
        }

        if self.help_modal.is_some() {
            self.handle_help_modal_key(key);
            return false;
        }

        if self.snapshot.dialog_open {
            self.handle_dialog_key(key);
            return false;
        }

        if self.edit_row.is_some() {
            self.handle_editor_key(key);
            return false;
        }

        self.handle_list_key(key)
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> bool {
        let config = self.config;
        let global = &config.keys.global;
        let list = &config.keys.list;
        self.status = None;

        if key_matches_any(&key, &global.quit) {
            return true;
        }

        if key_matches_any(&key, &global.help) {
            self.show_help();
        } else if key_matches_any(&key, &list.next) {
            self.selected += 1;
            self.clamp_selection();
        } else if key_matches_any(&key, &list.prev) {
            self.selected = self.selected.saturating_sub(1);
        } else if key_matches_any(&key, &list.add) {
            self.dispatch(Intent::OpenAddDialog);
            self.modal_popup = PopupState::default();
            self.dialog
                .start(&self.snapshot.draft_name, &self.snapshot.draft_quantity);
        } else if key_matches_any(&key, &list.edit) {
            if let Some(id) = self.selected_item().map(|item| item.id) {
                self.dispatch(Intent::BeginEdit { id });
            }
        } else if key_matches_any(&key, &list.delete) {
            if let Some(id) = self.selected_item().map(|item| item.id) {
                self.dispatch(Intent::Delete { id });
                self.set_status("Item deleted");
            }
        }
        false
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let keys = &config.keys.dialog;

        if key_matches_any(&key, &keys.cancel) {
            self.dispatch(Intent::CancelAdd);
        } else if key_matches_any(&key, &keys.confirm) {
            // A rejected draft keeps the dialog open with its text intact.
            self.dispatch(Intent::ConfirmAdd);
        } else if key_matches_any(&key, &keys.next_field) || key_matches_any(&key, &keys.prev_field)
        {
            self.dialog.toggle_focus();
        } else if let Some(value) = self.dialog.handle_key_event(key) {
            let field = self.dialog.focus();
            self.dispatch(Intent::DraftChanged { field, value });
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let keys = &config.keys.editor;

        // Row actions move the selection or act on the selected item, which
        // need not be the one being edited.
        if key_matches_any(&key, &keys.next_item) {
            self.selected += 1;
            self.clamp_selection();
            return;
        }
        if key_matches_any(&key, &keys.prev_item) {
            self.selected = self.selected.saturating_sub(1);
            return;
        }
        if key_matches_any(&key, &keys.edit_item) {
            if let Some(id) = self.selected_item().map(|item| item.id) {
                self.dispatch(Intent::BeginEdit { id });
            }
            return;
        }
        if key_matches_any(&key, &keys.delete_item) {
            if let Some(id) = self.selected_item().map(|item| item.id) {
                self.dispatch(Intent::Delete { id });
                self.set_status("Item deleted");
            }
            return;
        }

        let Some(row) = self.edit_row.as_mut() else {
            return;
        };

        if key_matches_any(&key, &keys.confirm) {
            if let Some(row) = self.edit_row.take() {
                self.dispatch(row.session.confirm());
                self.set_status("Item updated");
            }
        } else if key_matches_any(&key, &keys.next_field) || key_matches_any(&key, &keys.prev_field)
        {
            row.fields.toggle_focus();
        } else if let Some(value) = row.fields.handle_key_event(key) {
            match row.fields.focus() {
                DraftField::Name => row.session.set_name(value),
                DraftField::Quantity => row.session.set_quantity_text(value),
            }
        }
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    pub fn help_entries(&self) -> Vec<HelpSection> {
        let keys = &self.config.keys;

        vec![
            HelpSection {
                title: "List",
                entries: vec![
                    HelpEntry {
                        action: "Next item",
                        keys: keys.list.next.join(", "),
                    },
                    HelpEntry {
                        action: "Previous item",
                        keys: keys.list.prev.join(", "),
                    },
                    HelpEntry {
                        action: "Add item",
                        keys: keys.list.add.join(", "),
                    },
                    HelpEntry {
                        action: "Edit item",
                        keys: keys.list.edit.join(", "),
                    },
                    HelpEntry {
                        action: "Delete item",
                        keys: keys.list.delete.join(", "),
                    },
                    HelpEntry {
                        action: "Help",
                        keys: keys.global.help.join(", "),
                    },
                    HelpEntry {
                        action: "Quit",
                        keys: keys.global.quit.join(", "),
                    },
                ],
            },
            HelpSection {
                title: "Add Dialog",
                entries: vec![
                    HelpEntry {
                        action: "Add",
                        keys: keys.dialog.confirm.join(", "),
                    },
                    HelpEntry {
                        action: "Cancel",
                        keys: keys.dialog.cancel.join(", "),
                    },
                    HelpEntry {
                        action: "Next field",
                        keys: keys.dialog.next_field.join(", "),
                    },
                    HelpEntry {
                        action: "Previous field",
                        keys: keys.dialog.prev_field.join(", "),
                    },
                ],
            },
            HelpSection {
                title: "Editor",
                entries: vec![
                    HelpEntry {
                        action: "Save",
                        keys: keys.editor.confirm.join(", "),
                    },
                    HelpEntry {
                        action: "Next field",
                        keys: keys.editor.next_field.join(", "),
                    },
                    HelpEntry {
                        action: "Previous field",
                        keys: keys.editor.prev_field.join(", "),
                    },
                    HelpEntry {
                        action: "Next item",
                        keys: keys.editor.next_item.join(", "),
                    },
                    HelpEntry {
                        action: "Previous item",
                        keys: keys.editor.prev_item.join(", "),
                    },
                    HelpEntry {
                        action: "Edit selected instead",
                        keys: keys.editor.edit_item.join(", "),
                    },
                    HelpEntry {
                        action: "Delete selected",
                        keys: keys.editor.delete_item.join(", "),
                    },
                ],
            },
        ]
    }

    pub fn show_help(&mut self) {
        let sections = self.help_entries();
        // Header plus entries per section, blank line between sections.
        let total_lines = sections
            .iter()
            .map(|section| section.entries.len() + 2)
            .sum::<usize>()
            .saturating_sub(1);
        self.help_modal = Some(HelpModal::new(total_lines));
    }

    fn handle_help_modal_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc) || matches!(key.code, KeyCode::Char('q')) {
            self.help_modal = None;
            return;
        }

        let Some(modal) = self.help_modal.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => modal.scroll_down(1),
            KeyCode::Char('k') | KeyCode::Up => modal.scroll_up(1),
            KeyCode::PageDown => {
                let page = modal.viewport_height.saturating_sub(1).max(1);
                modal.scroll_down(page);
            }
            KeyCode::PageUp => {
                let page = modal.viewport_height.saturating_sub(1).max(1);
                modal.scroll_up(page);
            }
            _ => {}
        }
    }
}

/// Check if the key event matches any of the bindings in the list
pub fn key_matches_any(event: &KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|b| key_matches_single(event, b))
}

/// Check if the key event matches a single binding string
pub fn key_matches_single(event: &KeyEvent, binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Disallow Ctrl/Alt/Super modifiers (we don't support them)
    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "enter" => matches!(event.code, KeyCode::Enter),
        "tab" => matches!(event.code, KeyCode::Tab),
        "backtab" | "shift+tab" => matches!(event.code, KeyCode::BackTab),
        "backspace" => matches!(event.code, KeyCode::Backspace),
        "delete" | "del" => matches!(event.code, KeyCode::Delete),
        "esc" | "escape" => matches!(event.code, KeyCode::Esc),
        "space" => matches!(event.code, KeyCode::Char(' ')),
        "up" => matches!(event.code, KeyCode::Up),
        "down" => matches!(event.code, KeyCode::Down),
        "left" => matches!(event.code, KeyCode::Left),
        "right" => matches!(event.code, KeyCode::Right),
        "pageup" | "page_up" => matches!(event.code, KeyCode::PageUp),
        "pagedown" | "page_down" => matches!(event.code, KeyCode::PageDown),
        "home" => matches!(event.code, KeyCode::Home),
        "end" => matches!(event.code, KeyCode::End),
        name => {
            if let Some(number) = name.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                return (1..=12).contains(&number) && event.code == KeyCode::F(number);
            }
            // Single character - case-sensitive (m != M, since M requires Shift)
            let mut chars = trimmed.chars();
            if let (Some(first), None) = (chars.next(), chars.next()) {
                matches!(event.code, KeyCode::Char(c) if c == first)
            } else {
                false
            }
        }
    }
}
