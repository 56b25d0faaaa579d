use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::list::DraftField;

/// A name + quantity pair of text inputs with one focused field.
///
/// Backs both the add dialog and the inline item editor.
pub struct FieldEditor {
    focus: DraftField,
    name: Input,
    quantity: Input,
}

impl Default for FieldEditor {
    fn default() -> Self {
        Self {
            focus: DraftField::Name,
            name: Input::default(),
            quantity: Input::default(),
        }
    }
}

impl FieldEditor {
    pub fn start(&mut self, name: &str, quantity: &str) {
        self.focus = DraftField::Name;
        self.name = Input::new(name.to_string());
        self.quantity = Input::new(quantity.to_string());
    }

    pub fn reset(&mut self) {
        self.focus = DraftField::Name;
        self.name.reset();
        self.quantity.reset();
    }

    pub fn focus(&self) -> DraftField {
        self.focus
    }

    pub fn toggle_focus(&mut self) {
        self.focus = self.focus.toggle();
    }

    pub fn value(&self, field: DraftField) -> &str {
        self.input(field).value()
    }

    pub fn visual_cursor(&self) -> usize {
        self.input(self.focus).visual_cursor()
    }

    /// Feed a key to the focused input. Returns the new text when it changed.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<String> {
        let input = match self.focus {
            DraftField::Name => &mut self.name,
            DraftField::Quantity => &mut self.quantity,
        };
        let changed = input.handle_event(&Event::Key(key))?;
        changed.value.then(|| input.value().to_string())
    }

    fn input(&self, field: DraftField) -> &Input {
        match field {
            DraftField::Name => &self.name,
            DraftField::Quantity => &self.quantity,
        }
    }
}
