//! The shopping list state machine.
//!
//! A [`Snapshot`] is the whole observable state of the list screen. Every
//! transition borrows the current snapshot and builds a new one, so a
//! renderer holding an older snapshot never sees a half-applied change.
//! Transitions are total: bad input degrades to a no-op or a zero quantity.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::item::{parse_quantity, DisplayMode, Item, ItemId};

/// Which text field of the add dialog a draft edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftField {
    Name,
    Quantity,
}

impl DraftField {
    pub fn title(self) -> &'static str {
        match self {
            DraftField::Name => "Item Name",
            DraftField::Quantity => "Quantity",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            DraftField::Name => DraftField::Quantity,
            DraftField::Quantity => DraftField::Name,
        }
    }
}

/// User intents forwarded by a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Intent {
    OpenAddDialog,
    DraftChanged {
        field: DraftField,
        value: String,
    },
    CancelAdd,
    ConfirmAdd,
    Delete {
        id: ItemId,
    },
    BeginEdit {
        id: ItemId,
    },
    ConfirmEdit {
        id: ItemId,
        name: String,
        quantity_text: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub items: Vec<Item>,
    pub dialog_open: bool,
    pub draft_name: String,
    pub draft_quantity: String,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn editing_item(&self) -> Option<&Item> {
        self.items.iter().find(|item| item.is_editing())
    }

    /// Id the next accepted item will receive, or `None` once ids are exhausted.
    pub fn next_id(&self) -> Option<ItemId> {
        self.items
            .iter()
            .map(|item| item.id)
            .max()
            .unwrap_or(0)
            .checked_add(1)
    }

    pub fn apply(&self, intent: &Intent) -> Snapshot {
        debug!(?intent, "applying intent");
        match intent {
            Intent::OpenAddDialog => self.open_add_dialog(),
            Intent::DraftChanged { field, value } => match field {
                DraftField::Name => self.update_draft(Some(value), None),
                DraftField::Quantity => self.update_draft(None, Some(value)),
            },
            Intent::CancelAdd => self.cancel_add(),
            Intent::ConfirmAdd => self.confirm_add(),
            Intent::Delete { id } => self.delete(*id),
            Intent::BeginEdit { id } => self.begin_edit(*id),
            Intent::ConfirmEdit {
                id,
                name,
                quantity_text,
            } => self.confirm_edit(*id, name, quantity_text),
        }
    }

    pub fn open_add_dialog(&self) -> Snapshot {
        Snapshot {
            dialog_open: true,
            ..self.clone()
        }
    }

    /// Replace whichever draft fields are given. No validation happens here.
    pub fn update_draft(&self, name: Option<&str>, quantity_text: Option<&str>) -> Snapshot {
        let mut next = self.clone();
        if let Some(name) = name {
            next.draft_name = name.to_string();
        }
        if let Some(quantity_text) = quantity_text {
            next.draft_quantity = quantity_text.to_string();
        }
        next
    }

    pub fn cancel_add(&self) -> Snapshot {
        Snapshot {
            items: self.items.clone(),
            ..Snapshot::default()
        }
    }

    /// Accept the draft as a new item. A blank name or a quantity that is not
    /// positive leaves everything as it was, dialog still open.
    pub fn confirm_add(&self) -> Snapshot {
        let quantity = parse_quantity(&self.draft_quantity);
        if self.draft_name.trim().is_empty() || quantity <= 0 {
            debug!(
                name = %self.draft_name,
                quantity = %self.draft_quantity,
                "draft rejected"
            );
            return self.clone();
        }
        let Some(id) = self.next_id() else {
            debug!("item ids exhausted, draft rejected");
            return self.clone();
        };

        info!(id, name = %self.draft_name, quantity, "item added");
        let mut items = self.items.clone();
        items.push(Item::new(id, self.draft_name.clone(), quantity));
        Snapshot {
            items,
            ..Snapshot::default()
        }
    }

    pub fn delete(&self, id: ItemId) -> Snapshot {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return self.clone();
        };
        info!(id, "item deleted");
        let mut next = self.clone();
        next.items.remove(index);
        next
    }

    /// Mark `id` as the single item being edited. Every other item goes back
    /// to viewing, even when `id` is not in the list.
    pub fn begin_edit(&self, id: ItemId) -> Snapshot {
        let items = self
            .items
            .iter()
            .map(|item| {
                let mode = if item.id == id {
                    DisplayMode::Editing
                } else {
                    DisplayMode::Viewing
                };
                item.with_mode(mode)
            })
            .collect();
        Snapshot {
            items,
            ..self.clone()
        }
    }

    /// Write the edited values back to `id` and end all editing.
    ///
    /// Unlike [`Snapshot::confirm_add`] nothing is validated: an empty name
    /// or a zero/negative quantity is stored as given.
    pub fn confirm_edit(&self, id: ItemId, name: &str, quantity_text: &str) -> Snapshot {
        let quantity = parse_quantity(quantity_text);
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.id == id {
                    info!(id, name, quantity, "item updated");
                    Item {
                        id,
                        name: name.to_string(),
                        quantity,
                        mode: DisplayMode::Viewing,
                    }
                } else {
                    item.with_mode(DisplayMode::Viewing)
                }
            })
            .collect();
        Snapshot {
            items,
            ..self.clone()
        }
    }
}
