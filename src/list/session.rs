use super::item::{Item, ItemId};
use super::store::{Intent, Snapshot};

/// Draft text for the one item currently being edited.
///
/// The session only lives in the presentation layer; the list itself just
/// knows which item is in editing mode. Nothing typed here reaches the list
/// until [`EditSession::confirm`] turns it into an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    id: ItemId,
    name: String,
    quantity_text: String,
}

impl EditSession {
    pub fn begin(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            quantity_text: item.quantity.to_string(),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity_text(&self) -> &str {
        &self.quantity_text
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_quantity_text(&mut self, text: impl Into<String>) {
        self.quantity_text = text.into();
    }

    /// Whether the session still belongs to `snapshot`: its item must exist
    /// and still be the one in editing mode.
    pub fn still_valid(&self, snapshot: &Snapshot) -> bool {
        snapshot
            .item(self.id)
            .map(Item::is_editing)
            .unwrap_or(false)
    }

    pub fn confirm(self) -> Intent {
        Intent::ConfirmEdit {
            id: self.id,
            name: self.name,
            quantity_text: self.quantity_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(name: &str, quantity: &str) -> Snapshot {
        Snapshot::new()
            .open_add_dialog()
            .update_draft(Some(name), Some(quantity))
            .confirm_add()
    }

    #[test]
    fn test_begin_copies_item_values() {
        let item = Item::new(3, "Milk", 2);
        let session = EditSession::begin(&item);
        assert_eq!(session.id(), 3);
        assert_eq!(session.name(), "Milk");
        assert_eq!(session.quantity_text(), "2");
    }

    #[test]
    fn test_draft_does_not_touch_list_until_confirm() {
        let snapshot = listed("Milk", "2").begin_edit(1);
        let mut session = EditSession::begin(&snapshot.items[0]);
        session.set_name("Bread");
        session.set_quantity_text("5");

        assert_eq!(snapshot.items[0].name, "Milk");

        let done = snapshot.apply(&session.confirm());
        assert_eq!(done.items, vec![Item::new(1, "Bread", 5)]);
    }

    #[test]
    fn test_session_invalidated() {
        let snapshot = listed("Milk", "2");
        let snapshot = snapshot
            .open_add_dialog()
            .update_draft(Some("Eggs"), Some("6"))
            .confirm_add()
            .begin_edit(1);
        let session = EditSession::begin(&snapshot.items[0]);
        assert!(session.still_valid(&snapshot));

        // Another item starting to edit abandons this draft.
        assert!(!session.still_valid(&snapshot.begin_edit(2)));

        // So does deleting the item mid-edit.
        assert!(!session.still_valid(&snapshot.delete(1)));

        // And saving ends editing.
        assert!(!session.still_valid(&snapshot.confirm_edit(1, "Milk", "2")));
    }
}
