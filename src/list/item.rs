use serde::{Deserialize, Serialize};

pub type ItemId = u32;

/// How an item row is presented: as a read-only card or as the inline editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Viewing,
    Editing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub quantity: i32,
    #[serde(default)]
    pub mode: DisplayMode,
}

impl Item {
    pub fn new(id: ItemId, name: impl Into<String>, quantity: i32) -> Self {
        Self {
            id,
            name: name.into(),
            quantity,
            mode: DisplayMode::Viewing,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.mode == DisplayMode::Editing
    }

    pub(crate) fn with_mode(&self, mode: DisplayMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }
}

/// Parse user-typed quantity text. Anything that is not a plain signed
/// 32-bit integer (whitespace included) counts as zero.
pub fn parse_quantity(text: &str) -> i32 {
    text.parse::<i32>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("2"), 2);
        assert_eq!(parse_quantity("+7"), 7);
        assert_eq!(parse_quantity("-5"), -5);
        assert_eq!(parse_quantity("0"), 0);

        assert_eq!(parse_quantity(""), 0);
        assert_eq!(parse_quantity("abc"), 0);
        assert_eq!(parse_quantity(" 3"), 0);
        assert_eq!(parse_quantity("3 "), 0);
        assert_eq!(parse_quantity("1.5"), 0);
        assert_eq!(parse_quantity("99999999999"), 0);
    }

    #[test]
    fn test_new_item_is_viewing() {
        let item = Item::new(1, "Milk", 2);
        assert!(!item.is_editing());
        assert!(item.with_mode(DisplayMode::Editing).is_editing());
    }
}
