mod item;
mod session;
mod store;

pub use item::{DisplayMode, Item, ItemId};
pub use session::EditSession;
pub use store::{DraftField, Intent, Snapshot};
