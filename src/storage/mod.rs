//! Attribute storage: record layout and the append-only attribute table.

mod attrs;
mod edges;
mod extension;
mod layout;

pub use attrs::{AttributeTable, ABSENT_VALUE, NO_ENTRY};
pub use edges::{EdgeFieldColumn, EdgeFields, EdgeSlot};
pub use extension::GraphExtension;
pub use layout::{EntryField, EntryLayout};
