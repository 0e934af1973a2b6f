pub mod page_table;

pub use page_table::{Page, PageTable, SlotId};
