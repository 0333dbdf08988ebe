pub mod filter;
pub mod types;

pub use filter::filter_mark_stream;
pub use types::{ClearMark, GenericMark, Mark, MarkGenerator, UndoMark, CLEAR_SCHEMA, UNDO_SCHEMA};
