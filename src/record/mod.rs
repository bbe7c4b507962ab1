//! Core record data structures

mod composite;
mod input;
mod value;

pub use composite::CompositeRecord;
pub use input::{InputRecord, InputTag};
pub use value::{AttrValue, Attrs, ValueKind};
