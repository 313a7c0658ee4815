//! The DBF record engine: open/create/read/write/navigate tables.

pub mod cursor;
pub mod field;
pub mod header;

pub use cursor::Dbf;
pub use field::{FieldDescriptor, FieldType};
