//! Persistence: the universe lives in one binary file and is loaded, never
//! regenerated, once it exists.
//!
//! # Invariants
//! - Writes are atomic: a reader sees the old file or the new one, never a mix.
//! - Every load verifies the schema version and payload hash (fail closed).
//! - Padding never alters the payload; the file may be larger than its contents.

mod export;
mod store;

pub use export::export_json;
pub use store::{
    FileHeader, HEADER_LEN, MAGIC, Origin, PersistError, SCHEMA_VERSION, UniverseFile,
    open_or_generate,
};
