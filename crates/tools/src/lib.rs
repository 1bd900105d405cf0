//! Developer tooling: a read-only universe inspector.
//!
//! # Invariants
//! - Inspection never mutates the universe.
//! - Listings come back in canonical code order.

mod inspector;

pub use inspector::{ChildEntry, ObjectInfo, UniverseInspector, UniverseSummary};
