//! Shared types for the cosmos workspace.
//!
//! Every celestial object is addressed by an [`ObjectCode`]. The code encodes
//! the full containment path, so a parent can always be derived from a child
//! without consulting the universe.

mod code;
mod types;

pub use code::{CodeError, ObjectCode};
pub use types::{Composition, CompositionError, MINERAL_COUNT, Mineral, ObjectKind, SpectralType};
