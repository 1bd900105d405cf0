//! Universe kernel: authoritative model, deterministic generation, lookup by code.
//!
//! # Invariants
//! - Generation is pure with respect to `(seed, config)`.
//! - Galaxy `i` depends only on the seed and per-galaxy parameters, never on
//!   how many galaxies are generated.
//! - Every object's code matches its position in the containment tree.

pub mod config;
pub mod generate;
pub mod model;
pub mod universe;

pub use config::{CountRange, GenerationConfig, KernelError, ValueRange};
pub use generate::{DEFAULT_SEED, galaxy_seed, generate_galaxy};
pub use model::{Asteroid, BlackHole, CelestialRef, Comet, Galaxy, Nebula, Planet, Star};
pub use universe::{Universe, UniverseStats};
