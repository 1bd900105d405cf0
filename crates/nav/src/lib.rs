//! Navigation: a small command language for walking the universe.
//!
//! A [`Navigator`] holds one session's location and turns parsed
//! [`Command`]s into [`Reply`] values. Replies render as text for the REPL
//! and serialize as JSON for the network server.
//!
//! # Invariants
//! - The location is always `None` (root) or a code that exists.
//! - A failed command leaves the location unchanged.

mod command;
mod navigator;

pub use command::{Command, HELP, NavError};
pub use navigator::{Navigator, RankEntry, Reply};
