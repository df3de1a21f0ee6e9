//! Core domain + application logic for the word-game chat bot.
//!
//! This crate is intentionally framework-agnostic. The messaging platform and
//! the language-model definition API live behind ports (traits) implemented in
//! adapter crates.

pub mod config;
pub mod cooldown;
pub mod dictionary;
pub mod domain;
pub mod errors;
pub mod game;
pub mod handlers;
pub mod hints;
pub mod lobby;
pub mod logging;
pub mod messaging;
pub mod registry;
pub mod scoring;
pub mod stats;
pub mod timer;

pub use errors::{Error, Reject, Result};
