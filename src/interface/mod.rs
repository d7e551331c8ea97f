//! # Interface Layer
//!
//! Terminal-facing code: the console implementations of the interactive traits and the
//! subcommand handlers.

pub mod commands;
pub mod console;
