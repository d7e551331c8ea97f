//! # Command Handlers
//!
//! One handler per `ade` subcommand: the agent REPL, the permission console, the todo menu
//! and the scaffolder.

pub mod agent;
pub mod create;
pub mod permissions;
pub mod todo;
