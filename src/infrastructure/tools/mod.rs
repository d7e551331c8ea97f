//! # Tool Infrastructure
//!
//! Process execution used by the permission probes and the Python sandbox.

pub mod executor;

pub use executor::ToolExecutor;
