//! # Application Layer
//!
//! Contains the core logic of ADE: the ReAct engine, the orchestrator with its thinking phase,
//! agent memory, the tool suite, error recovery, the permission manager and the todo list.

pub mod engine;
pub mod logging;
pub mod memory;
pub mod orchestrator;
pub mod parsing;
pub mod permissions;
pub mod recovery;
pub mod scaffold;
pub mod todo;
pub mod tools;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
