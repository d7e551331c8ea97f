//! # Domain Layer
//!
//! Core definitions, types, and traits shared by every component.
//! Independent of the console and HTTP plumbing, serving as the contract for other layers.

pub mod config;
pub mod paths;
pub mod traits;
pub mod types;
