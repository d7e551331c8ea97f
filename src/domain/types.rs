//! # Domain Types
//!
//! Plain data records shared between the application services and the console.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the permission table. Mutated in place after each check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRecord {
    pub key: &'static str,
    pub description: &'static str,
    pub status: bool,
    pub critical: bool,
}

/// A single todo entry as stored in the JSON array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoItem {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: String,
}

impl TodoItem {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            completed: false,
            created_at: chrono::Local::now().to_rfc3339(),
        }
    }
}

/// Kind of entry in the created-item log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    File,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Folder => write!(f, "folder"),
            ItemKind::File => write!(f, "file"),
        }
    }
}

/// Session record of something the scaffolder wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub path: String,
    pub size: u64,
}

/// Orchestrator mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentMode {
    #[default]
    Autonomous,
    Standard,
}

impl AgentMode {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "standard" => AgentMode::Standard,
            _ => AgentMode::Autonomous,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AgentMode::Autonomous => "autonomous",
            AgentMode::Standard => "standard",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            AgentMode::Autonomous => AgentMode::Standard,
            AgentMode::Standard => AgentMode::Autonomous,
        }
    }
}

/// One parsed step of a ReAct reply.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    /// Invoke a tool with the given raw input
    Action { tool: String, input: String },
    /// Stop and answer the user
    Final(String),
    /// Neither an action nor a final answer could be found
    Unparsed(String),
}
