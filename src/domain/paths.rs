//! # Paths and Names
//!
//! Centralized definitions for file names and environment keys.
//! Acts as the single source of truth for where logs and stores live.

pub const CONFIG_FILE: &str = "data/config.yaml";
pub const SESSION_LOG: &str = "session.log";

pub const THINKING_LOG: &str = "thinking_log.txt";
pub const WRITING_LOG: &str = "writing_log.txt";
pub const ERROR_LOG: &str = "error_log.txt";

pub const MEMORY_STORE: &str = "store.json";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const MODEL_ENV: &str = "GEMINI_MODEL";
pub const PROBE_ENV: &str = "ADE_PERMISSION_TEST";

/// Directories the workspace fix creates and the diagnostic expects.
pub const WORKSPACE_DIRS: [&str; 4] = ["data", "data/vectorstore", "data/agent_workspace", "src/tools"];
