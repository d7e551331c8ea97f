//! # Log Lines
//!
//! Entries written to the thinking log by the orchestrator.

pub const INITIALIZED: &str = "🧠 Autonomous ADE initialized and ready for autonomous operation";
pub const EXECUTION_START: &str = "------Starting autonomous execution---------";
pub const EXECUTION_DONE: &str = "♫♫ Autonomous execution completed";

pub fn analyzing(input: &str) -> String {
    format!("🤔 Analyzing request: {input}")
}

pub fn thinking_complete(preview: &str) -> String {
    format!("💭 Thinking complete: {preview}...")
}

pub fn thinking_failed(err: &str) -> String {
    format!("⚠️ Thinking failed: {err}")
}

pub fn mode_changed(mode: &str) -> String {
    format!("🔄 Mode changed to {mode}")
}
