//! # Messages
//!
//! User-facing messages of the agent REPL and the startup gate.

pub const BANNER: &str = "🚀 ADE - Agentic Development Environment";
pub const NO_THOUGHTS: &str = "No thoughts logged yet.";
pub const THOUGHTS_CLEARED: &str = "🧹 Thinking log cleared.";
pub const EMPTY_WORKSPACE: &str = "📁 Workspace is empty.";
pub const MEMORY_SAVED: &str = "✅ Saved to long-term memory";
pub const SEED_LOADED: &str = "✅ Loaded seed memory";
pub const GOODBYE: &str = "👋 Goodbye!";
pub const THINKING_FALLBACK: &str = "Will proceed with standard processing.";
pub const REMEMBER_USAGE: &str = "Usage: remember <text to save>";

pub const CHECKING_PERMISSIONS: &str = "🔐 Checking system permissions...";
pub const GATE_BLOCKED: &str = "❌ Critical permission issues remain. Run 'ade permissions' to resolve them.";
pub const GATE_PASSED: &str = "✅ Permission checks passed";
pub const MISSING_API_KEY: &str = "❌ GOOGLE_API_KEY is not set. Add it to .env or run 'ade permissions' and choose 'config'.";

pub fn mode_switched(mode: &str) -> String {
    format!("🔄 Switched to {mode} mode")
}

pub fn memory_failed(err: &str) -> String {
    format!("❌ Could not save memory: {err}")
}

pub fn execution_failed(err: &str) -> String {
    format!("❌ Error during execution: {err}")
}

pub fn workspace_header(path: &str) -> String {
    format!("📁 Workspace: {path}")
}

pub fn workspace_entry(name: &str, size: u64, modified: &str) -> String {
    format!("- {name} ({size} bytes) - {modified}")
}

pub fn autonomous_result(thinking: &str, result: &str) -> String {
    format!(
        "AUTONOMOUS EXECUTION COMPLETE\n\n-- My Thinking: --\n{thinking}\n\n--Result: --\n{result}\n\n--💡 Tip: Use '/thoughts' to see my full thinking log--"
    )
}

pub fn ready(mode: &str, model: &str, memory: bool) -> String {
    let memory = if memory { "long-term + conversation" } else { "conversation only" };
    format!("✅ ADE ready | mode: {mode} | model: {model} | memory: {memory}\nType /help for commands.")
}
