//! # Orchestrator
//!
//! `AutonomousAde` wraps the agent with a mode switch, a thinking phase, the thinking log
//! and the REPL slash commands.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::engine::Agent;
use crate::application::logging::ActivityLog;
use crate::application::memory::AgentMemory;
use crate::application::tools::{ToolContext, ToolRegistry};
use crate::application::utils::truncate_chars;
use crate::domain::config::AppConfig;
use crate::domain::paths::THINKING_LOG;
use crate::domain::traits::{Approver, Embedder, LlmProvider};
use crate::domain::types::AgentMode;
use crate::strings::{help, logs, messages, prompts};

/// What the REPL should do with a line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Exit,
    Text(String),
}

pub struct AutonomousAde {
    config: AppConfig,
    llm: Arc<dyn LlmProvider>,
    agent: Agent,
    mode: AgentMode,
    workspace: PathBuf,
    thoughts: ActivityLog,
}

impl AutonomousAde {
    /// Builds the agent, creates the workspace and loads the seed memory once.
    pub async fn new(
        config: AppConfig,
        llm: Arc<dyn LlmProvider>,
        embedder: Option<Arc<dyn Embedder>>,
        approver: Arc<dyn Approver>,
    ) -> Result<Self> {
        let workspace = config.workspace_dir();
        fs::create_dir_all(&workspace)
            .with_context(|| format!("Cannot create workspace {}", workspace.display()))?;
        let thoughts = ActivityLog::new(workspace.join(THINKING_LOG));

        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let ctx = ToolContext::new(config.clone(), Some(llm.clone()), approver, cwd);
        let memory = AgentMemory::open(&config.vectorstore_dir(), embedder, config.agent.memory_k).await;
        let agent = Agent::new(&config, llm.clone(), ToolRegistry::new(ctx), memory).with_thought_log(thoughts.clone());

        let mut ade = Self {
            mode: AgentMode::from_str(&config.agent.default_mode),
            config,
            llm,
            agent,
            workspace,
            thoughts,
        };
        if let Some(message) = ade.load_seed_memory().await {
            tracing::info!("{}", message);
        }
        ade.thoughts.log(logs::INITIALIZED);
        Ok(ade)
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    pub fn toggle_mode(&mut self) -> AgentMode {
        self.mode = self.mode.toggled();
        self.thoughts.log(&logs::mode_changed(self.mode.as_str()));
        self.mode
    }

    /// Adds the seed memory file once, tagged `seed_memory`.
    async fn load_seed_memory(&mut self) -> Option<String> {
        let path = PathBuf::from(&self.config.paths.seed_memory);
        let text = fs::read_to_string(&path).ok()?;
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let memory = self.agent.memory_mut();
        if memory.store.as_ref()?.has_metadata("source", "seed_memory") {
            return None;
        }
        match memory.remember(text, "seed_memory").await {
            Ok(()) => Some(messages::SEED_LOADED.to_string()),
            Err(e) => {
                tracing::warn!("Failed to load seed memory from {}: {:#}", path.display(), e);
                None
            }
        }
    }

    /// The thinking phase. Failures degrade to a fixed fallback plan.
    pub async fn think_and_plan(&self, input: &str) -> String {
        self.thoughts.log(&logs::analyzing(input));
        match self
            .llm
            .completion(&prompts::thinking(input), Some(self.config.llm.thinking_temperature))
            .await
        {
            Ok(thinking) => {
                let thinking = thinking.trim().to_string();
                self.thoughts.log(&logs::thinking_complete(&truncate_chars(&thinking, 200)));
                thinking
            }
            Err(e) => {
                self.thoughts.log(&logs::thinking_failed(&e));
                messages::THINKING_FALLBACK.to_string()
            }
        }
    }

    /// Runs one request in the current mode. Errors come back as a message.
    pub async fn execute(&mut self, input: &str) -> String {
        match self.mode {
            AgentMode::Autonomous => {
                let thinking = self.think_and_plan(input).await;
                self.thoughts.log(logs::EXECUTION_START);
                let request = prompts::enhanced_request(input, &thinking);
                match self.agent.run(&request).await {
                    Ok(result) => {
                        self.thoughts.log(logs::EXECUTION_DONE);
                        messages::autonomous_result(&thinking, &result)
                    }
                    Err(e) => {
                        tracing::error!("Autonomous execution failed: {:#}", e);
                        messages::execution_failed(&format!("{:#}", e))
                    }
                }
            }
            AgentMode::Standard => match self.agent.run(input).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Execution failed: {:#}", e);
                    messages::execution_failed(&format!("{:#}", e))
                }
            },
        }
    }

    pub fn thoughts(&self) -> String {
        match self.thoughts.read() {
            Ok(content) if !content.trim().is_empty() => content,
            Ok(_) => messages::NO_THOUGHTS.to_string(),
            Err(e) => format!("❌ Could not read thinking log: {}", e),
        }
    }

    pub fn clear_thoughts(&self) -> String {
        match self.thoughts.clear() {
            Ok(()) => messages::THOUGHTS_CLEARED.to_string(),
            Err(e) => format!("❌ Could not clear thinking log: {}", e),
        }
    }

    /// Files in the workspace root with size and modification time.
    pub fn workspace_listing(&self) -> String {
        let Ok(entries) = fs::read_dir(&self.workspace) else {
            return messages::EMPTY_WORKSPACE.to_string();
        };
        let mut files: Vec<(String, u64, String)> = entries
            .filter_map(|e| e.ok())
            .filter_map(|entry| {
                let meta = entry.metadata().ok()?;
                let modified = meta
                    .modified()
                    .ok()
                    .map(|t| {
                        chrono::DateTime::<chrono::Local>::from(t)
                            .format("%Y-%m-%d %H:%M")
                            .to_string()
                    })
                    .unwrap_or_default();
                Some((entry.file_name().to_string_lossy().to_string(), meta.len(), modified))
            })
            .collect();
        if files.is_empty() {
            return messages::EMPTY_WORKSPACE.to_string();
        }
        files.sort();
        let mut lines = vec![messages::workspace_header(&self.workspace.display().to_string())];
        lines.extend(
            files
                .iter()
                .map(|(name, size, modified)| messages::workspace_entry(name, *size, modified)),
        );
        lines.join("\n")
    }

    async fn remember(&mut self, text: &str) -> String {
        if text.is_empty() {
            return messages::REMEMBER_USAGE.to_string();
        }
        match self.agent.memory_mut().remember(text, "user-remember").await {
            Ok(()) => messages::MEMORY_SAVED.to_string(),
            Err(e) => messages::memory_failed(&format!("{:#}", e)),
        }
    }

    /// Dispatches one REPL line: slash commands, memory notes, or a request for the agent.
    pub async fn handle(&mut self, line: &str) -> Reply {
        let line = line.trim();
        let lower = line.to_lowercase();
        let text = match lower.as_str() {
            "exit" | "quit" | "/quit" | "/exit" => return Reply::Exit,
            "/mode" => messages::mode_switched(self.toggle_mode().as_str()),
            "/help" => help::AGENT.to_string(),
            "/thoughts" => self.thoughts(),
            "/workspace" => self.workspace_listing(),
            "/clear" => self.clear_thoughts(),
            _ => {
                let note = ["remember ", "save "]
                    .iter()
                    .find(|prefix| lower.starts_with(*prefix))
                    .map(|prefix| line.get(prefix.len()..).unwrap_or_default().trim().to_string());
                match note {
                    Some(note) => self.remember(&note).await,
                    None if lower == "remember" || lower == "save" => messages::REMEMBER_USAGE.to_string(),
                    None => self.execute(line).await,
                }
            }
        };
        Reply::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FakeEmbedder, FakeLlm, FixedApprover};
    use tempfile::TempDir;

    async fn ade(dir: &TempDir, llm: Arc<FakeLlm>) -> AutonomousAde {
        let config = AppConfig::default().rooted(dir.path());
        AutonomousAde::new(config, llm, Some(Arc::new(FakeEmbedder)), Arc::new(FixedApprover(true)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_autonomous_execution_wraps_result() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeLlm::new(&["1. compute the sum", "Final Answer: 4"]));
        let mut ade = ade(&dir, llm.clone()).await;
        assert_eq!(ade.mode(), AgentMode::Autonomous);

        let Reply::Text(out) = ade.handle("what is 2+2").await else {
            panic!("unexpected exit");
        };
        assert!(out.starts_with("AUTONOMOUS EXECUTION COMPLETE"));
        assert!(out.contains("-- My Thinking: --\n1. compute the sum"));
        assert!(out.contains("--Result: --\n4"));
        assert!(llm.last_prompt().contains("USER REQUEST: what is 2+2"));

        let log = ade.thoughts();
        assert!(log.contains("🤔 Analyzing request: what is 2+2"));
        assert!(log.contains("💭 Thinking complete: 1. compute the sum..."));
        assert!(log.contains("♫♫ Autonomous execution completed"));
    }

    #[tokio::test]
    async fn test_standard_mode_and_failures() {
        let dir = TempDir::new().unwrap();
        let mut ade = ade(&dir, Arc::new(FakeLlm::new(&["Final Answer: hi"]))).await;
        assert_eq!(ade.handle("/mode").await, Reply::Text("🔄 Switched to standard mode".to_string()));
        assert_eq!(ade.handle("hello").await, Reply::Text("hi".to_string()));

        let mut failing = ade_failing(&dir).await;
        let Reply::Text(out) = failing.handle("hello").await else {
            panic!("unexpected exit");
        };
        assert!(out.starts_with("❌ Error during execution: LLM call failed"));
        assert!(failing.thoughts().contains("⚠️ Thinking failed: offline"));
    }

    async fn ade_failing(dir: &TempDir) -> AutonomousAde {
        ade(dir, Arc::new(FakeLlm::failing("offline"))).await
    }

    #[tokio::test]
    async fn test_commands() {
        let dir = TempDir::new().unwrap();
        let mut ade = ade(&dir, Arc::new(FakeLlm::new(&[]))).await;
        assert_eq!(ade.handle("QUIT").await, Reply::Exit);
        assert_eq!(ade.handle("/help").await, Reply::Text(help::AGENT.to_string()));

        assert_eq!(ade.handle("/clear").await, Reply::Text(messages::THOUGHTS_CLEARED.to_string()));
        assert_eq!(ade.handle("/thoughts").await, Reply::Text(messages::NO_THOUGHTS.to_string()));

        fs::write(ade.workspace().join("notes.txt"), "abc").unwrap();
        let Reply::Text(listing) = ade.handle("/workspace").await else {
            panic!("unexpected exit");
        };
        assert!(listing.contains("- notes.txt (3 bytes) - "));

        assert_eq!(ade.handle("remember the sky is blue").await, Reply::Text(messages::MEMORY_SAVED.to_string()));
        let store = ade.agent().memory().store.as_ref().unwrap();
        assert!(store.has_metadata("source", "user-remember"));
        assert_eq!(ade.handle("save").await, Reply::Text(messages::REMEMBER_USAGE.to_string()));
    }

    #[tokio::test]
    async fn test_seed_memory_loaded_once() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::default().rooted(dir.path());
        fs::create_dir_all(config.data_dir()).unwrap();
        fs::write(&config.paths.seed_memory, "ADE prefers concise answers.").unwrap();

        let first = ade(&dir, Arc::new(FakeLlm::new(&[]))).await;
        let count = first.agent().memory().store.as_ref().unwrap().len();
        assert_eq!(count, 2);
        drop(first);

        let second = ade(&dir, Arc::new(FakeLlm::new(&[]))).await;
        let store = second.agent().memory().store.as_ref().unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.has_metadata("source", "seed_memory"));
    }
}
