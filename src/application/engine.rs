//! # Execution Engine
//!
//! The ReAct loop: ask the model, run the tool it picks, feed the observation back, and stop
//! on a final answer or when the iteration budget runs out.

use anyhow::{Result, anyhow};
use std::sync::Arc;

use crate::application::logging::ActivityLog;
use crate::application::memory::AgentMemory;
use crate::application::parsing::{format_reminder, parse_step};
use crate::application::tools::ToolRegistry;
use crate::application::utils::ellipsize;
use crate::domain::config::AppConfig;
use crate::domain::traits::LlmProvider;
use crate::domain::types::AgentStep;
use crate::strings::prompts;

const STOPPED: &str = "Agent stopped due to iteration limit or time limit.";

pub struct Agent {
    llm: Arc<dyn LlmProvider>,
    registry: ToolRegistry,
    memory: AgentMemory,
    max_iterations: usize,
    temperature: f32,
    thoughts: Option<ActivityLog>,
}

impl Agent {
    pub fn new(config: &AppConfig, llm: Arc<dyn LlmProvider>, registry: ToolRegistry, memory: AgentMemory) -> Self {
        Self {
            llm,
            registry,
            memory,
            max_iterations: config.agent.max_iterations.max(1),
            temperature: config.llm.temperature,
            thoughts: None,
        }
    }

    /// Mirrors tool calls and observations into the thinking log
    pub fn with_thought_log(mut self, log: ActivityLog) -> Self {
        self.thoughts = Some(log);
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn memory(&self) -> &AgentMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut AgentMemory {
        &mut self.memory
    }

    fn note(&self, entry: &str) {
        if let Some(log) = &self.thoughts {
            log.log(entry);
        }
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        self.llm
            .completion(prompt, Some(self.temperature))
            .await
            .map_err(|e| anyhow!("LLM call failed: {}", e))
    }

    /// Runs one request through the loop and records the turn in the conversation buffer.
    pub async fn run(&mut self, input: &str) -> Result<String> {
        let memories = self.memory.relevant(input).await;
        let memories = if memories.is_empty() {
            "(none)".to_string()
        } else {
            memories.iter().map(|m| format!("- {}", m)).collect::<Vec<_>>().join("\n")
        };
        let history = self.memory.buffer.render();
        let tools = self.registry.describe();
        let tool_names = self.registry.names().join(", ");

        let mut scratchpad = String::new();
        let mut answer = None;
        for iteration in 1..=self.max_iterations {
            let prompt = prompts::react_turn(&tools, &tool_names, &memories, &history, input, &scratchpad);
            let reply = self.ask(&prompt).await?;
            tracing::debug!("Iteration {} reply: {}", iteration, ellipsize(&reply, 300));

            match parse_step(&reply) {
                AgentStep::Final(text) => {
                    answer = Some(text);
                    break;
                }
                AgentStep::Action { tool, input: tool_input } => {
                    self.note(&format!("🔧 Using tool: {} | Input: {}", tool, ellipsize(&tool_input, 200)));
                    let observation = self.registry.invoke(&tool, &tool_input).await;
                    self.note(&format!("👁️ Observation: {}", ellipsize(&observation, 200)));
                    scratchpad.push_str(&format!(
                        "Thought: Do I need to use a tool? Yes\nAction: {}\nAction Input: {}\nObservation: {}\n",
                        tool, tool_input, observation
                    ));
                }
                AgentStep::Unparsed(text) => {
                    let reminder = format_reminder(&text);
                    scratchpad.push_str(&format!("{}\nObservation: {}\n", text.trim(), reminder));
                }
            }
        }

        let answer = match answer {
            Some(answer) => answer,
            None => {
                tracing::info!("Iteration limit of {} reached, asking for a final answer", self.max_iterations);
                let prompt = prompts::react_turn(&tools, &tool_names, &memories, &history, input, &scratchpad);
                let reply = self.ask(&prompts::final_answer(&prompt)).await?;
                match parse_step(&reply) {
                    AgentStep::Final(text) => text,
                    _ => STOPPED.to_string(),
                }
            }
        };

        self.memory.buffer.push(input, answer.clone());
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::FakeLlm;
    use crate::application::tools::test_support;
    use tempfile::TempDir;

    fn build_agent(dir: &TempDir, llm: Arc<FakeLlm>) -> Agent {
        let ctx = test_support::context(dir.path(), None, true);
        let config = ctx.config.clone();
        Agent::new(&config, llm, ToolRegistry::new(ctx), AgentMemory::new(None, 4))
    }

    #[tokio::test]
    async fn test_action_then_final_answer() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeLlm::new(&[
            "Thought: Do I need to use a tool? Yes\nAction: Calculator\nAction Input: 6*7",
            "Thought: Do I need to use a tool? No\nFinal Answer: The answer is 42.",
        ]));
        let mut agent = build_agent(&dir, llm.clone());
        let answer = agent.run("what is 6 times 7?").await.unwrap();
        assert_eq!(answer, "The answer is 42.");
        assert_eq!(llm.prompt_count(), 2);
        assert!(llm.last_prompt().contains("Action Input: 6*7\nObservation: 42"));
        assert_eq!(agent.memory().buffer.render(), "Human: what is 6 times 7?\nAI: The answer is 42.");
    }

    #[tokio::test]
    async fn test_unparsed_reply_gets_reminder() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeLlm::new(&["Action: Calculator", "Final Answer: ok"]));
        let mut agent = build_agent(&dir, llm.clone());
        assert_eq!(agent.run("hi").await.unwrap(), "ok");
        assert!(llm.last_prompt().contains("Invalid Format"));
    }

    #[tokio::test]
    async fn test_early_stopping_generates_final_answer() {
        let dir = TempDir::new().unwrap();
        let step = "Action: Calculator\nAction Input: 1+1";
        let llm = Arc::new(FakeLlm::new(&[step, step, step, "Final Answer: two"]));
        let mut agent = build_agent(&dir, llm.clone());
        assert_eq!(agent.run("loop").await.unwrap(), "two");
        assert_eq!(llm.prompt_count(), 4);
        assert!(llm.last_prompt().contains("You have used all available steps"));

        let llm = Arc::new(FakeLlm::new(&[step, step, step, step]));
        let mut agent = build_agent(&dir, llm);
        assert_eq!(agent.run("loop").await.unwrap(), STOPPED);
    }

    #[tokio::test]
    async fn test_history_and_thought_log() {
        let dir = TempDir::new().unwrap();
        let log = ActivityLog::new(dir.path().join("thinking_log.txt"));
        let llm = Arc::new(FakeLlm::new(&[
            "Final Answer: first",
            "Action: Calculator\nAction Input: 2+2",
            "Final Answer: second",
        ]));
        let mut agent = build_agent(&dir, llm.clone()).with_thought_log(log.clone());
        agent.run("one").await.unwrap();
        agent.run("two").await.unwrap();
        assert!(llm.last_prompt().contains("Human: one\nAI: first"));
        assert!(log.read().unwrap().contains("🔧 Using tool: Calculator | Input: 2+2"));
    }

    #[tokio::test]
    async fn test_llm_failure_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut agent = build_agent(&dir, Arc::new(FakeLlm::failing("quota exceeded")));
        let err = agent.run("hi").await.unwrap_err();
        assert_eq!(err.to_string(), "LLM call failed: quota exceeded");
        assert!(agent.memory().buffer.is_empty());
    }
}
