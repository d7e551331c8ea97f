//! # Agent Tools
//!
//! The tool trait, the context handed to every call, and the single ordered registry the
//! agent selects from. Tool failures are turned into readable strings so the agent loop
//! never stops on them.

pub mod analyzer;
pub mod calculator;
pub mod diagnostics;
pub mod files;
pub mod project;
pub mod python;
pub mod scraper;
pub mod search;
pub mod universal;
pub mod writer;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::logging::ActivityLog;
use crate::domain::config::AppConfig;
use crate::domain::traits::{Approver, LlmProvider};
use crate::infrastructure::tools::ToolExecutor;
use crate::infrastructure::web::WebClient;

/// A function exposed to the agent by name
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String>;
}

/// Shared resources for tool calls
pub struct ToolContext {
    pub config: AppConfig,
    pub llm: Option<Arc<dyn LlmProvider>>,
    /// Output root for generated projects and files
    pub workspace: PathBuf,
    /// Base for relative paths given to the file tools
    pub cwd: PathBuf,
    pub approver: Arc<dyn Approver>,
    pub web: WebClient,
    pub executor: ToolExecutor,
}

impl ToolContext {
    pub fn new(
        config: AppConfig,
        llm: Option<Arc<dyn LlmProvider>>,
        approver: Arc<dyn Approver>,
        cwd: PathBuf,
    ) -> Self {
        let web = WebClient::new(&config.web);
        let executor = ToolExecutor::new(config.tools.python_timeout);
        Self {
            workspace: config.workspace_dir(),
            config,
            llm,
            cwd,
            approver,
            web,
            executor,
        }
    }

    /// Activity log stored in the workspace
    pub fn activity_log(&self, file_name: &str) -> ActivityLog {
        ActivityLog::new(self.workspace.join(file_name))
    }

    /// Asks the model, returning `None` when no model is configured or the call fails.
    pub async fn ask_llm(&self, prompt: &str, temperature: Option<f32>) -> Option<String> {
        let llm = self.llm.as_ref()?;
        match llm.completion(prompt, temperature).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::warn!("LLM call failed: {}", e);
                None
            }
        }
    }
}

/// Parsed `Action Input`: a JSON object, a `|`-separated list, or a plain string.
#[derive(Debug, Clone)]
pub struct ToolArgs {
    raw: String,
    fields: Option<serde_json::Map<String, Value>>,
    parts: Vec<String>,
}

impl ToolArgs {
    pub fn parse(input: &str) -> Self {
        let raw = clean_input(input);
        let fields = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        };
        let parts = raw.split('|').map(clean_input).collect();
        Self { raw, fields, parts }
    }

    /// The whole input with surrounding quotes removed
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_json(&self) -> bool {
        self.fields.is_some()
    }

    /// Named JSON field, or the `position`-th `|` segment for plain input.
    pub fn get(&self, key: &str, position: usize) -> Option<String> {
        match &self.fields {
            Some(map) => map.get(key).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            None => self.parts.get(position).filter(|p| !p.is_empty()).cloned(),
        }
    }

    /// Like `get` but for the last argument: plain input keeps any further `|` characters.
    pub fn rest(&self, key: &str, position: usize) -> Option<String> {
        if self.fields.is_some() {
            return self.get(key, position);
        }
        if self.parts.len() <= position {
            return None;
        }
        let joined = self.raw.splitn(position + 1, '|').nth(position)?;
        Some(joined.trim_start().to_string())
    }
}

/// Trims whitespace and one layer of matching quotes or backticks.
pub fn clean_input(input: &str) -> String {
    let trimmed = input.trim();
    for quote in ['"', '\'', '`'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Ordered tool collection with case-insensitive lookup
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    ctx: ToolContext,
}

impl ToolRegistry {
    pub fn new(ctx: ToolContext) -> Self {
        Self::with_tools(ctx, default_tools())
    }

    pub fn with_tools(ctx: ToolContext, tools: Vec<Box<dyn Tool>>) -> Self {
        Self { tools, ctx }
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        let name = clean_input(name);
        self.tools
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(&name))
            .map(|t| t.as_ref())
    }

    /// `Name: description` lines for the agent prompt
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Runs a tool. Unknown tools and failures come back as messages.
    pub async fn invoke(&self, name: &str, input: &str) -> String {
        let Some(tool) = self.get(name) else {
            return format!(
                "❌ Unknown tool '{}'. Available tools: {}",
                name.trim(),
                self.names().join(", ")
            );
        };
        tracing::info!("Invoking tool {} with input: {}", tool.name(), crate::application::utils::ellipsize(input, 200));
        match tool.call(input, &self.ctx).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Tool {} failed: {:#}", tool.name(), e);
                format!("❌ {} failed: {:#}", tool.name(), e)
            }
        }
    }
}

/// Every tool, in registration order
pub fn default_tools() -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(calculator::Calculator),
        Box::new(python::PythonRepl),
        Box::new(files::FileWrite),
        Box::new(files::FileRead),
        Box::new(files::CreateDirectory),
        Box::new(search::WebSearch),
        Box::new(search::LangChainSearch),
        Box::new(search::WebPageContent),
        Box::new(scraper::SmartWebScraper),
        Box::new(scraper::TargetedWebScraper),
        Box::new(universal::UniversalWebScraper),
        Box::new(universal::RealTimeWeather),
        Box::new(project::AdvancedProjectCreator),
        Box::new(analyzer::IntelligentFileAnalyzer),
        Box::new(analyzer::QuickFileSummary),
        Box::new(writer::AutonomousFileWriter),
        Box::new(writer::AutonomousCodeGenerator),
        Box::new(writer::AutonomousDocumentationWriter),
        Box::new(writer::ThinkingFileWriter),
        Box::new(diagnostics::IntelligentErrorHandler),
        Box::new(diagnostics::SelfDiagnosticTool),
        Box::new(diagnostics::ErrorRecoveryAssistant),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::application::testing::{FakeLlm, FixedApprover};
    use std::path::Path;

    /// Context rooted in `dir`, with every path and the workspace inside it.
    pub fn context(dir: &Path, llm: Option<Arc<FakeLlm>>, approve: bool) -> ToolContext {
        let config = AppConfig::default().rooted(dir);
        let llm = llm.map(|l| l as Arc<dyn LlmProvider>);
        ToolContext::new(config, llm, Arc::new(FixedApprover(approve)), dir.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_registry_order_and_names() {
        let names: Vec<&str> = default_tools().iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), 22);
        assert_eq!(names[0], "Calculator");
        assert_eq!(names[5], "Web Search");
        assert_eq!(names[11], "Real Time Weather");
        assert_eq!(names[21], "Error Recovery Assistant");
    }

    #[tokio::test]
    async fn test_invoke_is_case_insensitive_and_never_fails() {
        let dir = TempDir::new().unwrap();
        let registry = ToolRegistry::new(test_support::context(dir.path(), None, true));
        assert_eq!(registry.invoke("calculator", "2*(3+4)").await, "14");
        assert_eq!(registry.invoke(" `Calculator` ", "1/0").await, "Calc error: division by zero");

        let unknown = registry.invoke("Teleporter", "x").await;
        assert!(unknown.starts_with("❌ Unknown tool 'Teleporter'"));
        assert!(unknown.contains("Calculator"));
    }

    #[tokio::test]
    async fn test_tool_errors_become_messages() {
        struct Broken;

        #[async_trait]
        impl Tool for Broken {
            fn name(&self) -> &'static str {
                "Broken"
            }
            fn description(&self) -> &'static str {
                "always fails"
            }
            async fn call(&self, _input: &str, _ctx: &ToolContext) -> Result<String> {
                anyhow::bail!("boom")
            }
        }

        let dir = TempDir::new().unwrap();
        let registry =
            ToolRegistry::with_tools(test_support::context(dir.path(), None, true), vec![Box::new(Broken)]);
        assert_eq!(registry.invoke("Broken", "").await, "❌ Broken failed: boom");
        assert_eq!(registry.describe(), "Broken: always fails");
    }

    #[test]
    fn test_tool_args_forms() {
        let json = ToolArgs::parse(r#"{"filepath": "a.txt", "content": "x|y", "n": 3}"#);
        assert!(json.is_json());
        assert_eq!(json.get("filepath", 0).as_deref(), Some("a.txt"));
        assert_eq!(json.rest("content", 1).as_deref(), Some("x|y"));
        assert_eq!(json.get("n", 2).as_deref(), Some("3"));

        let piped = ToolArgs::parse("'notes/a.txt | hello | world'");
        assert_eq!(piped.get("filepath", 0).as_deref(), Some("notes/a.txt"));
        assert_eq!(piped.rest("content", 1).as_deref(), Some("hello | world"));
        assert_eq!(piped.get("missing", 5), None);

        let plain = ToolArgs::parse("  \"just text\" ");
        assert_eq!(plain.raw(), "just text");
    }
}
