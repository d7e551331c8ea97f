//! # Agent REPL
//!
//! Reads requests until `exit` and prints the orchestrator's replies.

use anyhow::Result;
use std::io::Write;

use crate::application::orchestrator::{AutonomousAde, Reply};
use crate::domain::traits::Prompter;
use crate::interface::console::header;
use crate::strings::messages;

pub async fn handle_repl(ade: &mut AutonomousAde, prompter: &mut dyn Prompter, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", header(messages::BANNER))?;
    let memory = ade.agent().memory().has_long_term();
    writeln!(out, "{}", messages::ready(ade.mode().as_str(), ade.model(), memory))?;

    loop {
        let line = match prompter.ask("\n👤 You", None) {
            Ok(line) => line,
            Err(e) => {
                tracing::info!("Input ended: {:#}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match ade.handle(&line).await {
            Reply::Exit => break,
            Reply::Text(text) => writeln!(out, "\n🤖 ADE: {}", text)?,
        }
    }
    writeln!(out, "{}", messages::GOODBYE)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FakeLlm, FixedApprover, ScriptedPrompter};
    use crate::domain::config::AppConfig;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_repl_runs_until_exit() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::default().rooted(dir.path());
        let llm = Arc::new(FakeLlm::new(&["Final Answer: pong"]));
        let mut ade = AutonomousAde::new(config, llm, None, Arc::new(FixedApprover(true)))
            .await
            .unwrap();
        let mut prompter = ScriptedPrompter::new(&["/mode", "", "ping", "exit", "never read"]);
        let mut out = Vec::new();
        handle_repl(&mut ade, &mut prompter, &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("memory: conversation only"));
        assert!(out.contains("🤖 ADE: 🔄 Switched to standard mode"));
        assert!(out.contains("🤖 ADE: pong"));
        assert!(out.ends_with("👋 Goodbye!\n"));
        assert_eq!(prompter.questions.len(), 4);
    }

    #[tokio::test]
    async fn test_repl_stops_when_input_closes() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::default().rooted(dir.path());
        let mut ade = AutonomousAde::new(config, Arc::new(FakeLlm::new(&[])), None, Arc::new(FixedApprover(true)))
            .await
            .unwrap();
        let mut out = Vec::new();
        handle_repl(&mut ade, &mut ScriptedPrompter::new(&[]), &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Goodbye"));
    }
}
