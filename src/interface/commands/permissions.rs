//! # Permission Console
//!
//! Interactive `ade permissions` session plus the startup gate used by `ade run`.

use anyhow::{Result, bail};
use std::io::Write;
use std::time::Duration;

use crate::application::permissions::{LaunchOutcome, PermissionManager, PermissionReporter};
use crate::domain::traits::Prompter;
use crate::interface::console::{ConsoleReporter, err_line, header, ok_line, status_report, warn_line};
use crate::strings::{help, messages};

const API_KEY_CHECK: &str = "api_keys_set";

/// Runs the console until `exit`. The first `check` happens on start.
pub async fn handle_console(
    manager: &mut PermissionManager,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
    pause: Duration,
) -> Result<()> {
    writeln!(out, "{}", header("🔐 ADE Permission Manager"))?;
    handle_check(manager, out).await?;

    loop {
        let command = prompter.ask("Enter command", Some("status"))?;
        let command = command.trim().to_lowercase();
        match command.as_str() {
            "exit" | "quit" | "q" => break,
            "check" => handle_check(manager, out).await?,
            "status" => writeln!(out, "{}", status_report(manager))?,
            "fix" => {
                let mut reporter = ConsoleReporter::new(&mut *out);
                let report = manager.auto_fix(prompter, &mut reporter, pause).await;
                writeln!(out, "{}", report.summary())?;
            }
            "config" => {
                let outcome = manager.fix(API_KEY_CHECK, prompter).await?;
                tracing::info!("API key configuration: {:?}", outcome);
                let mut reporter = ConsoleReporter::new(&mut *out);
                if let Some(record) = manager.record(API_KEY_CHECK) {
                    reporter.fixed(record, &outcome);
                }
            }
            "launch" => handle_launch(manager, prompter, out).await?,
            "info" => {
                writeln!(out, "{}", header("💻 System Information"))?;
                for (label, value) in manager.system_info() {
                    writeln!(out, "  {}: {}", label, value)?;
                }
            }
            "help" => writeln!(out, "{}", help::PERMISSIONS)?,
            _ => {
                writeln!(
                    out,
                    "{}",
                    warn_line(&format!("Unknown command. Valid options: {}", help::PERMISSION_COMMANDS.join(", ")))
                )?;
                continue;
            }
        }
        prompter.ask("Press Enter to continue", Some(""))?;
    }
    Ok(())
}

async fn handle_check(manager: &mut PermissionManager, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", messages::CHECKING_PERMISSIONS)?;
    let mut reporter = ConsoleReporter::new(&mut *out);
    manager.check_all(&mut reporter).await;
    writeln!(out, "{}", status_report(manager))?;
    Ok(())
}

async fn handle_launch(manager: &mut PermissionManager, prompter: &mut dyn Prompter, out: &mut dyn Write) -> Result<()> {
    let line = match manager.launch(prompter).await? {
        LaunchOutcome::Blocked(n) => err_line(&format!("Cannot launch: {} critical issues must be resolved", n)),
        LaunchOutcome::Declined => warn_line("Launch cancelled"),
        LaunchOutcome::Launched(pid) => ok_line(&format!("ADE launched (pid {})", pid)),
    };
    writeln!(out, "{}", line)?;
    Ok(())
}

/// Startup gate for `ade run`: fails when critical issues remain.
pub async fn handle_gate(manager: &mut PermissionManager, prompter: &mut dyn Prompter, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", messages::CHECKING_PERMISSIONS)?;
    let passed = {
        let mut reporter = ConsoleReporter::new(&mut *out);
        manager.gate(prompter, &mut reporter).await?
    };
    writeln!(out, "{}", status_report(manager))?;
    if !passed {
        bail!(messages::GATE_BLOCKED);
    }
    writeln!(out, "{}", messages::GATE_PASSED)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::permissions::{CheckContext, FixOutcome, PermissionCheck};
    use crate::application::testing::ScriptedPrompter;
    use crate::domain::config::AppConfig;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    struct Toggle {
        key: &'static str,
        critical: bool,
        state: Arc<AtomicBool>,
    }

    #[async_trait]
    impl PermissionCheck for Toggle {
        fn key(&self) -> &'static str {
            self.key
        }
        fn description(&self) -> &'static str {
            self.key
        }
        fn critical(&self) -> bool {
            self.critical
        }
        async fn check(&self, _ctx: &CheckContext) -> bool {
            self.state.load(Ordering::SeqCst)
        }
        async fn fix(&self, _ctx: &CheckContext, _prompter: &mut dyn Prompter) -> FixOutcome {
            self.state.store(true, Ordering::SeqCst);
            FixOutcome::Fixed
        }
    }

    fn manager(dir: &TempDir, critical_ok: bool) -> PermissionManager {
        let checks: Vec<Box<dyn PermissionCheck>> = vec![
            Box::new(Toggle {
                key: "file_access",
                critical: true,
                state: Arc::new(AtomicBool::new(critical_ok)),
            }),
            Box::new(Toggle {
                key: "workspace_created",
                critical: false,
                state: Arc::new(AtomicBool::new(false)),
            }),
        ];
        PermissionManager::with_checks(CheckContext::new(AppConfig::default(), dir.path()), checks)
    }

    #[tokio::test]
    async fn test_console_checks_on_start_and_fixes() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir, false);
        let mut prompter = ScriptedPrompter::new(&["bogus", "fix", "", "status", "", "exit"]);
        let mut out = Vec::new();
        handle_console(&mut m, &mut prompter, &mut out, Duration::ZERO).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Checking file_access..."));
        assert!(out.contains("1 critical issues must be resolved"));
        assert!(out.contains("Unknown command. Valid options: check, status"));
        assert!(out.contains("All 2 issues fixed"));
        assert!(out.contains("All systems ready"));
        assert_eq!(prompter.questions.iter().filter(|q| *q == "Press Enter to continue").count(), 2);
    }

    #[tokio::test]
    async fn test_gate_blocks_when_declined() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir, false);
        let mut prompter = ScriptedPrompter::new(&["n"]);
        let mut out = Vec::new();
        let err = handle_gate(&mut m, &mut prompter, &mut out).await.unwrap_err();
        assert_eq!(err.to_string(), messages::GATE_BLOCKED);

        let mut m = manager(&dir, false);
        let mut prompter = ScriptedPrompter::new(&["y"]);
        handle_gate(&mut m, &mut prompter, &mut Vec::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_launch_refused_with_critical_issues() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir, false);
        let mut prompter = ScriptedPrompter::new(&["launch", "", "exit"]);
        let mut out = Vec::new();
        handle_console(&mut m, &mut prompter, &mut out, Duration::ZERO).await.unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Cannot launch: 1 critical issues must be resolved"));
    }
}
