//! # Diagnostics Tools
//!
//! Error handling, self diagnostics and recovery guidance exposed to the agent.

use anyhow::Result;
use async_trait::async_trait;

use super::{Tool, ToolArgs, ToolContext, clean_input};
use crate::application::recovery::{RetryPolicy, analyze_error, attempt_recovery, format_report};
use crate::application::utils::ellipsize;
use crate::domain::paths::ERROR_LOG;
use crate::strings::prompts;

pub struct IntelligentErrorHandler;

#[async_trait]
impl Tool for IntelligentErrorHandler {
    fn name(&self) -> &'static str {
        "Intelligent Error Handler"
    }

    fn description(&self) -> &'static str {
        "Analyzes an error, attempts automatic recovery and reports next steps. Input: JSON {\"tool_name\": \"...\", \"error_message\": \"...\", \"context\": \"...\", \"operation\": \"...\"} or the error message."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let args = ToolArgs::parse(input);
        let (tool, message, context) = if args.is_json() {
            (
                args.get("tool_name", 0).unwrap_or_else(|| "unknown".to_string()),
                args.get("error_message", 1).unwrap_or_default(),
                format!(
                    "{} {}",
                    args.get("context", 2).unwrap_or_default(),
                    args.get("operation", 3).unwrap_or_default()
                )
                .trim()
                .to_string(),
            )
        } else {
            ("unknown".to_string(), clean_input(input), String::new())
        };

        let log = ctx.activity_log(ERROR_LOG).level(tracing::Level::WARN);
        log.stage("ERROR_DETECTED", &format!("{}: {}", tool, ellipsize(&message, 300)));
        log.stage("ANALYZING", &tool);
        let analysis = analyze_error(ctx.llm.as_deref(), &tool, &message, &context).await;

        let attempts = if analysis.auto_recoverable {
            log.stage("AUTO_RECOVERY", &format!("{} strategies", analysis.recovery_strategies.len()));
            let policy = RetryPolicy::from_config(&ctx.config.agent);
            let url = ctx.config.permissions.network_probe_url.as_str();
            let timeout = ctx.config.permissions.network_timeout;
            // Retries check that the network path the failed tool depends on answers again
            let probe = || async move {
                match ctx.web.probe(url, timeout).await {
                    Ok(status) if status < 500 => Ok(format!("HTTP {}", status)),
                    Ok(status) => Err(format!("{} server error", status)),
                    Err(e) => Err(format!("connection failed: {:#}", e)),
                }
            };
            attempt_recovery(&analysis, &policy, probe, &log).await
        } else {
            Vec::new()
        };

        Ok(format_report(&tool, &message, &analysis, &attempts))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticCheck {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

fn health_status(percent: usize) -> &'static str {
    if percent == 100 {
        "🎉 All systems operational!"
    } else if percent >= 75 {
        "⚠️  Minor issues detected - system mostly functional"
    } else {
        "🚨 Major issues detected - system may not function properly"
    }
}

/// Runs the four scored checks. The model name is reported but not scored.
pub async fn run_checks(ctx: &ToolContext) -> Vec<DiagnosticCheck> {
    let mut checks = Vec::new();

    let key = ctx.config.api_key();
    checks.push(DiagnosticCheck {
        name: "API key",
        passed: key.is_some(),
        detail: match &key {
            Some(k) => format!("configured ({} chars)", k.len()),
            None => format!("{} not set", ctx.config.llm.api_key_env),
        },
    });

    let dirs = [
        ctx.config.data_dir(),
        ctx.config.workspace_dir(),
        ctx.config.vectorstore_dir(),
    ];
    let missing: Vec<String> = dirs
        .iter()
        .filter(|d| !d.is_dir())
        .map(|d| d.display().to_string())
        .collect();
    checks.push(DiagnosticCheck {
        name: "File system",
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            "all required directories present".to_string()
        } else {
            format!("missing: {}", missing.join(", "))
        },
    });

    let python = ctx.config.tools.python_command();
    checks.push(DiagnosticCheck {
        name: "Dependencies",
        passed: python.is_some(),
        detail: match &python {
            Some(p) => format!("python at {}", p.display()),
            None => "no python interpreter found".to_string(),
        },
    });

    let llm = match &ctx.llm {
        Some(llm) => match llm.completion("Hello", None).await {
            Ok(reply) if !reply.trim().is_empty() => (true, format!("responded: {}", ellipsize(reply.trim(), 50))),
            Ok(_) => (false, "empty response".to_string()),
            Err(e) => (false, e),
        },
        None => (false, "no model configured".to_string()),
    };
    checks.push(DiagnosticCheck {
        name: "LLM connection",
        passed: llm.0,
        detail: llm.1,
    });
    checks
}

pub fn format_diagnostics(model: &str, checks: &[DiagnosticCheck]) -> String {
    let passed = checks.iter().filter(|c| c.passed).count();
    let percent = if checks.is_empty() { 0 } else { passed * 100 / checks.len() };
    let mut out = vec!["🔍 ADE SYSTEM DIAGNOSTICS".to_string(), "=".repeat(50)];
    out.push(format!("🤖 Model: {}", model));
    out.extend(checks.iter().map(|c| {
        format!("{} {}: {}", if c.passed { "✅" } else { "❌" }, c.name, c.detail)
    }));
    out.push(String::new());
    out.push(format!(
        "📊 OVERALL HEALTH: {}% ({}/{} checks passed)",
        percent,
        passed,
        checks.len()
    ));
    out.push(health_status(percent).to_string());

    let recommendations: Vec<&str> = checks
        .iter()
        .filter(|c| !c.passed)
        .map(|c| match c.name {
            "API key" => "Set GOOGLE_API_KEY in your .env file",
            "File system" => "Restart ADE or run 'ade permissions' to recreate the workspace folders",
            "Dependencies" => "Install Python 3 and make sure it is on PATH",
            _ => "Check your internet connection and API key validity",
        })
        .collect();
    if !recommendations.is_empty() {
        out.push("\n💡 RECOMMENDATIONS:".to_string());
        out.extend(recommendations.iter().map(|r| format!("  • {}", r)));
    }
    out.join("\n")
}

pub struct SelfDiagnosticTool;

#[async_trait]
impl Tool for SelfDiagnosticTool {
    fn name(&self) -> &'static str {
        "Self Diagnostic Tool"
    }

    fn description(&self) -> &'static str {
        "Checks ADE's health: API key, model, folders, Python toolchain and LLM connectivity. Input: anything (ignored)."
    }

    async fn call(&self, _input: &str, ctx: &ToolContext) -> Result<String> {
        let checks = run_checks(ctx).await;
        let model = ctx
            .llm
            .as_ref()
            .map(|l| l.model().to_string())
            .unwrap_or_else(|| ctx.config.llm.model.clone());
        Ok(format_diagnostics(&model, &checks))
    }
}

pub struct ErrorRecoveryAssistant;

#[async_trait]
impl Tool for ErrorRecoveryAssistant {
    fn name(&self) -> &'static str {
        "Error Recovery Assistant"
    }

    fn description(&self) -> &'static str {
        "Step-by-step troubleshooting guidance for an error. Input: JSON {\"error_description\": \"...\", \"attempted_solutions\": \"...\"} or the error description."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let args = ToolArgs::parse(input);
        let error = args.get("error_description", 0).unwrap_or_else(|| clean_input(input));
        let attempted = args
            .get("attempted_solutions", 1)
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| "none".to_string());

        match ctx.ask_llm(&prompts::recovery_guidance(&error, &attempted), Some(0.3)).await {
            Some(guidance) => Ok(format!(
                "🤖 AI ERROR RECOVERY SPECIALIST\n{}\n\n❗ Error: {}\n\n{}",
                "=".repeat(50),
                error,
                guidance.trim()
            )),
            None => Ok(format!(
                "❌ AI Recovery Assistant unavailable.\n\n🔧 BASIC TROUBLESHOOTING:\n{}",
                [
                    "1. Check your internet connection",
                    "2. Verify GOOGLE_API_KEY in your .env file",
                    "3. Restart ADE",
                    "4. Check the error log (error_log.txt) in the agent workspace",
                    "5. Run the Self Diagnostic Tool",
                ]
                .join("\n")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::FakeLlm;
    use crate::application::tools::test_support;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_health_thresholds() {
        let check = |passed| DiagnosticCheck { name: "x", passed, detail: String::new() };
        let all = format_diagnostics("m", &[check(true), check(true), check(true), check(true)]);
        assert!(all.contains("📊 OVERALL HEALTH: 100% (4/4 checks passed)"));
        assert!(all.contains("🎉 All systems operational!"));
        assert!(!all.contains("RECOMMENDATIONS"));

        let minor = format_diagnostics("m", &[check(true), check(true), check(true), check(false)]);
        assert!(minor.contains("75% (3/4"));
        assert!(minor.contains("Minor issues"));

        let major = format_diagnostics("m", &[check(true), check(false), check(false), check(false)]);
        assert!(major.contains("25% (1/4"));
        assert!(major.contains("Major issues"));
    }

    #[tokio::test]
    async fn test_self_diagnostic_with_fake_model() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeLlm::new(&["Hi there"]));
        let ctx = test_support::context(dir.path(), Some(llm), true);
        fs::create_dir_all(ctx.config.workspace_dir()).unwrap();
        fs::create_dir_all(ctx.config.vectorstore_dir()).unwrap();

        let checks = run_checks(&ctx).await;
        assert_eq!(checks.len(), 4);
        assert!(checks[1].passed, "{:?}", checks[1]);
        assert!(checks[3].passed);
        assert_eq!(checks[3].detail, "responded: Hi there");

        let out = SelfDiagnosticTool.call("", &ctx).await.unwrap();
        assert!(out.starts_with("🔍 ADE SYSTEM DIAGNOSTICS"));
        assert!(out.contains("🤖 Model: fake-model"));
    }

    #[tokio::test]
    async fn test_error_handler_without_model() {
        let dir = TempDir::new().unwrap();
        let ctx = test_support::context(dir.path(), None, true);
        let input = r#"{"tool_name": "File Write", "error_message": "Permission denied: /etc/x", "context": "writing config"}"#;
        let out = IntelligentErrorHandler.call(input, &ctx).await.unwrap();
        assert!(out.contains("Tool: File Write"));
        assert!(out.contains("Category: file_system"));
        assert!(!out.contains("RECOVERY ATTEMPTS"));

        let log = ctx.activity_log(ERROR_LOG).read().unwrap();
        assert!(log.contains("ERROR_DETECTED: File Write: Permission denied"));
        assert!(log.contains("ANALYZING: File Write"));
    }

    #[tokio::test]
    async fn test_error_handler_degrades_gracefully() {
        let dir = TempDir::new().unwrap();
        let reply = r#"{"error_category": "logic", "severity": "low", "auto_recoverable": true,
            "recovery_strategies": [{"strategy": "graceful_degradation", "description": "skip"}]}"#;
        let llm = Arc::new(FakeLlm::new(&[reply]));
        let ctx = test_support::context(dir.path(), Some(llm), true);
        let out = IntelligentErrorHandler.call("list index out of range", &ctx).await.unwrap();
        assert!(out.contains("🤖 AI ANALYSIS:"));
        assert!(out.contains("✅ graceful_degradation: Continuing with reduced functionality"));
    }

    #[tokio::test]
    async fn test_recovery_assistant() {
        let dir = TempDir::new().unwrap();
        let ctx = test_support::context(dir.path(), None, true);
        let out = ErrorRecoveryAssistant.call("pip fails", &ctx).await.unwrap();
        assert!(out.starts_with("❌ AI Recovery Assistant unavailable."));
        assert!(out.contains("5. Run the Self Diagnostic Tool"));

        let llm = Arc::new(FakeLlm::new(&["Upgrade pip first."]));
        let ctx = test_support::context(dir.path(), Some(llm.clone()), true);
        let out = ErrorRecoveryAssistant
            .call(r#"{"error_description": "pip fails", "attempted_solutions": "reinstall"}"#, &ctx)
            .await
            .unwrap();
        assert!(out.starts_with("🤖 AI ERROR RECOVERY SPECIALIST"));
        assert!(out.ends_with("Upgrade pip first."));
        assert!(llm.last_prompt().contains("ATTEMPTED SOLUTIONS: reinstall"));
    }
}
