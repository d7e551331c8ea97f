//! # Error Recovery
//!
//! Error classification (model-backed with a keyword fallback), retry with exponential
//! backoff, strategy execution and the handler report.
//!
//! - `ErrorAnalysis`: what went wrong and which strategies might fix it
//! - `RetryPolicy`: backoff loop for retryable async operations
//! - `attempt_recovery`: runs strategies in order until one succeeds

use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::application::logging::ActivityLog;
use crate::application::utils::{contains_any, extract_json};
use crate::domain::config::AgentConfig;
use crate::domain::traits::LlmProvider;
use crate::strings::prompts;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecoveryStrategy {
    pub strategy: String,
    pub description: String,
    pub steps: Vec<String>,
    pub success_probability: String,
}

impl RecoveryStrategy {
    fn new(strategy: &str, description: &str, steps: &[&str], probability: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            description: description.to_string(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
            success_probability: probability.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ErrorAnalysis {
    #[serde(alias = "error_category")]
    pub category: String,
    pub severity: String,
    pub root_cause: String,
    pub immediate_impact: String,
    pub recovery_strategies: Vec<RecoveryStrategy>,
    pub prevention_tips: Vec<String>,
    pub requires_user_action: bool,
    pub user_actions_needed: Vec<String>,
    pub auto_recoverable: bool,
    #[serde(skip)]
    pub ai_analysis: bool,
    #[serde(skip)]
    pub fallback_used: bool,
}

impl ErrorAnalysis {
    /// Keyword classification. Never auto-recoverable.
    pub fn fallback(message: &str) -> Self {
        let (category, severity, cause, strategy) = if contains_any(message, &["network", "connection", "timeout"]) {
            (
                "network",
                "medium",
                "Network connectivity issue",
                RecoveryStrategy::new(
                    "retry_with_backoff",
                    "Retry the operation with increasing delays",
                    &["Wait a few seconds", "Retry the request", "Check the internet connection"],
                    "medium",
                ),
            )
        } else if contains_any(message, &["file", "directory", "permission"]) {
            (
                "file_system",
                "medium",
                "File system access problem",
                RecoveryStrategy::new(
                    "check_permissions",
                    "Verify the path exists and is writable",
                    &["Check the path", "Check file permissions"],
                    "medium",
                ),
            )
        } else if contains_any(message, &["api", "key", "unauthorized"]) {
            (
                "api",
                "high",
                "API authentication or configuration problem",
                RecoveryStrategy::new(
                    "check_config",
                    "Verify the API key and model configuration",
                    &["Check GOOGLE_API_KEY in .env", "Restart ADE"],
                    "high",
                ),
            )
        } else {
            (
                "logic",
                "medium",
                "Unexpected error in tool logic",
                RecoveryStrategy::new(
                    "graceful_degradation",
                    "Continue with reduced functionality",
                    &["Use an alternative tool", "Simplify the request"],
                    "medium",
                ),
            )
        };
        Self {
            category: category.to_string(),
            severity: severity.to_string(),
            root_cause: cause.to_string(),
            immediate_impact: "The requested operation could not be completed".to_string(),
            recovery_strategies: vec![strategy],
            prevention_tips: vec!["Check the error log for recurring problems".to_string()],
            requires_user_action: true,
            user_actions_needed: vec!["Review the error details".to_string()],
            auto_recoverable: false,
            ai_analysis: false,
            fallback_used: true,
        }
    }
}

/// Model analysis when available, keyword rules otherwise.
pub async fn analyze_error(llm: Option<&dyn LlmProvider>, tool: &str, message: &str, context: &str) -> ErrorAnalysis {
    let Some(llm) = llm else {
        return ErrorAnalysis::fallback(message);
    };
    match llm.completion(&prompts::error_analysis(tool, message, context), Some(0.1)).await {
        Ok(reply) => match extract_json(&reply).and_then(|v| serde_json::from_value::<ErrorAnalysis>(v).ok()) {
            Some(mut analysis) => {
                analysis.ai_analysis = true;
                analysis
            }
            None => ErrorAnalysis::fallback(message),
        },
        Err(e) => {
            tracing::warn!("Error analysis call failed: {}", e);
            ErrorAnalysis::fallback(message)
        }
    }
}

/// Exponential backoff retry for async operations
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_retries: usize) -> Self {
        Self {
            max_retries: max_retries.max(1),
            base_delay,
            max_delay: Duration::from_secs(60),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(Duration::from_millis(config.retry_base_delay_ms), config.retry_attempts)
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// `base * 2^(attempt-1)`, `4^` for rate limits, capped.
    pub fn calculate_delay(&self, attempt: usize, error: &str) -> Duration {
        let multiplier: u32 = if is_rate_limit(error) { 4 } else { 2 };
        let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        let factor = multiplier.checked_pow(exponent).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub async fn execute_with_retry<F, Fut, T>(&self, operation: F) -> Result<T, String>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        let mut last_error = String::new();
        for attempt in 1..=self.max_retries {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("Operation succeeded on attempt {}", attempt);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !is_retryable_error(&error) {
                        return Err(error);
                    }
                    let delay = self.calculate_delay(attempt, &error);
                    tracing::warn!(
                        "Operation failed (attempt {}/{}): {}",
                        attempt,
                        self.max_retries,
                        error
                    );
                    last_error = error;
                    if attempt < self.max_retries {
                        sleep(delay).await;
                    }
                }
            }
        }
        Err(format!("Failed after {} attempts: {}", self.max_retries, last_error))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

fn is_rate_limit(error: &str) -> bool {
    contains_any(error, &["429", "too many requests", "rate limit", "quota"])
}

/// Network trouble, rate limits and 5xx responses are worth retrying.
pub fn is_retryable_error(error: &str) -> bool {
    contains_any(error, &["network", "connection", "timeout", "timed out"])
        || is_rate_limit(error)
        || contains_any(
            error,
            &["500", "502", "503", "internal server error", "service unavailable"],
        )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryAttempt {
    pub strategy: String,
    pub success: bool,
    pub message: String,
}

/// Runs the strategies in order and stops at the first success.
pub async fn attempt_recovery<F, Fut>(
    analysis: &ErrorAnalysis,
    policy: &RetryPolicy,
    operation: F,
    log: &ActivityLog,
) -> Vec<RecoveryAttempt>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<String, String>>,
{
    let mut attempts = Vec::new();
    for strategy in &analysis.recovery_strategies {
        log.stage("RECOVERY_ATTEMPT", &strategy.strategy);
        let (success, message) = match strategy.strategy.as_str() {
            "retry_with_backoff" => match policy.execute_with_retry(&operation).await {
                Ok(output) => (true, format!("Retry succeeded: {}", output)),
                Err(e) => (false, e),
            },
            "fallback_method" => (true, "Switched to an alternative method".to_string()),
            "graceful_degradation" => (true, "Continuing with reduced functionality".to_string()),
            other => (false, format!("No automatic handler for strategy '{}'", other)),
        };
        log.stage(
            if success { "RECOVERY_SUCCESS" } else { "RECOVERY_FAILED" },
            &format!("{}: {}", strategy.strategy, message),
        );
        attempts.push(RecoveryAttempt {
            strategy: strategy.strategy.clone(),
            success,
            message,
        });
        if success {
            break;
        }
    }
    attempts
}

fn push_list(out: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push(format!("\n{}", title));
    out.extend(items.iter().enumerate().map(|(i, item)| format!("  {}. {}", i + 1, item)));
}

pub fn format_report(
    tool: &str,
    message: &str,
    analysis: &ErrorAnalysis,
    attempts: &[RecoveryAttempt],
) -> String {
    let mut out = vec![
        "🚨 INTELLIGENT ERROR HANDLER REPORT".to_string(),
        "=".repeat(70),
        "\n📋 ERROR DETAILS:".to_string(),
        format!("  Tool: {}", tool),
        format!("  Message: {}", message),
        format!(
            "\n{}",
            if analysis.ai_analysis { "🤖 AI ANALYSIS:" } else { "🔍 BASIC ANALYSIS:" }
        ),
        format!("  Category: {}", analysis.category),
        format!("  Severity: {}", analysis.severity),
        format!("  Root cause: {}", analysis.root_cause),
        format!("  Impact: {}", analysis.immediate_impact),
        format!("  Auto-recoverable: {}", if analysis.auto_recoverable { "yes" } else { "no" }),
    ];

    if !attempts.is_empty() {
        out.push("\n🔧 RECOVERY ATTEMPTS:".to_string());
        out.extend(attempts.iter().map(|a| {
            format!("  {} {}: {}", if a.success { "✅" } else { "❌" }, a.strategy, a.message)
        }));
    }
    if analysis.requires_user_action {
        push_list(&mut out, "👤 USER ACTION REQUIRED:", &analysis.user_actions_needed);
    }
    push_list(&mut out, "🛡️  PREVENTION TIPS:", &analysis.prevention_tips);

    if !analysis.recovery_strategies.is_empty() {
        out.push("\n📋 AVAILABLE RECOVERY STRATEGIES:".to_string());
        for s in &analysis.recovery_strategies {
            out.push(format!("  • {} ({}): {}", s.strategy, s.success_probability, s.description));
            out.extend(s.steps.iter().map(|step| format!("      - {}", step)));
        }
    }

    let recovered = attempts.iter().any(|a| a.success);
    out.push("\n➡️  RECOMMENDED NEXT STEPS:".to_string());
    if recovered {
        out.push("  1. Retry the original request".to_string());
        out.push("  2. Monitor for recurring errors".to_string());
    } else {
        out.push("  1. Follow the user actions above".to_string());
        out.push("  2. Run the Self Diagnostic Tool".to_string());
        out.push("  3. Try an alternative tool or approach".to_string());
    }
    out.join("\n")
}
