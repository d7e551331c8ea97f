//! # Permission Manager
//!
//! Runs the ordered table of OS and environment probes, keeps the pass/fail record for each,
//! and dispatches the optional fixes. Rendering is left to a `PermissionReporter`.

pub mod checks;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::config::AppConfig;
use crate::domain::traits::Prompter;
use crate::domain::types::PermissionRecord;
use crate::infrastructure::tools::ToolExecutor;
use crate::infrastructure::web::WebClient;

const PROBE_TIMEOUT_SECS: u64 = 15;
const INSTALL_TIMEOUT_SECS: u64 = 600;

/// Result of a fix attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    Fixed,
    Failed(String),
    /// Steps the user has to perform by hand
    Manual(Vec<String>),
    Unavailable,
    /// The user declined to provide input
    Skipped,
}

/// Everything a probe may touch: configuration, the working root, and process/HTTP access.
pub struct CheckContext {
    pub config: AppConfig,
    pub root: PathBuf,
    pub executor: ToolExecutor,
    pub installer: ToolExecutor,
    pub web: WebClient,
}

impl CheckContext {
    pub fn new(config: AppConfig, root: &Path) -> Self {
        let web = WebClient::new(&config.web);
        Self {
            config,
            root: root.to_path_buf(),
            executor: ToolExecutor::new(PROBE_TIMEOUT_SECS),
            installer: ToolExecutor::new(INSTALL_TIMEOUT_SECS),
            web,
        }
    }

    pub fn env_file(&self) -> PathBuf {
        crate::application::utils::resolve_path(&self.root, &self.config.paths.env_file)
    }
}

/// One OS/environment capability probe
#[async_trait]
pub trait PermissionCheck: Send + Sync {
    fn key(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn critical(&self) -> bool;

    /// Probe the capability. Must not change the state it observes.
    async fn check(&self, ctx: &CheckContext) -> bool;

    async fn fix(&self, _ctx: &CheckContext, _prompter: &mut dyn Prompter) -> FixOutcome {
        FixOutcome::Unavailable
    }
}

/// Progress callbacks for the console. All methods default to doing nothing.
pub trait PermissionReporter {
    fn checked(&mut self, _record: &PermissionRecord, _done: usize, _total: usize) {}
    fn fixing(&mut self, _attempt: usize, _record: &PermissionRecord) {}
    fn fixed(&mut self, _record: &PermissionRecord, _outcome: &FixOutcome) {}
}

/// Reporter that prints nothing
pub struct Silent;

impl PermissionReporter for Silent {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    Ready,
    Degraded(usize),
    Blocked(usize),
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Ready => write!(f, "All systems ready"),
            OverallStatus::Degraded(n) => write!(f, "Core systems ready - {} optional issues", n),
            OverallStatus::Blocked(n) => write!(f, "{} critical issues must be resolved", n),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoFixReport {
    pub attempted: usize,
    pub successful: usize,
}

impl AutoFixReport {
    pub fn summary(&self) -> String {
        if self.attempted == 0 {
            "No issues needed fixing".to_string()
        } else if self.successful == self.attempted {
            format!("All {} issues fixed", self.attempted)
        } else {
            format!(
                "Fixed {} of {} issues. The rest need manual attention",
                self.successful, self.attempted
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Blocked(usize),
    Declined,
    Launched(u32),
}

pub struct PermissionManager {
    ctx: CheckContext,
    checks: Vec<Box<dyn PermissionCheck>>,
    records: Vec<PermissionRecord>,
}

impl PermissionManager {
    pub fn new(ctx: CheckContext) -> Self {
        Self::with_checks(ctx, checks::default_checks())
    }

    pub fn with_checks(ctx: CheckContext, checks: Vec<Box<dyn PermissionCheck>>) -> Self {
        let records = checks
            .iter()
            .map(|c| PermissionRecord {
                key: c.key(),
                description: c.description(),
                status: false,
                critical: c.critical(),
            })
            .collect();
        Self { ctx, checks, records }
    }

    pub fn context(&self) -> &CheckContext {
        &self.ctx
    }

    pub fn records(&self) -> &[PermissionRecord] {
        &self.records
    }

    pub fn record(&self, key: &str) -> Option<&PermissionRecord> {
        self.records.iter().find(|r| r.key == key)
    }

    fn position(&self, key: &str) -> Result<usize> {
        self.checks
            .iter()
            .position(|c| c.key() == key)
            .ok_or_else(|| anyhow!("Unknown permission check '{}'", key))
    }

    /// Runs one probe and stores its result.
    pub async fn check(&mut self, key: &str) -> Result<bool> {
        let index = self.position(key)?;
        let status = self.checks[index].check(&self.ctx).await;
        self.records[index].status = status;
        tracing::debug!("Permission check {} -> {}", key, status);
        Ok(status)
    }

    /// Runs every probe in order.
    pub async fn check_all(&mut self, reporter: &mut dyn PermissionReporter) {
        let total = self.checks.len();
        for index in 0..total {
            let status = self.checks[index].check(&self.ctx).await;
            self.records[index].status = status;
            reporter.checked(&self.records[index], index + 1, total);
        }
        tracing::info!("Permission checks complete: {}", self.overall_status());
    }

    pub fn critical_issues(&self) -> usize {
        self.records.iter().filter(|r| r.critical && !r.status).count()
    }

    pub fn optional_issues(&self) -> usize {
        self.records.iter().filter(|r| !r.critical && !r.status).count()
    }

    pub fn overall_status(&self) -> OverallStatus {
        match (self.critical_issues(), self.optional_issues()) {
            (0, 0) => OverallStatus::Ready,
            (0, optional) => OverallStatus::Degraded(optional),
            (critical, _) => OverallStatus::Blocked(critical),
        }
    }

    /// Dispatches to the check's fix and marks the record passed when it succeeds.
    pub async fn fix(&mut self, key: &str, prompter: &mut dyn Prompter) -> Result<FixOutcome> {
        let index = self.position(key)?;
        let outcome = self.checks[index].fix(&self.ctx, prompter).await;
        if outcome == FixOutcome::Fixed {
            self.records[index].status = true;
        }
        tracing::info!("Fix for {}: {:?}", key, outcome);
        Ok(outcome)
    }

    /// Attempts a fix for every failing record in order, pausing between attempts.
    pub async fn auto_fix(
        &mut self,
        prompter: &mut dyn Prompter,
        reporter: &mut dyn PermissionReporter,
        pause: Duration,
    ) -> AutoFixReport {
        let mut report = AutoFixReport::default();
        let failing: Vec<&'static str> = self
            .records
            .iter()
            .filter(|r| !r.status)
            .map(|r| r.key)
            .collect();

        for key in failing {
            report.attempted += 1;
            if let Some(record) = self.record(key) {
                reporter.fixing(report.attempted, record);
            }
            let outcome = match self.fix(key, prompter).await {
                Ok(outcome) => outcome,
                Err(e) => FixOutcome::Failed(format!("{:#}", e)),
            };
            if outcome == FixOutcome::Fixed {
                report.successful += 1;
            }
            if let Some(record) = self.record(key) {
                reporter.fixed(record, &outcome);
            }
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }
        report
    }

    /// Re-checks silently, then spawns `<current exe> run` after confirmation.
    pub async fn launch(&mut self, prompter: &mut dyn Prompter) -> Result<LaunchOutcome> {
        self.check_all(&mut Silent).await;
        let critical = self.critical_issues();
        if critical > 0 {
            return Ok(LaunchOutcome::Blocked(critical));
        }
        if !prompter.confirm("Launch ADE now?", true)? {
            return Ok(LaunchOutcome::Declined);
        }

        let exe = std::env::current_exe()?;
        let child = std::process::Command::new(exe)
            .arg("run")
            .current_dir(&self.ctx.root)
            .spawn()?;
        tracing::info!("Launched ADE as pid {}", child.id());
        Ok(LaunchOutcome::Launched(child.id()))
    }

    /// Host facts shown by the `info` command
    pub fn system_info(&self) -> Vec<(&'static str, String)> {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());
        let home = dirs::home_dir()
            .map(|h| h.display().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let admin = self
            .record("admin_rights")
            .map(|r| if r.status { "Yes" } else { "No" })
            .unwrap_or("Unknown");

        vec![
            ("Operating System", std::env::consts::OS.to_string()),
            ("Architecture", std::env::consts::ARCH.to_string()),
            ("Family", std::env::consts::FAMILY.to_string()),
            ("User", user),
            ("Home Directory", home),
            ("Working Directory", self.ctx.root.display().to_string()),
            ("Administrator", admin.to_string()),
        ]
    }

    /// Non-interactive gate used by `ade run`. Offers the fixer when critical checks fail.
    pub async fn gate(
        &mut self,
        prompter: &mut dyn Prompter,
        reporter: &mut dyn PermissionReporter,
    ) -> Result<bool> {
        self.check_all(reporter).await;
        if self.critical_issues() > 0 {
            if prompter.confirm("Critical issues found. Start the interactive permission fixer?", true)? {
                self.auto_fix(prompter, reporter, Duration::ZERO).await;
            } else {
                tracing::warn!("Continuing without fixes; ADE may not work correctly");
            }
        }
        self.check_all(&mut Silent).await;
        Ok(self.critical_issues() == 0)
    }
}

/// Text bar of `width` cells and the percentage it represents.
pub fn progress_bar(done: usize, total: usize, width: usize) -> (String, f64) {
    let percent = if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    };
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(width - filled));
    (bar, percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::ScriptedPrompter;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Check backed by a shared flag, fixable on demand.
    struct FlagCheck {
        key: &'static str,
        critical: bool,
        state: Arc<AtomicBool>,
        fixable: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PermissionCheck for FlagCheck {
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
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.state.load(Ordering::SeqCst)
        }
        async fn fix(&self, _ctx: &CheckContext, _prompter: &mut dyn Prompter) -> FixOutcome {
            if self.fixable {
                self.state.store(true, Ordering::SeqCst);
                FixOutcome::Fixed
            } else {
                FixOutcome::Manual(vec!["do it by hand".to_string()])
            }
        }
    }

    fn flag(key: &'static str, critical: bool, state: bool, fixable: bool) -> Box<dyn PermissionCheck> {
        Box::new(FlagCheck {
            key,
            critical,
            state: Arc::new(AtomicBool::new(state)),
            fixable,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn manager(dir: &TempDir, checks: Vec<Box<dyn PermissionCheck>>) -> PermissionManager {
        PermissionManager::with_checks(CheckContext::new(AppConfig::default(), dir.path()), checks)
    }

    #[derive(Default)]
    struct Recording {
        checked: Vec<(String, usize, usize)>,
        fixing: Vec<usize>,
    }

    impl PermissionReporter for Recording {
        fn checked(&mut self, record: &PermissionRecord, done: usize, total: usize) {
            self.checked.push((record.key.to_string(), done, total));
        }
        fn fixing(&mut self, attempt: usize, _record: &PermissionRecord) {
            self.fixing.push(attempt);
        }
    }

    #[tokio::test]
    async fn test_overall_status_transitions() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(
            &dir,
            vec![flag("a", true, true, false), flag("b", false, false, true)],
        );
        m.check_all(&mut Silent).await;
        assert_eq!(m.overall_status(), OverallStatus::Degraded(1));
        assert_eq!(m.overall_status().to_string(), "Core systems ready - 1 optional issues");

        let mut blocked = manager(&dir, vec![flag("a", true, false, false), flag("c", true, false, false)]);
        blocked.check_all(&mut Silent).await;
        assert_eq!(blocked.overall_status(), OverallStatus::Blocked(2));
        assert_eq!(blocked.overall_status().to_string(), "2 critical issues must be resolved");

        let mut ready = manager(&dir, vec![flag("a", true, true, false)]);
        ready.check_all(&mut Silent).await;
        assert_eq!(ready.overall_status().to_string(), "All systems ready");
    }

    #[tokio::test]
    async fn test_check_all_reports_in_order() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(
            &dir,
            vec![flag("a", true, true, false), flag("b", false, false, false), flag("c", false, true, false)],
        );
        let mut reporter = Recording::default();
        m.check_all(&mut reporter).await;
        assert_eq!(
            reporter.checked,
            vec![
                ("a".to_string(), 1, 3),
                ("b".to_string(), 2, 3),
                ("c".to_string(), 3, 3)
            ]
        );
    }

    #[tokio::test]
    async fn test_repeated_checks_agree() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir, vec![flag("a", true, false, false)]);
        let first = m.check("a").await.unwrap();
        let second = m.check("a").await.unwrap();
        assert_eq!(first, second);
        assert!(m.check("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_auto_fix_counts_successes() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(
            &dir,
            vec![
                flag("ok", true, true, false),
                flag("fixable", true, false, true),
                flag("manual", false, false, false),
            ],
        );
        m.check_all(&mut Silent).await;

        let mut prompter = ScriptedPrompter::new(&[]);
        let mut reporter = Recording::default();
        let report = m.auto_fix(&mut prompter, &mut reporter, Duration::ZERO).await;

        assert_eq!(report, AutoFixReport { attempted: 2, successful: 1 });
        assert_eq!(reporter.fixing, vec![1, 2]);
        assert!(m.record("fixable").unwrap().status);
        assert!(!m.record("manual").unwrap().status);
        assert_eq!(m.overall_status(), OverallStatus::Degraded(1));
        assert!(report.summary().contains("manual"));
    }

    #[tokio::test]
    async fn test_auto_fix_with_nothing_failing() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir, vec![flag("ok", true, true, false)]);
        m.check_all(&mut Silent).await;
        let mut prompter = ScriptedPrompter::new(&[]);
        let report = m.auto_fix(&mut prompter, &mut Silent, Duration::ZERO).await;
        assert_eq!(report.attempted, 0);
        assert_eq!(report.summary(), "No issues needed fixing");
    }

    #[tokio::test]
    async fn test_gate_runs_fixer_on_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir, vec![flag("crit", true, false, true)]);
        let mut prompter = ScriptedPrompter::new(&["y"]);
        assert!(m.gate(&mut prompter, &mut Silent).await.unwrap());

        let mut m = manager(&dir, vec![flag("crit", true, false, true)]);
        let mut prompter = ScriptedPrompter::new(&["n"]);
        assert!(!m.gate(&mut prompter, &mut Silent).await.unwrap());
    }

    #[tokio::test]
    async fn test_launch_refuses_with_critical_issues() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir, vec![flag("crit", true, false, false)]);
        let mut prompter = ScriptedPrompter::new(&[]);
        assert_eq!(m.launch(&mut prompter).await.unwrap(), LaunchOutcome::Blocked(1));

        let mut m = manager(&dir, vec![flag("ok", true, true, false)]);
        let mut prompter = ScriptedPrompter::new(&["n"]);
        assert_eq!(m.launch(&mut prompter).await.unwrap(), LaunchOutcome::Declined);
    }

    #[test]
    fn test_progress_bar() {
        let (bar, percent) = progress_bar(3, 12, 50);
        assert_eq!(bar.chars().count(), 50);
        assert_eq!(bar.chars().filter(|c| *c == '█').count(), 13);
        assert!((percent - 25.0).abs() < 1e-9);
        assert_eq!(progress_bar(12, 12, 50).0, "█".repeat(50));
    }

    #[test]
    fn test_system_info_lists_working_directory() {
        let dir = TempDir::new().unwrap();
        let m = manager(&dir, vec![]);
        let info = m.system_info();
        let cwd = info.iter().find(|(k, _)| *k == "Working Directory").unwrap();
        assert_eq!(cwd.1, dir.path().display().to_string());
        assert!(info.iter().any(|(k, v)| *k == "Administrator" && v == "Unknown"));
    }
}
