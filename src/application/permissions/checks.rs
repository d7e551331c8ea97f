//! # Permission Checks
//!
//! The fixed probe table. Each check is a small struct so the manager can iterate them in
//! registration order and dispatch fixes by key.

use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

use super::{CheckContext, FixOutcome, PermissionCheck};
use crate::domain::paths;
use crate::domain::traits::Prompter;

/// Models offered by the API key setup, first is the default.
pub const MODEL_CHOICES: [&str; 3] = ["gemini-1.5-flash", "gemini-1.5-pro", "gemini-pro"];

const PROBE_CONTENT: &str = "ADE Permission Test";
const MIN_KEY_LEN: usize = 20;

/// All checks in display order
pub fn default_checks() -> Vec<Box<dyn PermissionCheck>> {
    vec![
        Box::new(AdminRights),
        Box::new(PythonInstalled),
        Box::new(PipAvailable),
        Box::new(FileAccess),
        Box::new(NetworkAccess),
        Box::new(EnvironmentAccess),
        Box::new(WorkspaceCreated),
        Box::new(ApiKeysSet),
        Box::new(DependenciesInstalled),
        Box::new(RegistryAccess),
        Box::new(FirewallConfigured),
        Box::new(AntivirusExclusion),
    ]
}

/// `Python X.Y.Z` from `python --version` (older interpreters print to stderr).
pub fn parse_python_version(output: &str) -> Option<(u32, u32)> {
    let version = output
        .split_whitespace()
        .skip_while(|w| !w.eq_ignore_ascii_case("python"))
        .nth(1)?;
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts
        .next()
        .map(|m| m.chars().take_while(|c| c.is_ascii_digit()).collect::<String>())
        .and_then(|m| m.parse().ok())
        .unwrap_or(0);
    Some((major, minor))
}

/// Reads `GOOGLE_API_KEY` from the env file, if present.
pub fn read_api_key(env_file: &std::path::Path) -> Option<String> {
    dotenvy::from_path_iter(env_file)
        .ok()?
        .filter_map(|item| item.ok())
        .find(|(key, _)| key == paths::API_KEY_ENV)
        .map(|(_, value)| value.trim().to_string())
}

fn python(ctx: &CheckContext) -> Option<PathBuf> {
    ctx.config.tools.python_command()
}

pub struct AdminRights;

#[async_trait]
impl PermissionCheck for AdminRights {
    fn key(&self) -> &'static str {
        "admin_rights"
    }
    fn description(&self) -> &'static str {
        "Administrator Rights"
    }
    fn critical(&self) -> bool {
        false
    }

    async fn check(&self, ctx: &CheckContext) -> bool {
        if cfg!(target_os = "windows") {
            ctx.executor
                .run("net", ["session"])
                .await
                .is_ok_and(|out| out.success)
        } else {
            ctx.executor
                .run("id", ["-u"])
                .await
                .is_ok_and(|out| out.success && out.stdout.trim() == "0")
        }
    }

    async fn fix(&self, _ctx: &CheckContext, _prompter: &mut dyn Prompter) -> FixOutcome {
        let steps = if cfg!(target_os = "windows") {
            vec![
                "Close this program".to_string(),
                "Right-click your terminal and choose 'Run as administrator'".to_string(),
                "Start ADE again from the elevated terminal".to_string(),
            ]
        } else {
            vec![
                "Exit this program".to_string(),
                "Run it again with: sudo ade permissions".to_string(),
            ]
        };
        FixOutcome::Manual(steps)
    }
}

pub struct PythonInstalled;

#[async_trait]
impl PermissionCheck for PythonInstalled {
    fn key(&self) -> &'static str {
        "python_installed"
    }
    fn description(&self) -> &'static str {
        "Python 3.8+ Installation"
    }
    fn critical(&self) -> bool {
        true
    }

    async fn check(&self, ctx: &CheckContext) -> bool {
        let Some(python) = python(ctx) else {
            return false;
        };
        match ctx.executor.run(&python, ["--version"]).await {
            Ok(out) if out.success => {
                let text = format!("{} {}", out.stdout, out.stderr);
                parse_python_version(&text).is_some_and(|version| version >= (3, 8))
            }
            _ => false,
        }
    }

    async fn fix(&self, _ctx: &CheckContext, _prompter: &mut dyn Prompter) -> FixOutcome {
        FixOutcome::Manual(vec![
            "Download Python 3.8 or newer from https://www.python.org/downloads/".to_string(),
            "Make sure the interpreter is on your PATH".to_string(),
        ])
    }
}

pub struct PipAvailable;

#[async_trait]
impl PermissionCheck for PipAvailable {
    fn key(&self) -> &'static str {
        "pip_available"
    }
    fn description(&self) -> &'static str {
        "pip Package Manager"
    }
    fn critical(&self) -> bool {
        true
    }

    async fn check(&self, ctx: &CheckContext) -> bool {
        let Some(python) = python(ctx) else {
            return false;
        };
        ctx.executor
            .run(&python, ["-m", "pip", "--version"])
            .await
            .is_ok_and(|out| out.success)
    }

    async fn fix(&self, ctx: &CheckContext, _prompter: &mut dyn Prompter) -> FixOutcome {
        let Some(python) = python(ctx) else {
            return FixOutcome::Failed("Python interpreter not found".to_string());
        };
        match ctx.installer.run(&python, ["-m", "ensurepip", "--upgrade"]).await {
            Ok(out) if out.success => FixOutcome::Fixed,
            Ok(out) => FixOutcome::Failed(out.stderr.trim().to_string()),
            Err(e) => FixOutcome::Failed(format!("{:#}", e)),
        }
    }
}

pub struct FileAccess;

impl FileAccess {
    fn probe(ctx: &CheckContext) -> std::io::Result<bool> {
        let dir = ctx.root.join(&ctx.config.permissions.probe_dir);
        fs::create_dir_all(&dir)?;
        let file = dir.join("test_file.txt");
        fs::write(&file, PROBE_CONTENT)?;
        let content = fs::read_to_string(&file)?;
        fs::remove_dir_all(&dir)?;
        Ok(content == PROBE_CONTENT)
    }
}

#[async_trait]
impl PermissionCheck for FileAccess {
    fn key(&self) -> &'static str {
        "file_access"
    }
    fn description(&self) -> &'static str {
        "File System Access"
    }
    fn critical(&self) -> bool {
        true
    }

    async fn check(&self, ctx: &CheckContext) -> bool {
        Self::probe(ctx).unwrap_or_else(|e| {
            tracing::debug!("File access probe failed: {}", e);
            false
        })
    }
}

pub struct NetworkAccess;

#[async_trait]
impl PermissionCheck for NetworkAccess {
    fn key(&self) -> &'static str {
        "network_access"
    }
    fn description(&self) -> &'static str {
        "Internet Connectivity"
    }
    fn critical(&self) -> bool {
        true
    }

    async fn check(&self, ctx: &CheckContext) -> bool {
        let permissions = &ctx.config.permissions;
        ctx.web
            .probe(&permissions.network_probe_url, permissions.network_timeout)
            .await
            .is_ok_and(|status| status == 200)
    }

    async fn fix(&self, _ctx: &CheckContext, _prompter: &mut dyn Prompter) -> FixOutcome {
        FixOutcome::Manual(vec![
            "Check your internet connection".to_string(),
            "Allow outbound HTTPS through your firewall or proxy".to_string(),
        ])
    }
}

/// Sets the probe variable in a child process and reads it back.
pub struct EnvironmentAccess;

#[async_trait]
impl PermissionCheck for EnvironmentAccess {
    fn key(&self) -> &'static str {
        "environment_access"
    }
    fn description(&self) -> &'static str {
        "Environment Variables"
    }
    fn critical(&self) -> bool {
        false
    }

    async fn check(&self, ctx: &CheckContext) -> bool {
        let envs = [(paths::PROBE_ENV, "test_value")];
        let result = if cfg!(target_os = "windows") {
            let echo = format!("echo %{}%", paths::PROBE_ENV);
            ctx.executor.run_with_env("cmd", ["/C", echo.as_str()], &envs).await
        } else {
            let echo = format!("printf %s \"${}\"", paths::PROBE_ENV);
            ctx.executor.run_with_env("sh", ["-c", echo.as_str()], &envs).await
        };
        result.is_ok_and(|out| out.success && out.stdout.trim() == "test_value")
    }

    async fn fix(&self, ctx: &CheckContext, _prompter: &mut dyn Prompter) -> FixOutcome {
        if self.check(ctx).await {
            FixOutcome::Fixed
        } else {
            FixOutcome::Failed("Environment variables are still not accessible".to_string())
        }
    }
}

pub struct WorkspaceCreated;

#[async_trait]
impl PermissionCheck for WorkspaceCreated {
    fn key(&self) -> &'static str {
        "workspace_created"
    }
    fn description(&self) -> &'static str {
        "ADE Workspace"
    }
    fn critical(&self) -> bool {
        false
    }

    async fn check(&self, ctx: &CheckContext) -> bool {
        ctx.root.join("data").is_dir() && ctx.root.join("src").is_dir()
    }

    async fn fix(&self, ctx: &CheckContext, _prompter: &mut dyn Prompter) -> FixOutcome {
        for dir in paths::WORKSPACE_DIRS {
            if let Err(e) = fs::create_dir_all(ctx.root.join(dir)) {
                return FixOutcome::Failed(format!("Could not create {}: {}", dir, e));
            }
            tracing::info!("Created workspace directory {}", dir);
        }
        FixOutcome::Fixed
    }
}

pub struct ApiKeysSet;

#[async_trait]
impl PermissionCheck for ApiKeysSet {
    fn key(&self) -> &'static str {
        "api_keys_set"
    }
    fn description(&self) -> &'static str {
        "API Keys Configured"
    }
    fn critical(&self) -> bool {
        false
    }

    async fn check(&self, ctx: &CheckContext) -> bool {
        read_api_key(&ctx.env_file()).is_some_and(|key| key.len() > MIN_KEY_LEN)
    }

    async fn fix(&self, ctx: &CheckContext, prompter: &mut dyn Prompter) -> FixOutcome {
        let key = match prompter.ask("Enter your Google API key (leave empty to skip)", None) {
            Ok(key) => key.trim().to_string(),
            Err(e) => return FixOutcome::Failed(format!("{:#}", e)),
        };
        if key.is_empty() {
            return FixOutcome::Skipped;
        }
        let model = match prompter.choose("Choose a Gemini model", &MODEL_CHOICES, MODEL_CHOICES[0]) {
            Ok(model) => model,
            Err(e) => return FixOutcome::Failed(format!("{:#}", e)),
        };

        let content = format!(
            "{}=\"{}\"\n{}=\"{}\"\n",
            paths::API_KEY_ENV,
            key,
            paths::MODEL_ENV,
            model
        );
        match fs::write(ctx.env_file(), content) {
            Ok(()) => {
                tracing::info!("API key written to {}", ctx.env_file().display());
                FixOutcome::Fixed
            }
            Err(e) => FixOutcome::Failed(format!("Could not write .env: {}", e)),
        }
    }
}

pub struct DependenciesInstalled;

#[async_trait]
impl PermissionCheck for DependenciesInstalled {
    fn key(&self) -> &'static str {
        "dependencies_installed"
    }
    fn description(&self) -> &'static str {
        "Python Dependencies"
    }
    fn critical(&self) -> bool {
        false
    }

    async fn check(&self, ctx: &CheckContext) -> bool {
        let Some(python) = python(ctx) else {
            return false;
        };
        for package in &ctx.config.permissions.required_packages {
            let import = format!("import {}", package);
            let ok = ctx
                .executor
                .run(&python, ["-c", import.as_str()])
                .await
                .is_ok_and(|out| out.success);
            if !ok {
                return false;
            }
        }
        true
    }

    async fn fix(&self, ctx: &CheckContext, _prompter: &mut dyn Prompter) -> FixOutcome {
        let Some(python) = python(ctx) else {
            return FixOutcome::Failed("Python interpreter not found".to_string());
        };
        let requirements = ctx.root.join(paths::REQUIREMENTS_FILE);
        let installs: Vec<Vec<String>> = if requirements.is_file() {
            vec![vec!["-r".to_string(), requirements.to_string_lossy().to_string()]]
        } else {
            ctx.config
                .permissions
                .fallback_packages
                .iter()
                .map(|p| vec![p.clone()])
                .collect()
        };

        for args in installs {
            let mut full = vec!["-m".to_string(), "pip".to_string(), "install".to_string()];
            full.extend(args);
            match ctx.installer.run(&python, &full).await {
                Ok(out) if out.success => {}
                Ok(out) => return FixOutcome::Failed(out.stderr.trim().to_string()),
                Err(e) => return FixOutcome::Failed(format!("{:#}", e)),
            }
        }
        FixOutcome::Fixed
    }
}

pub struct RegistryAccess;

#[async_trait]
impl PermissionCheck for RegistryAccess {
    fn key(&self) -> &'static str {
        "registry_access"
    }
    fn description(&self) -> &'static str {
        "Registry Access"
    }
    fn critical(&self) -> bool {
        false
    }

    async fn check(&self, ctx: &CheckContext) -> bool {
        if !cfg!(target_os = "windows") {
            return false;
        }
        ctx.executor
            .run("reg", ["query", r"HKCU\Software"])
            .await
            .is_ok_and(|out| out.success)
    }
}

pub struct FirewallConfigured;

#[async_trait]
impl PermissionCheck for FirewallConfigured {
    fn key(&self) -> &'static str {
        "firewall_configured"
    }
    fn description(&self) -> &'static str {
        "Windows Firewall"
    }
    fn critical(&self) -> bool {
        false
    }

    async fn check(&self, ctx: &CheckContext) -> bool {
        ctx.executor
            .run("netsh", ["advfirewall", "show", "allprofiles", "state"])
            .await
            .is_ok_and(|out| out.success)
    }
}

/// Real antivirus inspection is out of scope; this always passes.
pub struct AntivirusExclusion;

#[async_trait]
impl PermissionCheck for AntivirusExclusion {
    fn key(&self) -> &'static str {
        "antivirus_exclusion"
    }
    fn description(&self) -> &'static str {
        "Antivirus Exclusion"
    }
    fn critical(&self) -> bool {
        false
    }

    async fn check(&self, _ctx: &CheckContext) -> bool {
        true
    }
}
