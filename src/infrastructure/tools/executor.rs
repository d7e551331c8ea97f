//! # Tool Executor
//!
//! Handles execution of external programs (shell probes, pip, the Python sandbox).
//! Every run is bounded by a timeout and the child is killed when it expires.

use anyhow::{Context as AnyhowContext, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured result of a finished process
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout and stderr merged for display, with the exit code on failure.
    pub fn combined(&self) -> String {
        let mut result = String::new();
        if !self.stdout.is_empty() {
            result.push_str(&self.stdout);
        }
        if !self.stderr.is_empty() {
            if !result.is_empty() {
                result.push_str("\n--- STDERR ---\n");
            }
            result.push_str(&self.stderr);
        }
        if !self.success {
            if !result.is_empty() {
                result.push('\n');
            }
            match self.code {
                Some(code) => result.push_str(&format!("[Exit Code: {}]", code)),
                None => result.push_str("[Exit Code: terminated]"),
            }
        }
        result
    }
}

/// Runs external commands with a timeout.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    /// Execute a shell command line, optionally in a specific working directory.
    pub async fn execute_command(&self, command: &str, cwd: Option<&Path>) -> Result<CommandOutput> {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        self.wait(cmd, None)
            .await
            .with_context(|| format!("Failed to run `{}`", command))
    }

    /// Run a program directly with arguments.
    pub async fn run<P, I, S>(&self, program: P, args: I) -> Result<CommandOutput>
    where
        P: AsRef<OsStr>,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = program.as_ref();
        let mut cmd = Command::new(program);
        cmd.args(args);
        self.wait(cmd, None)
            .await
            .with_context(|| format!("Failed to run {:?}", program))
    }

    /// Run a program and feed `input` on stdin.
    pub async fn run_with_stdin<P, I, S>(&self, program: P, args: I, input: &str) -> Result<CommandOutput>
    where
        P: AsRef<OsStr>,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = program.as_ref();
        let mut cmd = Command::new(program);
        cmd.args(args);
        self.wait(cmd, Some(input))
            .await
            .with_context(|| format!("Failed to run {:?}", program))
    }

    /// Run a program with extra environment variables set for the child only.
    pub async fn run_with_env<P, I, S>(&self, program: P, args: I, envs: &[(&str, &str)]) -> Result<CommandOutput>
    where
        P: AsRef<OsStr>,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = program.as_ref();
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.envs(envs.iter().copied());
        self.wait(cmd, None)
            .await
            .with_context(|| format!("Failed to run {:?}", program))
    }

    async fn wait(&self, mut cmd: Command, input: Option<&str>) -> Result<CommandOutput> {
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().context("Failed to spawn process")?;

        if let Some(input) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(input.as_bytes())
                    .await
                    .context("Failed to write to stdin")?;
                // Dropping stdin closes the pipe so the child sees EOF.
            }
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| anyhow::anyhow!("Command timed out after {}s", self.timeout.as_secs()))??;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
