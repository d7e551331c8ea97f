//! # Console
//!
//! Terminal implementations of the interactive seams: stdin prompter, consent approver and the
//! colored permission reporter.

use anyhow::{Result, anyhow};
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};

use crate::application::permissions::{FixOutcome, PermissionManager, PermissionReporter, progress_bar};
use crate::domain::traits::{Approver, Prompter};
use crate::domain::types::PermissionRecord;

const BAR_WIDTH: usize = 50;

/// Reads answers from stdin.
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn ask(&mut self, question: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(default) if !default.is_empty() => print!("{} [{}]: ", question, default),
            _ => print!("{}: ", question),
        }
        io::stdout().flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(anyhow!("Input closed"));
        }
        let answer = line.trim_end_matches(['\r', '\n']).to_string();
        match default {
            Some(default) if answer.trim().is_empty() => Ok(default.to_string()),
            _ => Ok(answer),
        }
    }
}

/// Asks on the terminal before multi-file writes.
pub struct ConsoleApprover;

impl Approver for ConsoleApprover {
    fn approve(&self, summary: &str) -> bool {
        println!("{}", summary);
        match ConsolePrompter.confirm("Proceed?", true) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Approval prompt failed: {:#}", e);
                false
            }
        }
    }
}

pub fn ok_line(text: &str) -> String {
    format!("{}", format!("✅ {}", text).green())
}

pub fn err_line(text: &str) -> String {
    format!("{}", format!("❌ {}", text).red())
}

pub fn warn_line(text: &str) -> String {
    format!("{}", format!("⚠️ {}", text).yellow())
}

pub fn header(text: &str) -> String {
    format!("{}", text.cyan().bold())
}

fn status_mark(status: bool) -> String {
    if status {
        format!("{}", "✅".green())
    } else {
        format!("{}", "❌".red())
    }
}

/// `[████░░░] 57.1%` colored by completion.
pub fn colored_bar(done: usize, total: usize) -> String {
    let (bar, percent) = progress_bar(done, total, BAR_WIDTH);
    let text = format!("[{}] {:.1}%", bar, percent);
    if percent >= 100.0 {
        format!("{}", text.green())
    } else if percent >= 70.0 {
        format!("{}", text.yellow())
    } else {
        format!("{}", text.red())
    }
}

/// Prints probe results and fix progress to a writer.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            tracing::warn!("Console write failed: {}", e);
        }
    }
}

impl<W: Write> PermissionReporter for ConsoleReporter<W> {
    fn checked(&mut self, record: &PermissionRecord, done: usize, total: usize) {
        self.line(&format!("Checking {}... {}", record.description, status_mark(record.status)));
        if done % 3 == 0 || done == total {
            self.line(&colored_bar(done, total));
        }
    }

    fn fixing(&mut self, attempt: usize, record: &PermissionRecord) {
        self.line(&format!("[{}] Fixing: {}", attempt, record.description));
    }

    fn fixed(&mut self, record: &PermissionRecord, outcome: &FixOutcome) {
        let text = match outcome {
            FixOutcome::Fixed => ok_line(&format!("{} fixed", record.description)),
            FixOutcome::Failed(reason) => err_line(&format!("{}: {}", record.description, reason)),
            FixOutcome::Manual(steps) => {
                let mut text = warn_line(&format!("{} needs manual steps:", record.description));
                for step in steps {
                    text.push_str(&format!("\n   - {}", step));
                }
                text
            }
            FixOutcome::Unavailable => warn_line(&format!("{}: No automatic fix available", record.description)),
            FixOutcome::Skipped => warn_line(&format!("{}: skipped", record.description)),
        };
        self.line(&text);
    }
}

/// Critical section, optional section and the overall status line.
pub fn status_report(manager: &PermissionManager) -> String {
    let mut lines = vec![header("🔐 PERMISSION STATUS"), String::new(), header("Critical")];
    for record in manager.records().iter().filter(|r| r.critical) {
        lines.push(format!("  {} {}", status_mark(record.status), record.description));
    }
    lines.push(String::new());
    lines.push(header("Optional"));
    for record in manager.records().iter().filter(|r| !r.critical) {
        lines.push(format!("  {} {}", status_mark(record.status), record.description));
    }
    lines.push(String::new());

    let status = manager.overall_status().to_string();
    lines.push(match manager.critical_issues() {
        0 if manager.optional_issues() == 0 => ok_line(&status),
        0 => warn_line(&status),
        _ => err_line(&status),
    });
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: bool) -> PermissionRecord {
        PermissionRecord {
            key: "file_access",
            description: "File System Access",
            status,
            critical: true,
        }
    }

    #[test]
    fn test_reporter_prints_bar_every_third_item_and_at_end() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        for done in 1..=4 {
            reporter.checked(&record(done != 2), done, 4);
        }
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out.matches("Checking File System Access...").count(), 4);
        assert_eq!(out.matches("%").count(), 2);
        assert!(out.contains("75.0%"));
        assert!(out.contains("100.0%"));
    }

    #[test]
    fn test_reporter_fix_outcomes() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.fixing(1, &record(false));
        reporter.fixed(&record(false), &FixOutcome::Manual(vec!["Run as administrator".to_string()]));
        reporter.fixed(&record(true), &FixOutcome::Fixed);
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(out.contains("[1] Fixing: File System Access"));
        assert!(out.contains("   - Run as administrator"));
        assert!(out.contains("File System Access fixed"));
    }

    #[test]
    fn test_colored_bar_width() {
        let bar = colored_bar(1, 2);
        assert_eq!(bar.matches('█').count(), 25);
        assert_eq!(bar.matches('░').count(), 25);
    }
}
