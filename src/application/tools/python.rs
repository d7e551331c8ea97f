//! # Python REPL
//!
//! Runs snippets with the configured interpreter in a subprocess bounded by a timeout.

use anyhow::Result;
use async_trait::async_trait;

use super::{Tool, ToolContext, clean_input};
use crate::application::utils::strip_code_fences;

/// Single-line expressions are printed through `repr`, everything else runs as a script.
pub fn prepare_snippet(code: &str) -> String {
    let code = strip_code_fences(code);
    let code = code.trim();
    let single_line = !code.contains('\n');
    let looks_like_statement = ["import ", "from ", "print(", "def ", "class ", "for ", "while ", "if ", "with ", "try:"]
        .iter()
        .any(|kw| code.starts_with(kw))
        || has_assignment(code);
    if single_line && !code.contains("__") && !looks_like_statement && !code.is_empty() {
        format!("print(repr({}))", code)
    } else {
        code.to_string()
    }
}

/// `x = 1` style assignment at the top level (but not `==`, `<=`, `>=`, `!=`).
/// Keyword arguments and `=` inside string literals don't count.
fn has_assignment(code: &str) -> bool {
    let chars: Vec<char> = code.chars().collect();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) => {
                if c == '\\' {
                    i += 1;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                '=' if depth == 0 => {
                    let next = chars.get(i + 1);
                    let prev = i.checked_sub(1).map(|p| chars[p]);
                    if next != Some(&'=') && !matches!(prev, Some('=' | '<' | '>' | '!')) {
                        return true;
                    }
                    if next == Some(&'=') {
                        i += 1;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    false
}

pub struct PythonRepl;

#[async_trait]
impl Tool for PythonRepl {
    fn name(&self) -> &'static str {
        "Python REPL"
    }

    fn description(&self) -> &'static str {
        "Executes Python code and returns the printed output. Input: Python source code."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let Some(python) = ctx.config.tools.python_command() else {
            return Ok("Python REPL error: no Python interpreter found".to_string());
        };
        let script = prepare_snippet(&clean_input(input));
        let output = match ctx.executor.run_with_stdin(&python, ["-"], &script).await {
            Ok(output) => output,
            Err(e) => return Ok(format!("Python REPL error: {:#}", e)),
        };

        if !output.success {
            let message = output
                .stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("process failed")
                .trim()
                .to_string();
            return Ok(format!("Python REPL error: {}", message));
        }
        let stdout = output.stdout.trim();
        Ok(if stdout.is_empty() {
            "<no output>".to_string()
        } else {
            stdout.to_string()
        })
    }
}
