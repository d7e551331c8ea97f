//! # Todo Menu
//!
//! Numbered menu over the persisted `TodoList`.

use anyhow::{Result, anyhow};
use std::io::Write;

use crate::application::todo::{TodoList, Toggle};
use crate::domain::traits::Prompter;
use crate::interface::console::{err_line, header, ok_line, warn_line};
use crate::strings::help;

pub fn handle_menu(list: &mut TodoList, prompter: &mut dyn Prompter, out: &mut dyn Write) -> Result<()> {
    loop {
        writeln!(out, "\n{}", help::TODO_MENU)?;
        let choice = prompter.ask("Choose an option", None)?;
        let result = match choice.trim().to_lowercase().as_str() {
            "q" | "0" => break,
            "1" => add(list, prompter),
            "2" => Ok(render(list, false)),
            "3" => Ok(render(list, true)),
            "4" => toggle(list, prompter, true),
            "5" => toggle(list, prompter, false),
            "6" => remove(list, prompter),
            "7" => list.clear_completed().map(|n| ok_line(&format!("Cleared {} completed todos", n))),
            "8" => Ok(stats(list)),
            other => Ok(warn_line(&format!("Invalid choice '{}'. Pick 1-8, or q to quit", other))),
        };
        match result {
            Ok(text) => writeln!(out, "{}", text)?,
            Err(e) => writeln!(out, "{}", err_line(&format!("{:#}", e)))?,
        }
    }
    Ok(())
}

fn add(list: &mut TodoList, prompter: &mut dyn Prompter) -> Result<String> {
    let description = prompter.ask("Todo description", None)?;
    let item = list.add(&description)?;
    Ok(ok_line(&format!("Added: {}", item.description)))
}

fn ask_number(list: &TodoList, prompter: &mut dyn Prompter) -> Result<usize> {
    if list.items().is_empty() {
        return Err(anyhow!("No todos yet"));
    }
    let answer = prompter.ask("Todo number", None)?;
    answer
        .trim()
        .parse::<usize>()
        .map_err(|_| anyhow!("'{}' is not a number", answer.trim()))
}

fn toggle(list: &mut TodoList, prompter: &mut dyn Prompter, completed: bool) -> Result<String> {
    let number = ask_number(list, prompter)?;
    let outcome = if completed {
        list.complete(number)?
    } else {
        list.uncomplete(number)?
    };
    let state = if completed { "completed" } else { "pending" };
    Ok(match outcome {
        Toggle::Changed(description) => ok_line(&format!("Marked as {}: {}", state, description)),
        Toggle::AlreadyInState(description) => warn_line(&format!("Already {}: {}", state, description)),
    })
}

fn remove(list: &mut TodoList, prompter: &mut dyn Prompter) -> Result<String> {
    let number = ask_number(list, prompter)?;
    let removed = list.remove(number)?;
    Ok(ok_line(&format!("Removed: {}", removed.description)))
}

fn render(list: &TodoList, show_completed: bool) -> String {
    let items = list.list(show_completed);
    let title = if show_completed { "📋 All todos" } else { "📋 Pending todos" };
    if items.is_empty() {
        return format!("{}\n  (none)", header(title));
    }
    let mut lines = vec![header(title)];
    for (number, item) in items {
        let mark = if item.completed { "✅" } else { "⬜" };
        lines.push(format!("  {}. {} {} ({})", number, mark, item.description, item.created_at));
    }
    lines.join("\n")
}

fn stats(list: &TodoList) -> String {
    let stats = list.stats();
    format!(
        "{}\n  Total: {}\n  Completed: {}\n  Pending: {}\n  Completion rate: {:.1}%",
        header("📊 Statistics"),
        stats.total,
        stats.completed,
        stats.pending,
        stats.completion_rate
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::ScriptedPrompter;
    use tempfile::TempDir;

    fn run(list: &mut TodoList, answers: &[&str]) -> String {
        let mut prompter = ScriptedPrompter::new(answers);
        let mut out = Vec::new();
        handle_menu(list, &mut prompter, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_menu_add_complete_and_stats() {
        let dir = TempDir::new().unwrap();
        let mut list = TodoList::load(dir.path().join("todo_data.json")).unwrap();
        let out = run(
            &mut list,
            &["1", "write docs", "1", "ship it", "4", "1", "4", "1", "2", "8", "q"],
        );
        assert!(out.contains("Added: write docs"));
        assert!(out.contains("Marked as completed: write docs"));
        assert!(out.contains("Already completed: write docs"));
        assert!(out.contains("2. ⬜ ship it"));
        assert!(!out.contains("1. ✅ write docs"));
        assert!(out.contains("Completion rate: 50.0%"));

        let reloaded = TodoList::load(dir.path().join("todo_data.json")).unwrap();
        assert_eq!(reloaded.items().len(), 2);
        assert!(reloaded.items()[0].completed);
    }

    #[test]
    fn test_menu_reports_user_errors_and_continues() {
        let dir = TempDir::new().unwrap();
        let mut list = TodoList::load(dir.path().join("todo_data.json")).unwrap();
        let out = run(&mut list, &["4", "1", "  ", "1", "a", "6", "x", "6", "5", "9", "0"]);
        assert!(out.contains("No todos yet"));
        assert!(out.contains("Task description cannot be empty"));
        assert!(out.contains("'x' is not a number"));
        assert!(out.contains("Invalid task number 5. Choose between 1 and 1"));
        assert!(out.contains("Invalid choice '9'"));
        assert_eq!(list.items().len(), 1);
    }
}
