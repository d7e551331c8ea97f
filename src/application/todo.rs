//! # Todo Store
//!
//! A todo list persisted as a pretty-printed JSON array. Every mutating operation writes the
//! whole list back to disk.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::types::TodoItem;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TodoError {
    #[error("Task description cannot be empty")]
    Empty,
    #[error("Invalid task number {0}. Choose between 1 and {1}")]
    InvalidIndex(usize, usize),
}

/// Result of a complete/uncomplete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    Changed(String),
    AlreadyInState(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub completion_rate: f64,
}

pub struct TodoList {
    path: PathBuf,
    items: Vec<TodoItem>,
}

impl TodoList {
    /// Loads the list; a missing file is an empty list.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
        } else {
            Vec::new()
        };
        Ok(Self { path, items })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("Failed to create todo directory")?;
            }
        }
        let json = serde_json::to_string_pretty(&self.items).context("Failed to serialize todos")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn add(&mut self, description: &str) -> Result<&TodoItem> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TodoError::Empty.into());
        }
        self.items.push(TodoItem::new(description));
        self.save()?;
        let index = self.items.len() - 1;
        Ok(&self.items[index])
    }

    /// 1-based numbering, optionally hiding completed items.
    pub fn list(&self, show_completed: bool) -> Vec<(usize, &TodoItem)> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| show_completed || !item.completed)
            .map(|(i, item)| (i + 1, item))
            .collect()
    }

    fn index(&self, number: usize) -> Result<usize, TodoError> {
        if number == 0 || number > self.items.len() {
            Err(TodoError::InvalidIndex(number, self.items.len()))
        } else {
            Ok(number - 1)
        }
    }

    fn set_completed(&mut self, number: usize, completed: bool) -> Result<Toggle> {
        let index = self.index(number)?;
        let item = &mut self.items[index];
        if item.completed == completed {
            return Ok(Toggle::AlreadyInState(item.description.clone()));
        }
        item.completed = completed;
        let description = item.description.clone();
        self.save()?;
        Ok(Toggle::Changed(description))
    }

    pub fn complete(&mut self, number: usize) -> Result<Toggle> {
        self.set_completed(number, true)
    }

    pub fn uncomplete(&mut self, number: usize) -> Result<Toggle> {
        self.set_completed(number, false)
    }

    pub fn remove(&mut self, number: usize) -> Result<TodoItem> {
        let index = self.index(number)?;
        let removed = self.items.remove(index);
        self.save()?;
        Ok(removed)
    }

    /// Drops completed items, returning how many were removed.
    pub fn clear_completed(&mut self) -> Result<usize> {
        let before = self.items.len();
        self.items.retain(|item| !item.completed);
        let removed = before - self.items.len();
        if removed > 0 {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn stats(&self) -> TodoStats {
        let total = self.items.len();
        let completed = self.items.iter().filter(|i| i.completed).count();
        let completion_rate = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        TodoStats {
            total,
            completed,
            pending: total - completed,
            completion_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn list_in(dir: &TempDir) -> TodoList {
        TodoList::load(dir.path().join("todo_data.json")).unwrap()
    }

    #[test]
    fn test_added_items_survive_reload_in_order() {
        let dir = TempDir::new().unwrap();
        let mut todos = list_in(&dir);
        for i in 0..5 {
            todos.add(&format!("task {}", i)).unwrap();
        }

        let reloaded = list_in(&dir);
        let descriptions: Vec<&str> = reloaded.items().iter().map(|i| i.description.as_str()).collect();
        assert_eq!(descriptions, vec!["task 0", "task 1", "task 2", "task 3", "task 4"]);
        assert_eq!(reloaded.items(), todos.items());
    }

    #[test]
    fn test_add_trims_and_rejects_empty() {
        let dir = TempDir::new().unwrap();
        let mut todos = list_in(&dir);
        assert_eq!(todos.add("  buy milk  ").unwrap().description, "buy milk");
        let err = todos.add("   ").unwrap_err();
        assert_eq!(err.downcast_ref::<TodoError>(), Some(&TodoError::Empty));
    }

    #[test]
    fn test_complete_uncomplete_and_already_states() {
        let dir = TempDir::new().unwrap();
        let mut todos = list_in(&dir);
        todos.add("a").unwrap();

        assert_eq!(todos.complete(1).unwrap(), Toggle::Changed("a".to_string()));
        assert_eq!(todos.complete(1).unwrap(), Toggle::AlreadyInState("a".to_string()));
        assert_eq!(todos.uncomplete(1).unwrap(), Toggle::Changed("a".to_string()));
        assert_eq!(todos.uncomplete(1).unwrap(), Toggle::AlreadyInState("a".to_string()));
    }

    #[test]
    fn test_invalid_indexes() {
        let dir = TempDir::new().unwrap();
        let mut todos = list_in(&dir);
        todos.add("a").unwrap();
        let err = todos.complete(0).unwrap_err();
        assert_eq!(err.downcast_ref::<TodoError>(), Some(&TodoError::InvalidIndex(0, 1)));
        assert!(todos.remove(2).is_err());
    }

    #[test]
    fn test_list_filters_completed_but_keeps_numbers() {
        let dir = TempDir::new().unwrap();
        let mut todos = list_in(&dir);
        todos.add("a").unwrap();
        todos.add("b").unwrap();
        todos.complete(1).unwrap();

        let pending = todos.list(false);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, 2);
        assert_eq!(todos.list(true).len(), 2);
    }

    #[test]
    fn test_clear_completed_and_stats() {
        let dir = TempDir::new().unwrap();
        let mut todos = list_in(&dir);
        for d in ["a", "b", "c", "d"] {
            todos.add(d).unwrap();
        }
        todos.complete(1).unwrap();
        todos.complete(3).unwrap();

        let stats = todos.stats();
        assert_eq!((stats.total, stats.completed, stats.pending), (4, 2, 2));
        assert!((stats.completion_rate - 50.0).abs() < f64::EPSILON);

        assert_eq!(todos.clear_completed().unwrap(), 2);
        assert_eq!(list_in(&dir).items().len(), 2);
        assert_eq!(todos.stats().completion_rate, 0.0);
    }

    #[test]
    fn test_remove_returns_item() {
        let dir = TempDir::new().unwrap();
        let mut todos = list_in(&dir);
        todos.add("a").unwrap();
        todos.add("b").unwrap();
        assert_eq!(todos.remove(1).unwrap().description, "a");
        assert_eq!(list_in(&dir).items()[0].description, "b");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("todo_data.json"), "{not json").unwrap();
        assert!(TodoList::load(dir.path().join("todo_data.json")).is_err());
    }
}
