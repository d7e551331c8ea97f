//! # File Tools
//!
//! Write, read and mkdir for the agent. Relative paths resolve against the tool context's
//! working directory.

use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::{Tool, ToolArgs, ToolContext, clean_input};
use crate::application::utils::{resolve_path, truncate_chars};

fn absolute(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

pub struct FileWrite;

#[async_trait]
impl Tool for FileWrite {
    fn name(&self) -> &'static str {
        "File Write"
    }

    fn description(&self) -> &'static str {
        "Writes content to a file, creating parent folders. Input: JSON {\"filepath\": \"...\", \"content\": \"...\"} or 'filepath|content'."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let args = ToolArgs::parse(input);
        let Some(filepath) = args.get("filepath", 0) else {
            return Ok("❌ File Write needs a filepath".to_string());
        };
        let content = args.rest("content", 1).unwrap_or_default();
        let path = resolve_path(&ctx.cwd, &filepath);

        let result = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| fs::write(&path, &content));
        Ok(match result {
            Ok(()) => format!("✅ Successfully created file: {}", absolute(&path)),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                format!("❌ Permission denied: Cannot write to {}", filepath)
            }
            Err(e) => format!("❌ Error writing file '{}': {}", filepath, e),
        })
    }
}

pub struct FileRead;

#[async_trait]
impl Tool for FileRead {
    fn name(&self) -> &'static str {
        "File Read"
    }

    fn description(&self) -> &'static str {
        "Reads a text file. Input: the file path."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let args = ToolArgs::parse(input);
        let filepath = args.get("filepath", 0).unwrap_or_else(|| clean_input(input));
        let path = resolve_path(&ctx.cwd, &filepath);
        if !path.exists() {
            return Ok(format!("File not found: {}", filepath));
        }
        Ok(match fs::read_to_string(&path) {
            Ok(content) => truncate_chars(&content, ctx.config.tools.file_read_limit),
            Err(e) => format!("Error reading file: {}", e),
        })
    }
}

pub struct CreateDirectory;

#[async_trait]
impl Tool for CreateDirectory {
    fn name(&self) -> &'static str {
        "Create Directory"
    }

    fn description(&self) -> &'static str {
        "Creates a directory and any missing parents. Input: the directory path."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let args = ToolArgs::parse(input);
        let dirpath = args.get("dirpath", 0).unwrap_or_else(|| clean_input(input));
        let path = resolve_path(&ctx.cwd, &dirpath);
        Ok(match fs::create_dir_all(&path) {
            Ok(()) => format!("✅ Successfully created directory: {}", absolute(&path)),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                format!("❌ Permission denied: Cannot create directory {}", dirpath)
            }
            Err(e) => format!("❌ Error creating directory '{}': {}", dirpath, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tools::test_support;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read_json_input() {
        let dir = TempDir::new().unwrap();
        let ctx = test_support::context(dir.path(), None, true);

        let out = FileWrite
            .call(r#"{"filepath": "notes/todo.txt", "content": "a|b\nc"}"#, &ctx)
            .await
            .unwrap();
        assert!(out.starts_with("✅ Successfully created file: "));
        assert!(out.ends_with("todo.txt"));
        assert_eq!(fs::read_to_string(dir.path().join("notes/todo.txt")).unwrap(), "a|b\nc");

        let read = FileRead.call("notes/todo.txt", &ctx).await.unwrap();
        assert_eq!(read, "a|b\nc");
    }

    #[tokio::test]
    async fn test_write_pipe_form_and_empty_content() {
        let dir = TempDir::new().unwrap();
        let ctx = test_support::context(dir.path(), None, true);
        FileWrite.call("a.py|print('x')", &ctx).await.unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.py")).unwrap(), "print('x')");

        FileWrite.call("empty.txt", &ctx).await.unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("empty.txt")).unwrap(), "");
    }

    #[tokio::test]
    async fn test_read_missing_and_truncated() {
        let dir = TempDir::new().unwrap();
        let mut ctx = test_support::context(dir.path(), None, true);
        assert_eq!(FileRead.call("nope.txt", &ctx).await.unwrap(), "File not found: nope.txt");

        ctx.config.tools.file_read_limit = 5;
        fs::write(dir.path().join("long.txt"), "0123456789").unwrap();
        assert_eq!(FileRead.call("'long.txt'", &ctx).await.unwrap(), "01234");
    }

    #[tokio::test]
    async fn test_create_directory() {
        let dir = TempDir::new().unwrap();
        let ctx = test_support::context(dir.path(), None, true);
        let out = CreateDirectory.call("x/y/z", &ctx).await.unwrap();
        assert!(out.starts_with("✅ Successfully created directory: "));
        assert!(dir.path().join("x/y/z").is_dir());
        // existing directory is fine
        assert!(CreateDirectory.call("x/y/z", &ctx).await.unwrap().starts_with("✅"));
    }
}
