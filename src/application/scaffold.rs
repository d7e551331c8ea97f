//! # Scaffolder
//!
//! Creates folders, files, template expansions and whole project trees under a base path,
//! keeping a session log of everything it wrote.

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

use crate::domain::types::{CreatedItem, ItemKind};
use crate::strings::templates;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    Unknown(String),
    #[error("Missing template parameter '{0}'")]
    MissingKey(String),
}

/// Declarative project tree: folders first, then files.
#[derive(Debug, Clone, Default)]
pub struct ProjectSpec {
    pub name: String,
    pub folders: Vec<String>,
    pub files: BTreeMap<String, String>,
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex"))
}

/// Replaces every `{ident}` with its value verbatim. Other braces are left as they are.
pub fn expand(template: &str, params: &HashMap<String, String>) -> Result<String, TemplateError> {
    let re = placeholder_regex();
    if let Some(missing) = re
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .find(|key| !params.contains_key(key.as_str()))
    {
        return Err(TemplateError::MissingKey(missing.as_str().to_string()));
    }
    Ok(re
        .replace_all(template, |caps: &regex::Captures| {
            params.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned())
}

/// Names of the built-in templates
pub fn template_names() -> Vec<&'static str> {
    templates::SCAFFOLD.iter().map(|(name, _, _)| *name).collect()
}

pub struct FileSystemCreator {
    base_path: PathBuf,
    created: Vec<CreatedItem>,
}

impl FileSystemCreator {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            created: Vec::new(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, path: &str) -> PathBuf {
        crate::application::utils::resolve_path(&self.base_path, path)
    }

    /// Creates a folder. With `parents == false` the parent must already exist.
    pub fn create_folder(&mut self, path: &str, parents: bool) -> Result<PathBuf> {
        let full_path = self.resolve(path);
        if parents {
            fs::create_dir_all(&full_path)
        } else if full_path.is_dir() {
            Ok(())
        } else {
            fs::create_dir(&full_path)
        }
        .with_context(|| format!("Error creating folder '{}'", path))?;

        self.created.push(CreatedItem {
            kind: ItemKind::Folder,
            path: full_path.to_string_lossy().to_string(),
            size: 0,
        });
        tracing::info!("Folder created: {}", full_path.display());
        Ok(full_path)
    }

    /// Writes `content` byte for byte, creating parent directories.
    pub fn create_file(&mut self, path: &str, content: &str) -> Result<PathBuf> {
        let full_path = self.resolve(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Error creating parent folders for '{}'", path))?;
        }
        fs::write(&full_path, content).with_context(|| format!("Error creating file '{}'", path))?;

        self.created.push(CreatedItem {
            kind: ItemKind::File,
            path: full_path.to_string_lossy().to_string(),
            size: content.len() as u64,
        });
        tracing::info!("File created: {} ({} bytes)", full_path.display(), content.len());
        Ok(full_path)
    }

    /// Expands a built-in template (file name and body) and writes it.
    pub fn create_from_template(
        &mut self,
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<PathBuf> {
        let (_, file_pattern, body) = templates::SCAFFOLD
            .iter()
            .find(|(template, _, _)| *template == name)
            .ok_or_else(|| TemplateError::Unknown(name.to_string()))?;

        let file_path = expand(file_pattern, params)?;
        let content = expand(body, params)?;
        self.create_file(&file_path, &content)
    }

    /// Creates `<base>/<name>`, then its folders and files. Returns the created paths.
    pub fn create_project_structure(&mut self, spec: &ProjectSpec) -> Result<Vec<PathBuf>> {
        let name = if spec.name.trim().is_empty() {
            "new_project"
        } else {
            spec.name.trim()
        };
        let mut created = vec![self.create_folder(name, true)?];

        let root = Path::new(name);
        for folder in &spec.folders {
            let path = root.join(folder);
            created.push(self.create_folder(&path.to_string_lossy(), true)?);
        }
        for (file, content) in &spec.files {
            let path = root.join(file);
            created.push(self.create_file(&path.to_string_lossy(), content)?);
        }
        Ok(created)
    }

    /// The sample project used by `ade create demo`
    pub fn demo_spec() -> ProjectSpec {
        let folders = ["src", "tests", "docs", "config", "data", "scripts"]
            .iter()
            .map(|f| f.to_string())
            .collect();
        let files = [
            ("README.md", templates::DEMO_README),
            ("src/__init__.py", ""),
            ("src/main.py", templates::DEMO_MAIN),
            ("src/utils.py", templates::DEMO_UTILS),
            ("tests/__init__.py", ""),
            ("tests/test_main.py", templates::DEMO_TEST),
            ("config/settings.json", templates::DEMO_SETTINGS),
            ("requirements.txt", templates::DEMO_REQUIREMENTS),
            (".gitignore", templates::DEMO_GITIGNORE),
        ]
        .iter()
        .map(|(path, content)| (path.to_string(), content.to_string()))
        .collect();

        ProjectSpec {
            name: "sample_project".to_string(),
            folders,
            files,
        }
    }

    pub fn demo(&mut self) -> Result<Vec<PathBuf>> {
        self.create_project_structure(&Self::demo_spec())
    }

    pub fn list_created_items(&self) -> &[CreatedItem] {
        &self.created
    }

    pub fn clear_history(&mut self) {
        self.created.clear();
    }
}

/// Parses `key=value` CLI arguments; entries without `=` are rejected.
pub fn parse_params(args: &[String]) -> Result<HashMap<String, String>> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("Expected key=value, got '{}'", arg))
        })
        .collect()
}
