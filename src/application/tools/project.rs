//! # Advanced Project Creator
//!
//! Turns a free-form project description into a folder tree with generated starter files.
//! The structure comes from the model when one answers with usable JSON, otherwise from
//! keyword rules. Nothing is written until the approver agrees.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;

use super::{Tool, ToolArgs, ToolContext, clean_input};
use crate::application::scaffold::{FileSystemCreator, ProjectSpec};
use crate::application::utils::{contains_any, extract_json};
use crate::domain::types::ItemKind;
use crate::strings::{prompts, templates};

fn default_project_name() -> String {
    "ai_generated_project".to_string()
}

fn default_project_type() -> String {
    "python_app".to_string()
}

fn default_complexity() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProjectAnalysis {
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default = "default_project_type")]
    pub project_type: String,
    #[serde(default)]
    pub technology_stack: Vec<String>,
    #[serde(default)]
    pub main_features: Vec<String>,
    #[serde(default)]
    pub folder_structure: Vec<String>,
    #[serde(default)]
    pub essential_files: BTreeMap<String, String>,
    #[serde(default)]
    pub console_ui_needed: bool,
    #[serde(default = "default_complexity")]
    pub estimated_complexity: String,
}

fn standard_files(extra: &[(&str, &str)]) -> BTreeMap<String, String> {
    let mut files: BTreeMap<String, String> = [
        ("README.md", "Project documentation"),
        ("requirements.txt", "Python dependencies"),
        ("main.py", "Main application entry point"),
        ("config.json", "Configuration file"),
        ("src/__init__.py", "Package initialization"),
        ("tests/test_main.py", "Basic test structure"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        files.insert(k.to_string(), v.to_string());
    }
    files
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ProjectAnalysis {
    /// Keyword rules used when the model is unavailable or its reply is not JSON.
    pub fn fallback(description: &str) -> Self {
        let folders = strings(&["src/", "tests/", "docs/", "config/"]);
        if contains_any(description, &["todo", "task"]) {
            Self {
                project_name: "todo_app".to_string(),
                project_type: "cli_tool".to_string(),
                technology_stack: strings(&["python", "rich", "json"]),
                main_features: strings(&["add tasks", "list tasks", "mark complete", "delete tasks"]),
                folder_structure: folders,
                essential_files: standard_files(&[("src/ui.py", "Console UI helpers")]),
                console_ui_needed: true,
                estimated_complexity: "low".to_string(),
            }
        } else if contains_any(description, &["web", "website"]) {
            Self {
                project_name: "web_app".to_string(),
                project_type: "web_app".to_string(),
                technology_stack: strings(&["python", "flask", "html", "css"]),
                main_features: strings(&["web interface", "routing", "templates"]),
                folder_structure: strings(&["src/", "tests/", "docs/", "config/", "templates/", "static/"]),
                essential_files: standard_files(&[]),
                console_ui_needed: false,
                estimated_complexity: "medium".to_string(),
            }
        } else if contains_any(description, &["game"]) {
            Self {
                project_name: "game_project".to_string(),
                project_type: "game".to_string(),
                technology_stack: strings(&["python", "pygame"]),
                main_features: strings(&["game loop", "player input", "scoring"]),
                folder_structure: strings(&["src/", "tests/", "docs/", "config/", "assets/"]),
                essential_files: standard_files(&[]),
                console_ui_needed: false,
                estimated_complexity: "medium".to_string(),
            }
        } else {
            Self {
                project_name: default_project_name(),
                project_type: default_project_type(),
                technology_stack: strings(&["python"]),
                main_features: strings(&["core functionality", "configuration", "tests"]),
                folder_structure: folders,
                essential_files: standard_files(&[]),
                console_ui_needed: false,
                estimated_complexity: default_complexity(),
            }
        }
    }

    /// Keeps the name usable as a directory: alphanumerics, `_` and `-` only.
    fn sanitize(mut self) -> Self {
        let name: String = self
            .project_name
            .trim()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        self.project_name = if name.is_empty() { default_project_name() } else { name };
        if self.essential_files.is_empty() {
            self.essential_files = standard_files(&[]);
        }
        if self.console_ui_needed {
            self.essential_files
                .entry("src/ui.py".to_string())
                .or_insert_with(|| "Console UI helpers".to_string());
        }
        self
    }

    pub fn title(&self) -> String {
        self.project_name
            .split(['_', '-'])
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                chars
                    .next()
                    .map(|c| c.to_uppercase().chain(chars).collect::<String>())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text shown to the approver
    pub fn summary(&self) -> String {
        format!(
            "🏗️  Project: {}\n📦 Type: {}\n🛠️  Stack: {}\n✨ Features: {}\n📁 Folders: {}\n📄 Files: {}\n🖥️  Console UI: {}",
            self.project_name,
            self.project_type,
            self.technology_stack.join(", "),
            self.main_features.join(", "),
            self.folder_structure.join(", "),
            self.essential_files.len(),
            if self.console_ui_needed { "yes" } else { "no" },
        )
    }

    fn tree(&self) -> String {
        let mut entries: Vec<String> = self
            .folder_structure
            .iter()
            .map(|f| format!("├── {}/", f.trim_end_matches('/')))
            .collect();
        entries.extend(self.essential_files.keys().map(|f| format!("├── {}", f)));
        entries.join("\n")
    }

    pub fn to_spec(&self) -> ProjectSpec {
        let files = self
            .essential_files
            .keys()
            .filter(|path| !path.split('/').any(|part| part == "..") && !path.starts_with('/'))
            .map(|path| (path.clone(), generate_content(path, self)))
            .collect();
        ProjectSpec {
            name: self.project_name.clone(),
            folders: self
                .folder_structure
                .iter()
                .map(|f| f.trim_end_matches('/').to_string())
                .filter(|f| !f.is_empty())
                .collect(),
            files,
        }
    }
}

pub async fn analyze_project(description: &str, ctx: &ToolContext) -> ProjectAnalysis {
    let analysis = match ctx.ask_llm(&prompts::project_analysis(description), None).await {
        Some(reply) => extract_json(&reply)
            .and_then(|value| serde_json::from_value::<ProjectAnalysis>(value).ok())
            .unwrap_or_else(|| {
                tracing::debug!("Unparseable project analysis, using keyword rules");
                ProjectAnalysis::fallback(description)
            }),
        None => ProjectAnalysis::fallback(description),
    };
    analysis.sanitize()
}

fn requirements(analysis: &ProjectAnalysis) -> String {
    const PACKAGES: [(&str, &str); 10] = [
        ("rich", "rich>=13.0.0"),
        ("flask", "flask>=2.3.0"),
        ("django", "django>=4.2.0"),
        ("fastapi", "fastapi>=0.100.0"),
        ("pygame", "pygame>=2.5.0"),
        ("requests", "requests>=2.25.0"),
        ("pandas", "pandas>=2.0.0"),
        ("numpy", "numpy>=1.24.0"),
        ("pytest", "pytest>=7.0.0"),
        ("langchain", "langchain>=0.1.0"),
    ];
    let stack = analysis.technology_stack.join(" ").to_lowercase();
    let mut lines: Vec<&str> = PACKAGES
        .iter()
        .filter(|(key, _)| stack.contains(key) || (*key == "rich" && analysis.console_ui_needed))
        .map(|(_, line)| *line)
        .collect();
    if lines.is_empty() {
        lines.push("requests>=2.25.0");
    }
    format!("{}\n", lines.join("\n"))
}

fn config_json(analysis: &ProjectAnalysis) -> String {
    let config = serde_json::json!({
        "app_name": analysis.project_name,
        "version": "1.0.0",
        "project_type": analysis.project_type,
        "created_by": "ADE Advanced Project Creator",
        "created_at": chrono::Local::now().to_rfc3339(),
        "settings": {"debug": false, "logging_level": "INFO"},
        "features": analysis.main_features,
    });
    serde_json::to_string_pretty(&config).unwrap_or_else(|_| "{}".to_string())
}

fn feature_stubs(analysis: &ProjectAnalysis) -> String {
    analysis
        .main_features
        .iter()
        .map(|f| format!("        print(\"  • {}\")", f.replace('"', "'")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn main_py(analysis: &ProjectAnalysis) -> String {
    let title = analysis.title();
    if analysis.project_type == "cli_tool" && analysis.project_name.contains("todo") {
        templates::PROJECT_TODO_APP.replace("{{TITLE}}", &title)
    } else if analysis.project_type == "web_app" {
        templates::PROJECT_WEB_APP
            .replace("{{TITLE}}", &title)
            .replace("{{NAME}}", &analysis.project_name)
    } else {
        templates::PROJECT_MAIN
            .replace("{{TITLE}}", &title)
            .replace("{{FEATURE_STUBS}}", &feature_stubs(analysis))
    }
}

/// File body for `path`, chosen by file name.
pub fn generate_content(path: &str, analysis: &ProjectAnalysis) -> String {
    let title = analysis.title();
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name {
        "README.md" => templates::PROJECT_README
            .replace("{{TITLE}}", &title)
            .replace("{{NAME}}", &analysis.project_name)
            .replace("{{PROJECT_TYPE}}", &analysis.project_type.replace('_', " "))
            .replace("{{TECH_STACK}}", &analysis.technology_stack.join(", "))
            .replace(
                "{{FEATURES}}",
                &analysis
                    .main_features
                    .iter()
                    .map(|f| format!("- {}", f))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
            .replace("{{TREE}}", &analysis.tree())
            .replace("{{DATE}}", &chrono::Local::now().format("%Y-%m-%d").to_string()),
        "main.py" => main_py(analysis),
        "requirements.txt" => requirements(analysis),
        "config.json" => config_json(analysis),
        "__init__.py" => format!("\"\"\"{} package\"\"\"\n\n__version__ = \"1.0.0\"\n", title),
        "ui.py" => templates::PROJECT_UI.to_string(),
        name if name.starts_with("test_") && name.ends_with(".py") => {
            templates::PROJECT_TEST.replace("{{TITLE}}", &title)
        }
        name if name.ends_with(".py") => format!("\"\"\"\n{} - {}\n\"\"\"\n", title, name),
        name if name.ends_with(".md") => format!("# {}\n", title),
        name if name.ends_with(".json") => "{}\n".to_string(),
        _ => String::new(),
    }
}

pub struct AdvancedProjectCreator;

#[async_trait]
impl Tool for AdvancedProjectCreator {
    fn name(&self) -> &'static str {
        "Advanced Project Creator"
    }

    fn description(&self) -> &'static str {
        "Creates a complete project structure (folders, README, main.py, requirements, config, tests) from a description. Asks for consent before writing. Input: the project description."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let args = ToolArgs::parse(input);
        let description = args.get("description", 0).unwrap_or_else(|| clean_input(input));
        let analysis = analyze_project(&description, ctx).await;
        tracing::info!("Project analysis ready: {} ({})", analysis.project_name, analysis.project_type);

        let summary = analysis.summary();
        if !ctx.approver.approve(&format!("Create this project?\n{}", summary)) {
            return Ok("❌ Project creation cancelled by user.".to_string());
        }

        let mut creator = FileSystemCreator::new(&ctx.workspace);
        creator.create_project_structure(&analysis.to_spec())?;
        let root = ctx.workspace.join(&analysis.project_name);
        let files = creator
            .list_created_items()
            .iter()
            .filter(|i| i.kind == ItemKind::File)
            .count();

        Ok(format!(
            "🎉 Project '{}' created successfully!\n\n📍 Location: {}\n{}\n📊 Created {} items ({} files)\n\n🚀 Next steps:\n1. cd {}\n2. pip install -r requirements.txt\n3. python main.py",
            analysis.project_name,
            root.display(),
            summary,
            creator.list_created_items().len(),
            files,
            root.display(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::FakeLlm;
    use crate::application::tools::test_support;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_fallback_keywords() {
        let todo = ProjectAnalysis::fallback("a TODO manager");
        assert_eq!((todo.project_name.as_str(), todo.project_type.as_str()), ("todo_app", "cli_tool"));
        assert!(todo.console_ui_needed);
        assert_eq!(ProjectAnalysis::fallback("my website").project_type, "web_app");
        assert_eq!(ProjectAnalysis::fallback("snake game").project_name, "game_project");
        let other = ProjectAnalysis::fallback("data cruncher");
        assert_eq!((other.project_name.as_str(), other.project_type.as_str()), ("ai_generated_project", "python_app"));
    }

    #[test]
    fn test_sanitize_and_title() {
        let mut analysis = ProjectAnalysis::fallback("x");
        analysis.project_name = "my cool/../app!".to_string();
        let analysis = analysis.sanitize();
        assert_eq!(analysis.project_name, "my_coolapp");
        assert_eq!(analysis.title(), "My Coolapp");
    }

    #[test]
    fn test_generated_files() {
        let analysis = ProjectAnalysis::fallback("todo list").sanitize();
        let main = generate_content("main.py", &analysis);
        assert!(!main.contains("{{"));
        assert!(main.contains("Todo App"));

        let reqs = generate_content("requirements.txt", &analysis);
        assert!(reqs.contains("rich>=13.0.0"));

        let config: serde_json::Value = serde_json::from_str(&generate_content("config.json", &analysis)).unwrap();
        assert_eq!(config["app_name"], "todo_app");
        assert_eq!(config["settings"]["logging_level"], "INFO");

        let readme = generate_content("README.md", &analysis);
        assert!(readme.starts_with("# Todo App"));
        assert!(readme.contains("- add tasks"));
        assert!(!readme.contains("{{"));

        let generic = ProjectAnalysis::fallback("thing").sanitize();
        assert_eq!(generate_content("requirements.txt", &generic), "requests>=2.25.0\n");
        assert!(generate_content("src/__init__.py", &generic).contains("__version__ = \"1.0.0\""));
    }

    #[tokio::test]
    async fn test_creates_project_from_llm_json() {
        let dir = TempDir::new().unwrap();
        let reply = r#"Here you go: {"project_name": "weather_cli", "project_type": "cli_tool",
            "technology_stack": ["python", "requests"], "main_features": ["fetch forecast"],
            "folder_structure": ["src/", "tests/"],
            "essential_files": {"README.md": "docs", "main.py": "entry", "tests/test_main.py": "tests"},
            "console_ui_needed": false}"#;
        let llm = Arc::new(FakeLlm::new(&[reply]));
        let ctx = test_support::context(dir.path(), Some(llm), true);

        let out = AdvancedProjectCreator.call("weather command line tool", &ctx).await.unwrap();
        assert!(out.starts_with("🎉 Project 'weather_cli' created successfully!"));
        let root = ctx.workspace.join("weather_cli");
        assert!(root.join("src").is_dir());
        assert!(root.join("tests/test_main.py").is_file());
        assert!(fs::read_to_string(root.join("main.py")).unwrap().contains("• fetch forecast"));
    }

    #[tokio::test]
    async fn test_refusal_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let ctx = test_support::context(dir.path(), None, false);
        let out = AdvancedProjectCreator.call("todo app", &ctx).await.unwrap();
        assert_eq!(out, "❌ Project creation cancelled by user.");
        assert!(!ctx.workspace.join("todo_app").exists());
    }
}
