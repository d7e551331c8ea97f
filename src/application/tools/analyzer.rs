//! # File Analyzer
//!
//! Categorizes a file, samples its text and produces either a model-backed report or
//! heuristic statistics. `Quick File Summary` never calls the model.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use super::{Tool, ToolArgs, ToolContext, clean_input};
use crate::application::utils::{ellipsize, extract_json, format_size, resolve_path};
use crate::strings::prompts;

const BINARY_SIZE_LIMIT: u64 = 1024 * 1024;

const CATEGORIES: [(&str, &[&str]); 7] = [
    ("code", &["py", "js", "ts", "java", "cpp", "c", "h", "cs", "go", "rs", "php", "rb", "swift"]),
    ("config", &["json", "yaml", "yml", "toml", "ini", "cfg", "conf", "xml"]),
    ("documentation", &["md", "txt", "rst", "tex", "rtf"]),
    ("data", &["csv", "xlsx", "sql"]),
    ("web", &["html", "htm", "css"]),
    ("image", &["jpg", "jpeg", "png", "gif", "bmp", "svg"]),
    ("binary", &["exe", "dll", "so", "dylib", "bin"]),
];

/// Category for the file extension, `unknown` when none matches.
pub fn categorize(path: &Path) -> &'static str {
    let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
        return "unknown";
    };
    CATEGORIES
        .iter()
        .find(|(_, exts)| exts.contains(&ext.as_str()))
        .map(|(category, _)| *category)
        .unwrap_or("unknown")
}

/// A null byte in the first KB means binary, otherwise the sample must decode as UTF-8.
pub fn is_text_file(path: &Path) -> bool {
    let mut sample = Vec::with_capacity(1024);
    let Ok(file) = File::open(path) else {
        return false;
    };
    if file.take(1024).read_to_end(&mut sample).is_err() {
        return false;
    }
    if sample.contains(&0) {
        return false;
    }
    match std::str::from_utf8(&sample) {
        Ok(_) => true,
        // A multi-byte character cut by the sample boundary is still text
        Err(e) => e.error_len().is_none(),
    }
}

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub category: &'static str,
    pub is_text: bool,
    pub modified: Option<String>,
}

impl FileInfo {
    pub fn read(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).with_context(|| format!("Cannot stat {}", path.display()))?;
        let category = categorize(path);
        let is_text = meta.len() <= BINARY_SIZE_LIMIT && category != "binary" && is_text_file(path);
        let modified = meta.modified().ok().map(|t| {
            chrono::DateTime::<chrono::Local>::from(t)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        });
        Ok(Self {
            path: path.to_path_buf(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            size: meta.len(),
            category,
            is_text,
            modified,
        })
    }
}

/// First `max_lines` lines and the total line count.
pub fn read_sample(path: &Path, max_lines: usize) -> Result<(String, usize)> {
    let content = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let total = content.lines().count();
    let sample = content.lines().take(max_lines).collect::<Vec<_>>().join("\n");
    Ok((sample, total))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicStats {
    pub lines: usize,
    pub non_empty: usize,
    pub functions: usize,
    pub classes: usize,
    pub imports: usize,
    pub complexity: &'static str,
}

impl HeuristicStats {
    pub fn from_text(text: &str) -> Self {
        let trimmed: Vec<&str> = text.lines().map(str::trim_start).collect();
        let count = |prefixes: &[&str]| {
            trimmed
                .iter()
                .filter(|l| prefixes.iter().any(|p| l.starts_with(p)))
                .count()
        };
        let lines = trimmed.len();
        let functions = count(&["def ", "async def ", "fn ", "pub fn ", "async fn ", "pub async fn ", "function "]);
        let complexity = if lines > 500 || functions > 10 {
            "high"
        } else if lines > 100 || functions > 5 {
            "medium"
        } else {
            "low"
        };
        Self {
            lines,
            non_empty: trimmed.iter().filter(|l| !l.is_empty()).count(),
            functions,
            classes: count(&["class ", "struct ", "pub struct "]),
            imports: count(&["import ", "from ", "use ", "#include", "require("]),
            complexity,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileAnalysis {
    pub summary: String,
    pub purpose: String,
    pub file_type: String,
    pub key_components: Vec<String>,
    pub technologies: Vec<String>,
    pub complexity: String,
    pub main_functions: Vec<String>,
    pub dependencies: Vec<String>,
    pub key_insights: Vec<String>,
    pub potential_issues: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub code_quality: String,
    pub estimated_lines_of_logic: serde_json::Value,
}

fn bullet_section(out: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push(format!("\n{}:", title));
    out.extend(items.iter().map(|i| format!("   • {}", i)));
}

fn header(info: &FileInfo) -> Vec<String> {
    let rule = "=".repeat(80);
    vec![
        "📄 INTELLIGENT FILE ANALYSIS REPORT".to_string(),
        rule.clone(),
        "\n📋 FILE INFORMATION:".to_string(),
        format!("   Name: {}", info.name),
        format!("   Path: {}", info.path.display()),
        format!("   Size: {}", format_size(info.size)),
        format!("   Category: {}", info.category),
        format!("   Modified: {}", info.modified.as_deref().unwrap_or("unknown")),
    ]
}

fn stats_section(out: &mut Vec<String>, stats: &HeuristicStats) {
    out.push("\n📊 STATISTICS:".to_string());
    out.push(format!("   Lines: {} ({} non-empty)", stats.lines, stats.non_empty));
    out.push(format!("   Functions: {}", stats.functions));
    out.push(format!("   Classes: {}", stats.classes));
    out.push(format!("   Imports: {}", stats.imports));
    out.push(format!("   Complexity: {}", stats.complexity));
}

pub fn format_report(info: &FileInfo, stats: &HeuristicStats, analysis: Option<&FileAnalysis>) -> String {
    let mut out = header(info);
    stats_section(&mut out, stats);
    match analysis {
        Some(a) => {
            out.push("\n🤖 AI ANALYSIS:".to_string());
            out.push(format!("   Summary: {}", a.summary));
            out.push(format!("   Purpose: {}", a.purpose));
            if !a.file_type.is_empty() {
                out.push(format!("   Type: {}", a.file_type));
            }
            if !a.complexity.is_empty() {
                out.push(format!("   Complexity: {}", a.complexity));
            }
            if !a.code_quality.is_empty() {
                out.push(format!("   Code quality: {}", a.code_quality));
            }
            bullet_section(&mut out, "🧩 KEY COMPONENTS", &a.key_components);
            bullet_section(&mut out, "🛠️  TECHNOLOGIES", &a.technologies);
            bullet_section(&mut out, "⚙️  MAIN FUNCTIONS", &a.main_functions);
            bullet_section(&mut out, "📦 DEPENDENCIES", &a.dependencies);
            bullet_section(&mut out, "💡 KEY INSIGHTS", &a.key_insights);
            bullet_section(&mut out, "⚠️  POTENTIAL ISSUES", &a.potential_issues);
            bullet_section(&mut out, "🚀 IMPROVEMENT SUGGESTIONS", &a.improvement_suggestions);
        }
        None => out.push("\n⚠️  AI analysis unavailable, heuristic statistics only.".to_string()),
    }
    out.push(format!("\n{}", "=".repeat(80)));
    out.join("\n")
}

/// One-paragraph summary: size, category, line counts and a short preview.
pub fn quick_summary(info: &FileInfo) -> Result<String> {
    if !info.is_text {
        return Ok(format!(
            "📄 {}: Binary file ({}) - {}",
            info.name,
            format_size(info.size),
            info.category
        ));
    }
    let (sample, total) = read_sample(&info.path, 10)?;
    let stats = HeuristicStats::from_text(&fs::read_to_string(&info.path)?);
    let preview = sample
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with("//"))
        .take(3)
        .map(|l| ellipsize(l, 60))
        .collect::<Vec<_>>()
        .join(" | ");
    Ok(format!(
        "📄 {} ({})\n   Category: {}\n   Lines: {} ({} non-empty)\n   Preview: {}",
        info.name,
        format_size(info.size),
        info.category,
        total,
        stats.non_empty,
        preview
    ))
}

fn target_path(input: &str, ctx: &ToolContext) -> PathBuf {
    let args = ToolArgs::parse(input);
    let path = args.get("filepath", 0).unwrap_or_else(|| clean_input(input));
    resolve_path(&ctx.cwd, &path)
}

pub struct IntelligentFileAnalyzer;

#[async_trait]
impl Tool for IntelligentFileAnalyzer {
    fn name(&self) -> &'static str {
        "Intelligent File Analyzer"
    }

    fn description(&self) -> &'static str {
        "Analyzes a file in depth: purpose, components, technologies, complexity and improvement suggestions. Input: the file path."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let path = target_path(input, ctx);
        if !path.is_file() {
            return Ok(format!("❌ File not found: {}", path.display()));
        }
        let info = FileInfo::read(&path)?;
        if !info.is_text {
            let mut out = header(&info);
            out.push("\n⚠️  Binary or oversized file, content analysis skipped.".to_string());
            return Ok(out.join("\n"));
        }

        let (sample, total) = read_sample(&path, ctx.config.tools.analyzer_max_lines)?;
        let mut stats = HeuristicStats::from_text(&sample);
        stats.lines = total;

        let prompt = prompts::file_analysis(
            &path.display().to_string(),
            info.category,
            &format_size(info.size),
            total,
            &sample,
        );
        let analysis = match ctx.ask_llm(&prompt, Some(0.1)).await {
            Some(reply) => extract_json(&reply).and_then(|v| serde_json::from_value::<FileAnalysis>(v).ok()),
            None => None,
        };
        if analysis.is_none() {
            tracing::debug!("No model analysis for {}, reporting heuristics", path.display());
        }
        Ok(format_report(&info, &stats, analysis.as_ref()))
    }
}

pub struct QuickFileSummary;

#[async_trait]
impl Tool for QuickFileSummary {
    fn name(&self) -> &'static str {
        "Quick File Summary"
    }

    fn description(&self) -> &'static str {
        "Fast summary of a file (size, category, line counts, preview) without AI analysis. Input: the file path."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let path = target_path(input, ctx);
        if !path.is_file() {
            return Ok(format!("❌ File not found: {}", path.display()));
        }
        quick_summary(&FileInfo::read(&path)?)
    }
}
