use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Truncates to at most `max` characters (not bytes).
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Truncates and appends `...` when the text was cut.
pub fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", truncate_chars(text, max))
    } else {
        text.to_string()
    }
}

/// Human readable byte size, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

fn json_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

/// Finds the outermost `{...}` span in an LLM reply and parses it.
pub fn extract_json(text: &str) -> Option<serde_json::Value> {
    let found = json_object_regex().find(text)?;
    serde_json::from_str(found.as_str()).ok()
}

/// Removes markdown code fences the model tends to wrap generated files in.
pub fn strip_code_fences(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.first().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim() == "```") {
        lines.pop();
    }
    let joined = lines.join("\n");
    joined.replace("```", "")
}

/// Resolves `path` against `base` unless it is already absolute.
pub fn resolve_path(base: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path.trim());
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}

/// Lowercased keyword test used by the rule-based routers.
pub fn contains_any(haystack: &str, words: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    words.iter().any(|w| lower.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(ellipsize("abcdef", 3), "abc...");
        assert_eq!(ellipsize("abc", 3), "abc");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_extract_json_from_chatty_reply() {
        let reply = "Sure! Here is the plan:\n```json\n{\"a\": 1, \"b\": {\"c\": 2}}\n```\nDone.";
        let value = extract_json(reply).unwrap();
        assert_eq!(value["b"]["c"], 2);
        assert!(extract_json("no json here").is_none());
        assert!(extract_json("{broken").is_none());
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```python\nprint(1)\n```"), "print(1)");
        assert_eq!(strip_code_fences("plain"), "plain");
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/work");
        assert_eq!(resolve_path(base, "a/b.txt"), PathBuf::from("/work/a/b.txt"));
        #[cfg(unix)]
        assert_eq!(resolve_path(base, "/abs/c"), PathBuf::from("/abs/c"));
    }
}
