//! # Web Client
//!
//! Shared HTTP access for the search and scraping tools, plus best-effort HTML text
//! extraction. Responses from third-party sites are treated as untrusted text.

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use std::time::Duration;

use crate::domain::config::WebConfig;

/// HTTP client reused across requests
fn http_client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// Thin wrapper carrying the user agents and timeouts from `WebConfig`.
#[derive(Debug, Clone)]
pub struct WebClient {
    config: WebConfig,
}

impl WebClient {
    pub fn new(config: &WebConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// GET a JSON API with the agent user agent.
    pub async fn get_json(&self, url: &str, timeout_secs: u64) -> Result<serde_json::Value> {
        let response = http_client()
            .get(url)
            .timeout(Duration::from_secs(timeout_secs))
            .header("User-Agent", &self.config.user_agent)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {} from {}", status, url));
        }
        response
            .json::<serde_json::Value>()
            .await
            .with_context(|| format!("Invalid JSON from {}", url))
    }

    /// GET a page with the browser user agent and return the raw body.
    pub async fn get_page(&self, url: &str, timeout_secs: u64) -> Result<String> {
        let response = http_client()
            .get(url)
            .timeout(Duration::from_secs(timeout_secs))
            .header("User-Agent", &self.config.browser_agent)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {} from {}", status, url));
        }
        response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))
    }

    /// Status code of a plain GET, used as a connectivity probe.
    pub async fn probe(&self, url: &str, timeout_secs: u64) -> Result<u16> {
        let response = http_client()
            .get(url)
            .timeout(Duration::from_secs(timeout_secs))
            .header("User-Agent", &self.config.user_agent)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;
        Ok(response.status().as_u16())
    }
}

/// `quote_plus` style encoding for query strings.
pub fn quote_plus(query: &str) -> String {
    urlencoding::encode(query).replace("%20", "+")
}

fn script_style_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script>|<style\b[^>]*>.*?</style>|<noscript\b[^>]*>.*?</noscript>")
            .expect("static regex")
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]+>").expect("static regex"))
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Removes `<script>`, `<style>` and `<noscript>` blocks.
pub fn strip_scripts(html: &str) -> String {
    script_style_regex().replace_all(html, " ").to_string()
}

/// Converts an HTML fragment to a single line of plain text.
pub fn inline_text(fragment: &str) -> String {
    let without_tags = tag_regex().replace_all(fragment, " ");
    let decoded = decode_entities(&without_tags);
    whitespace_regex().replace_all(&decoded, " ").trim().to_string()
}

/// Converts a page to readable text: scripts dropped, one phrase per line, blank lines removed.
pub fn html_to_text(html: &str) -> String {
    let cleaned = strip_scripts(html);
    let rendered = html2text::from_read(cleaned.as_bytes(), 120)
        .unwrap_or_else(|_| inline_text(&cleaned));
    rendered
        .lines()
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of every element with one of the given tag names, in document order per tag.
pub fn tag_texts(html: &str, tags: &[&str]) -> Vec<String> {
    let cleaned = strip_scripts(html);
    let mut found: Vec<(usize, String)> = Vec::new();
    for tag in tags {
        let pattern = format!(r"(?is)<{tag}\b[^>]*>(.*?)</{tag}\s*>");
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        for caps in re.captures_iter(&cleaned) {
            if let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) {
                let text = inline_text(inner.as_str());
                if !text.is_empty() {
                    found.push((whole.start(), text));
                }
            }
        }
    }
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, text)| text).collect()
}

/// Text of elements carrying any of the given CSS classes, in document order.
pub fn class_texts(html: &str, classes: &[&str]) -> Vec<String> {
    let cleaned = strip_scripts(html);
    let mut found: Vec<(usize, String)> = Vec::new();
    for class in classes {
        let pattern = format!(
            r#"(?is)<(?:div|span|p|a|li|h[1-6]|section)\b[^>]*class\s*=\s*["'][^"']*\b{}\b[^"']*["'][^>]*>(.*?)</(?:div|span|p|a|li|h[1-6]|section)\s*>"#,
            regex::escape(class)
        );
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        for caps in re.captures_iter(&cleaned) {
            if let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) {
                let text = inline_text(inner.as_str());
                if !text.is_empty() {
                    found.push((whole.start(), text));
                }
            }
        }
    }
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, text)| text).collect()
}

/// Best-effort main content: `<main>`, `<article>`, then content/post containers.
pub fn main_content(html: &str) -> Option<String> {
    let cleaned = strip_scripts(html);
    let selectors = [
        r"(?is)<main\b[^>]*>(.*?)</main\s*>",
        r"(?is)<article\b[^>]*>(.*?)</article\s*>",
        r#"(?is)<(?:div|section)\b[^>]*(?:class|id)\s*=\s*["'][^"']*\b(?:content|post|entry-content)\b[^"']*["'][^>]*>(.*?)</(?:div|section)\s*>"#,
    ];
    for selector in selectors {
        let Ok(re) = Regex::new(selector) else {
            continue;
        };
        for caps in re.captures_iter(&cleaned).take(2) {
            if let Some(inner) = caps.get(1) {
                let text = inline_text(inner.as_str());
                if text.chars().count() > 100 {
                    return Some(text);
                }
            }
        }
    }
    None
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&deg;", "°")
}
