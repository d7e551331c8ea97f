//! # Search Tools
//!
//! Keyless web search (DuckDuckGo instant answers, Wikipedia, GitHub), a documentation link
//! table and a page-to-text fetcher. Every source is best effort.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::{Tool, ToolArgs, ToolContext, clean_input};
use crate::application::utils::{contains_any, ellipsize, truncate_chars};
use crate::infrastructure::web::{html_to_text, quote_plus};

const WEATHER_WORDS: [&str; 5] = ["weather", "temperature", "rain", "forecast", "climate"];
const CODE_WORDS: [&str; 6] = ["python", "javascript", "code", "programming", "library", "framework"];
const SEPARATOR_WIDTH: usize = 60;

fn header(query: &str) -> String {
    format!("🔍 Search Results for: '{}'\n{}", query, "=".repeat(SEPARATOR_WIDTH))
}

/// Instant answer, abstract and related topics from a DuckDuckGo response.
pub fn format_duckduckgo(data: &Value) -> Vec<String> {
    let mut results = Vec::new();
    let text = |key: &str| data.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());

    if let Some(answer) = text("Answer") {
        results.push(format!("📋 Instant Answer: {}", answer));
        if let Some(kind) = text("AnswerType") {
            results.push(format!("   Type: {}", kind));
        }
    }
    if let Some(abstract_text) = text("Abstract").filter(|a| a.chars().count() > 50) {
        results.push(format!("\n📖 Information: {}", abstract_text));
        if let Some(source) = text("AbstractSource") {
            results.push(format!("   Source: {}", source));
        }
        if let Some(url) = text("AbstractURL") {
            results.push(format!("   More info: {}", url));
        }
    }

    let topics: Vec<&Value> = data
        .get("RelatedTopics")
        .and_then(Value::as_array)
        .map(|t| t.iter().take(3).collect())
        .unwrap_or_default();
    if !topics.is_empty() && results.len() < 3 {
        let mut related = Vec::new();
        let mut count = 0;
        for topic in topics {
            let Some(text) = topic.get("Text").and_then(Value::as_str) else {
                continue;
            };
            count += 1;
            related.push(format!("   {}. {}", count, ellipsize(text, 150)));
            if let Some(url) = topic.get("FirstURL").and_then(Value::as_str) {
                related.push(format!("      🌐 {}", url));
            }
        }
        if !related.is_empty() {
            results.push("\n🔗 Related Information:".to_string());
            results.extend(related);
        }
    }
    results
}

/// Extract from a Wikipedia REST summary, if it has one worth showing.
pub fn format_wikipedia_summary(data: &Value) -> Vec<String> {
    let Some(extract) = data
        .get("extract")
        .and_then(Value::as_str)
        .filter(|e| e.chars().count() > 50)
    else {
        return Vec::new();
    };
    let mut results = vec![format!("\n📚 Wikipedia: {}", ellipsize(extract, 300))];
    if let Some(page) = data.pointer("/content_urls/desktop/page").and_then(Value::as_str) {
        results.push(format!("   Full article: {}", page));
    }
    results
}

fn weather_guidance(query: &str) -> Vec<String> {
    let encoded = quote_plus(query);
    let mut city = query.to_lowercase();
    for word in ["weather", "temperature", "forecast"] {
        city = city.replace(word, "");
    }
    vec![
        "\n🌤️ Weather Information:".to_string(),
        format!("   For current weather in {}:", city.trim()),
        format!("   • Check: https://weather.com/search/results?where={}", encoded),
        format!("   • Or: https://openweathermap.org/find?q={}", encoded),
        "   Note: Real-time weather requires specialized weather APIs".to_string(),
    ]
}

/// Top repositories from a GitHub search response.
pub fn format_github(data: &Value) -> Vec<String> {
    let Some(items) = data.get("items").and_then(Value::as_array).filter(|i| !i.is_empty()) else {
        return Vec::new();
    };
    let mut results = vec!["\n💻 GitHub Projects:".to_string()];
    for (i, repo) in items.iter().take(2).enumerate() {
        let name = repo.get("full_name").and_then(Value::as_str).unwrap_or("unknown");
        let stars = repo.get("stargazers_count").and_then(Value::as_u64).unwrap_or(0);
        results.push(format!("   {}. {} ⭐ {}", i + 1, name, stars));
        if let Some(desc) = repo.get("description").and_then(Value::as_str) {
            results.push(format!("      {}", ellipsize(desc, 100)));
        }
        if let Some(url) = repo.get("html_url").and_then(Value::as_str) {
            results.push(format!("      🌐 {}", url));
        }
    }
    results
}

fn manual_search(query: &str) -> String {
    let encoded = quote_plus(query);
    format!(
        "{}\n\nNo specific results found, but you can try:\n\n🌐 Manual Search Options:\n   • DuckDuckGo: https://duckduckgo.com/?q={e}\n   • Google: https://google.com/search?q={e}\n   • Wikipedia: https://en.wikipedia.org/wiki/Special:Search?search={e}\n\n💡 Tips: Try more specific keywords or check if you need real-time data",
        header(query),
        e = encoded
    )
}

pub struct WebSearch;

impl WebSearch {
    async fn search(&self, query: &str, ctx: &ToolContext) -> Vec<String> {
        let encoded = quote_plus(query);
        let timeout = ctx.config.web.search_timeout;
        let mut results = Vec::new();

        let ddg = format!(
            "https://api.duckduckgo.com/?q={}&format=json&no_html=1&skip_disambig=1",
            encoded
        );
        match ctx.web.get_json(&ddg, timeout).await {
            Ok(data) => results.extend(format_duckduckgo(&data)),
            Err(e) => tracing::debug!("DuckDuckGo search failed: {:#}", e),
        }

        let summary_url = format!("https://en.wikipedia.org/api/rest_v1/page/summary/{}", encoded);
        match ctx.web.get_json(&summary_url, timeout).await {
            Ok(data) => results.extend(format_wikipedia_summary(&data)),
            Err(_) if results.is_empty() => {
                let search_url = format!("https://en.wikipedia.org/api/rest_v1/page/search/{}", encoded);
                if let Ok(data) = ctx.web.get_json(&search_url, timeout).await {
                    if let Some(page) = data.pointer("/pages/0") {
                        let title = page.get("title").and_then(Value::as_str).unwrap_or_default();
                        let key = page.get("key").and_then(Value::as_str).unwrap_or(title);
                        if let Some(desc) = page.get("description").and_then(Value::as_str) {
                            results.push(format!("\n📚 Wikipedia: {} - {}", title, desc));
                            results.push(format!("   Read more: https://en.wikipedia.org/wiki/{}", key));
                        }
                    }
                }
            }
            Err(e) => tracing::debug!("Wikipedia summary failed: {:#}", e),
        }

        if contains_any(query, &WEATHER_WORDS) && !results.iter().any(|r| r.to_lowercase().contains("weather")) {
            results.extend(weather_guidance(query));
        }

        if contains_any(query, &CODE_WORDS) {
            let github = format!(
                "https://api.github.com/search/repositories?q={}&sort=stars&order=desc&per_page=2",
                encoded
            );
            match ctx.web.get_json(&github, timeout).await {
                Ok(data) => results.extend(format_github(&data)),
                Err(e) => tracing::debug!("GitHub search failed: {:#}", e),
            }
        }
        results
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &'static str {
        "Web Search"
    }

    fn description(&self) -> &'static str {
        "Search the web using free APIs (DuckDuckGo, Wikipedia, GitHub). Input: the search query."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let query = clean_input(input);
        let results = self.search(&query, ctx).await;
        if results.is_empty() {
            return Ok(manual_search(&query));
        }
        Ok(format!("{}\n{}", header(&query), results.join("\n")))
    }
}

const DOC_TOPICS: [(&str, &str); 11] = [
    ("tools", "https://python.langchain.com/docs/modules/tools/"),
    ("agents", "https://python.langchain.com/docs/modules/agents/"),
    ("chains", "https://python.langchain.com/docs/modules/chains/"),
    ("memory", "https://python.langchain.com/docs/modules/memory/"),
    ("embeddings", "https://python.langchain.com/docs/modules/data_connection/text_embedding/"),
    ("vectorstores", "https://python.langchain.com/docs/modules/data_connection/vectorstores/"),
    ("chat models", "https://python.langchain.com/docs/modules/model_io/chat/"),
    ("llms", "https://python.langchain.com/docs/modules/model_io/llms/"),
    ("prompts", "https://python.langchain.com/docs/modules/model_io/prompts/"),
    ("callbacks", "https://python.langchain.com/docs/modules/callbacks/"),
    ("langgraph", "https://langchain-ai.github.io/langgraph/"),
];

/// Documentation links for a LangChain topic.
pub fn langchain_links(topic: &str) -> String {
    let topic_lower = topic.to_lowercase();
    let words: Vec<&str> = topic_lower.split_whitespace().collect();
    let matches: Vec<&(&str, &str)> = DOC_TOPICS
        .iter()
        .filter(|(key, _)| key.contains(topic_lower.as_str()) || words.iter().any(|w| key.contains(w)))
        .collect();

    let mut lines = Vec::new();
    if !topic_lower.is_empty() && !matches.is_empty() {
        lines.push(format!("LangChain Documentation for '{}':\n", topic));
        for (i, (key, url)) in matches.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, title_case(key)));
            lines.push(format!("   Documentation: {}", url));
        }
    }

    lines.push("\nGeneral LangChain Resources:".to_string());
    lines.push("• Main Documentation: https://python.langchain.com/docs/".to_string());
    lines.push("• API Reference: https://api.python.langchain.com/".to_string());
    lines.push("• GitHub Repository: https://github.com/langchain-ai/langchain".to_string());
    lines.push("• Community: https://github.com/langchain-ai/langchain/discussions".to_string());
    lines.push("• LangGraph (New Agent Framework): https://langchain-ai.github.io/langgraph/".to_string());

    if topic_lower.contains("tool") {
        lines.push("\n🔧 LangChain Tools Information:".to_string());
        lines.push("• Custom Tools: https://python.langchain.com/docs/modules/tools/custom_tools".to_string());
        lines.push("• Tool Calling: https://python.langchain.com/docs/modules/tools/tool_calling".to_string());
        lines.push("• Toolkits: https://python.langchain.com/docs/integrations/toolkits/".to_string());
        lines.push("• LangGraph Tools: https://langchain-ai.github.io/langgraph/how-tos/tool-calling/".to_string());
    }
    lines.join("\n")
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct LangChainSearch;

#[async_trait]
impl Tool for LangChainSearch {
    fn name(&self) -> &'static str {
        "LangChain Search"
    }

    fn description(&self) -> &'static str {
        "Search LangChain documentation and resources for specific topics. Input: the topic."
    }

    async fn call(&self, input: &str, _ctx: &ToolContext) -> Result<String> {
        Ok(langchain_links(&clean_input(input)))
    }
}

/// Truncates page text with the readability marker.
pub fn truncate_page(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        format!("{}\n\n[Content truncated for readability...]", truncate_chars(text, limit))
    } else {
        text.to_string()
    }
}

pub struct WebPageContent;

#[async_trait]
impl Tool for WebPageContent {
    fn name(&self) -> &'static str {
        "Get Web Page Content"
    }

    fn description(&self) -> &'static str {
        "Fetch the readable text content of a specific web page. Input: the URL."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let args = ToolArgs::parse(input);
        let url = args.get("url", 0).unwrap_or_else(|| clean_input(input));
        let html = match ctx.web.get_page(&url, ctx.config.web.page_timeout).await {
            Ok(html) => html,
            Err(e) => return Ok(format!("Error fetching webpage: {:#}", e)),
        };
        let text = truncate_page(&html_to_text(&html), ctx.config.web.page_limit);
        Ok(format!("Content from {}:\n\n{}", url, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_duckduckgo() {
        let data = json!({
            "Answer": "42",
            "AnswerType": "calc",
            "Abstract": "short",
            "RelatedTopics": [
                {"Text": "x".repeat(200), "FirstURL": "https://duckduckgo.com/a"},
                {"Name": "Category without text"},
                {"Text": "Second topic"}
            ]
        });
        let lines = format_duckduckgo(&data);
        assert_eq!(lines[0], "📋 Instant Answer: 42");
        assert_eq!(lines[1], "   Type: calc");
        assert!(lines.iter().all(|l| !l.contains("📖 Information:")));
        assert!(lines.contains(&"\n🔗 Related Information:".to_string()));
        assert!(lines.contains(&format!("   1. {}...", "x".repeat(150))));
        assert!(lines.contains(&"   2. Second topic".to_string()));
    }

    #[test]
    fn test_format_duckduckgo_empty() {
        assert!(format_duckduckgo(&json!({"Answer": "", "RelatedTopics": []})).is_empty());
    }

    #[test]
    fn test_format_wikipedia_and_github() {
        let wiki = json!({
            "extract": "Rust is a general-purpose programming language emphasizing performance and safety.",
            "content_urls": {"desktop": {"page": "https://en.wikipedia.org/wiki/Rust"}}
        });
        let lines = format_wikipedia_summary(&wiki);
        assert!(lines[0].starts_with("\n📚 Wikipedia: Rust is"));
        assert_eq!(lines[1], "   Full article: https://en.wikipedia.org/wiki/Rust");

        let github = json!({"items": [
            {"full_name": "rust-lang/rust", "stargazers_count": 100, "html_url": "https://github.com/rust-lang/rust"},
            {"full_name": "b/c", "stargazers_count": 5, "description": "desc"},
            {"full_name": "ignored/third", "stargazers_count": 1}
        ]});
        let lines = format_github(&github);
        assert_eq!(lines[1], "   1. rust-lang/rust ⭐ 100");
        assert!(lines.iter().any(|l| l.contains("b/c ⭐ 5")));
        assert!(!lines.iter().any(|l| l.contains("ignored")));
    }

    #[test]
    fn test_manual_search_links() {
        let text = manual_search("rust async");
        assert!(text.contains("https://duckduckgo.com/?q=rust+async"));
        assert!(text.starts_with("🔍 Search Results for: 'rust async'"));
    }

    #[test]
    fn test_weather_guidance_extracts_city() {
        let lines = weather_guidance("Jaipur weather");
        assert_eq!(lines[1], "   For current weather in jaipur:");
    }

    #[test]
    fn test_langchain_links() {
        let text = langchain_links("tools");
        assert!(text.contains("1. Tools"));
        assert!(text.contains("LangChain Tools Information"));

        let text = langchain_links("chat models");
        assert!(text.contains("Chat Models"));
        assert!(!text.contains("LangChain Tools Information"));
        assert!(text.contains("General LangChain Resources"));
    }

    #[test]
    fn test_truncate_page() {
        assert_eq!(truncate_page("short", 10), "short");
        assert_eq!(
            truncate_page("abcdefghij", 4),
            "abcd\n\n[Content truncated for readability...]"
        );
    }
}
