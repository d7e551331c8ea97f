//! # Universal Scraper
//!
//! Classifies a free-form query (with the model when one is configured, keyword rules
//! otherwise) and scrapes the sources that fit the query type. Real Time Weather queries
//! several weather sites concurrently and merges whatever they return.

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use super::scraper::{extract_conditions, extract_prices, extract_temperatures, title_case};
use super::{Tool, ToolContext, clean_input};
use crate::application::utils::{contains_any, extract_json, truncate_chars};
use crate::infrastructure::web::{class_texts, html_to_text, quote_plus, tag_texts};
use crate::strings::prompts;

/// How the query should be scraped
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryAnalysis {
    pub query_type: String,
    pub keywords: Vec<String>,
    pub target_sites: Vec<String>,
    pub search_terms: String,
    pub data_to_extract: Vec<String>,
    pub scraping_method: String,
}

impl Default for QueryAnalysis {
    fn default() -> Self {
        Self {
            query_type: "general".to_string(),
            keywords: Vec::new(),
            target_sites: Vec::new(),
            search_terms: String::new(),
            data_to_extract: Vec::new(),
            scraping_method: "google_search".to_string(),
        }
    }
}

impl QueryAnalysis {
    /// Rule-based classification used when the model is unavailable.
    pub fn fallback(query: &str) -> Self {
        let query_type = if contains_any(query, &["weather", "temperature", "forecast", "rain", "sunny"]) {
            "weather"
        } else if contains_any(query, &["news", "headlines", "breaking", "latest"]) {
            "news"
        } else if contains_any(query, &["price", "cost", "stock", "bitcoin", "crypto"]) {
            "price"
        } else if contains_any(query, &["score", "game", "match", "sports", "football", "cricket"]) {
            "sports"
        } else {
            "general"
        };
        Self {
            query_type: query_type.to_string(),
            keywords: query.split_whitespace().take(3).map(String::from).collect(),
            search_terms: query.to_string(),
            ..Self::default()
        }
    }

    /// Search terms, or the original query when the model left them out.
    fn terms<'a>(&'a self, query: &'a str) -> &'a str {
        if self.search_terms.trim().is_empty() {
            query
        } else {
            &self.search_terms
        }
    }

    /// First keyword that is not itself a weather word.
    pub fn city(&self) -> String {
        self.keywords
            .iter()
            .find(|k| !contains_any(k, &["weather", "temperature", "forecast"]))
            .cloned()
            .unwrap_or_else(|| "current location".to_string())
    }
}

pub async fn analyze_query(query: &str, ctx: &ToolContext) -> QueryAnalysis {
    let prompt = prompts::query_analysis(query);
    let Some(reply) = ctx.ask_llm(&prompt, Some(0.1)).await else {
        return QueryAnalysis::fallback(query);
    };
    extract_json(&reply)
        .and_then(|value| serde_json::from_value::<QueryAnalysis>(value).ok())
        .unwrap_or_else(|| {
            tracing::debug!("Unparseable query analysis, using keyword rules");
            QueryAnalysis::fallback(query)
        })
}

fn score_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,3})\s*[-:]\s*(\d{1,3})\b").expect("static regex"))
}

/// First `a-b` or `a:b` score in the text.
pub fn extract_score(text: &str) -> Option<String> {
    let caps = score_regex().captures(text)?;
    Some(format!("{}-{}", &caps[1], &caps[2]))
}

/// Temperature and condition summary for one source, `None` when the page has neither.
pub fn weather_summary(source: &str, html: &str) -> Option<String> {
    let text = html_to_text(html);
    let temperature = extract_temperatures(&text).into_iter().next();
    let condition = extract_conditions(&text).into_iter().next();
    if temperature.is_none() && condition.is_none() {
        return None;
    }
    let mut line = format!("{}:", source);
    if let Some(t) = temperature {
        line.push_str(&format!(" Temperature: {}", t));
    }
    if let Some(c) = condition {
        line.push_str(&format!(" Condition: {}", c));
    }
    Some(line)
}

async fn fetch(ctx: &ToolContext, url: &str) -> Option<String> {
    match ctx.web.get_page(url, ctx.config.web.search_timeout).await {
        Ok(html) => Some(html),
        Err(e) => {
            tracing::debug!("Scrape failed: {:#}", e);
            None
        }
    }
}

async fn scrape_weather(analysis: &QueryAnalysis, ctx: &ToolContext) -> Vec<String> {
    let city = analysis.city();
    let q = quote_plus(&city);
    let sources = [
        (format!("https://www.google.com/search?q=weather+{q}"), "🌤️ Google Weather"),
        (format!("https://weather.com/search/results?where={q}"), "🌤️ Weather.com"),
        (format!("https://www.accuweather.com/en/search-locations?query={q}"), "🌤️ AccuWeather"),
    ];
    let mut results = Vec::new();
    for (url, source) in &sources {
        if let Some(line) = fetch(ctx, url).await.and_then(|html| weather_summary(source, &html)) {
            results.push(line);
        }
    }
    if results.is_empty() {
        results.push(format!(
            "🌤️ Weather data not available. Try: https://weather.com/search/results?where={q}"
        ));
    }
    results
}

async fn scrape_prices(terms: &str, ctx: &ToolContext) -> Vec<String> {
    let q = quote_plus(terms);
    let sources = [
        (format!("https://www.google.com/search?q={q}+price"), "Google Finance"),
        (format!("https://finance.yahoo.com/search?p={q}"), "Yahoo Finance"),
    ];
    let mut results = Vec::new();
    for (url, source) in &sources {
        let Some(html) = fetch(ctx, url).await else {
            continue;
        };
        if let Some(price) = extract_prices(&html_to_text(&html), 1).into_iter().next() {
            results.push(format!("💰 {}: {}", source, price));
        }
    }
    if results.is_empty() {
        results.push(format!("💰 Price data not available. Try: https://finance.yahoo.com/search?p={q}"));
    }
    results
}

/// Up to three headlines between 20 and 150 characters.
pub fn news_headlines(html: &str) -> Vec<String> {
    tag_texts(html, &["h3", "h2"])
        .into_iter()
        .chain(class_texts(html, &["title", "headline"]))
        .filter(|h| (21..150).contains(&h.chars().count()))
        .take(3)
        .map(|h| format!("📰 {}", h))
        .collect()
}

async fn scrape_news(terms: &str, ctx: &ToolContext) -> Vec<String> {
    let q = quote_plus(terms);
    let sources = [
        format!("https://www.google.com/search?q={q}+news&tbm=nws"),
        format!("https://www.bing.com/news/search?q={q}"),
    ];
    for url in &sources {
        if let Some(html) = fetch(ctx, url).await {
            let headlines = news_headlines(&html);
            if !headlines.is_empty() {
                return headlines;
            }
        }
    }
    vec![format!("📰 News not available. Try: https://news.google.com/search?q={q}")]
}

async fn scrape_sports(terms: &str, ctx: &ToolContext) -> Vec<String> {
    let q = quote_plus(terms);
    let url = format!("https://www.google.com/search?q={q}+score+live");
    if let Some(score) = fetch(ctx, &url)
        .await
        .and_then(|html| extract_score(&html_to_text(&html)))
    {
        return vec![format!("⚽ Score: {}", score)];
    }
    vec![format!("⚽ Sports data not available. Try: https://www.google.com/search?q={q}")]
}

/// Featured snippets between 50 and 400 characters, at most two.
pub fn featured_snippets(html: &str) -> Vec<String> {
    class_texts(html, &["hgKElc", "BNeawe", "VwiC3b", "b_ans"])
        .into_iter()
        .filter(|t| (51..400).contains(&t.chars().count()))
        .take(2)
        .collect()
}

async fn scrape_general(terms: &str, ctx: &ToolContext) -> Vec<String> {
    let q = quote_plus(terms);
    let mut results = Vec::new();

    for (url, source) in [
        (format!("https://www.google.com/search?q={q}"), "Google"),
        (format!("https://www.bing.com/search?q={q}"), "Bing"),
    ] {
        if let Some(html) = fetch(ctx, &url).await {
            results.extend(
                featured_snippets(&html)
                    .into_iter()
                    .map(|s| format!("💡 {}: {}", source, s)),
            );
        }
        if results.len() >= 3 {
            return results;
        }
    }

    let ddg = format!("https://api.duckduckgo.com/?q={q}&format=json&no_html=1");
    if let Ok(data) = ctx.web.get_json(&ddg, ctx.config.web.search_timeout).await {
        let answer = data["Answer"].as_str().unwrap_or_default();
        let abstract_text = data["Abstract"].as_str().unwrap_or_default();
        if !answer.is_empty() {
            results.push(format!("🦆 DuckDuckGo: {}", answer));
        } else if abstract_text.chars().count() > 50 {
            results.push(format!("📖 DuckDuckGo: {}...", truncate_chars(abstract_text, 300)));
        }
    }

    if results.is_empty() {
        results.push(format!("🌐 Information not found. Try: https://www.google.com/search?q={q}"));
    }
    results
}

/// Header plus sections, or the manual-search message when nothing was found.
pub fn format_universal(query: &str, sections: &[String]) -> String {
    if sections.len() > 1 {
        format!(
            "🌐 **Universal Scraper Results for:** '{}'\n{}\n\n{}",
            query,
            "=".repeat(70),
            sections.join("\n\n")
        )
    } else {
        format!(
            "🌐 No specific results found for '{}'.\n\n🔗 Manual search: https://www.google.com/search?q={}",
            query,
            quote_plus(query)
        )
    }
}

pub struct UniversalWebScraper;

#[async_trait]
impl Tool for UniversalWebScraper {
    fn name(&self) -> &'static str {
        "Universal Web Scraper"
    }

    fn description(&self) -> &'static str {
        "Analyzes any query (weather, news, prices, stocks, sports scores, definitions) and scrapes the fitting sources. Input: the query."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let query = clean_input(input);
        let analysis = analyze_query(&query, ctx).await;
        let terms = analysis.terms(&query).to_string();

        let mut sections = vec![format!("🔍 **Query Analysis:** {}", title_case(&analysis.query_type))];
        sections.extend(match analysis.query_type.as_str() {
            "weather" => scrape_weather(&analysis, ctx).await,
            "price" | "stock" => scrape_prices(&terms, ctx).await,
            "news" => scrape_news(&terms, ctx).await,
            "sports" => scrape_sports(&terms, ctx).await,
            _ => scrape_general(&terms, ctx).await,
        });
        Ok(format_universal(&query, &sections))
    }
}

pub struct RealTimeWeather;

#[async_trait]
impl Tool for RealTimeWeather {
    fn name(&self) -> &'static str {
        "Real Time Weather"
    }

    fn description(&self) -> &'static str {
        "Current weather for a city from several weather services. Input: the city name."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let city = clean_input(input);
        let q = quote_plus(&city);
        let sources = [
            ("🔍 Google Weather", format!("https://www.google.com/search?q=weather+{q}")),
            ("📊 Weather.com", format!("https://weather.com/search/results?where={q}")),
            ("🌍 OpenWeatherMap", format!("https://openweathermap.org/find?q={q}")),
            ("🏢 AccuWeather", format!("https://www.accuweather.com/en/search-locations?query={q}")),
        ];

        let timeout = ctx.config.web.page_timeout;
        let pages = join_all(sources.iter().map(|(_, url)| ctx.web.get_page(url, timeout))).await;
        let lines: Vec<String> = sources
            .iter()
            .zip(pages)
            .filter_map(|((source, _), page)| page.ok().and_then(|html| weather_summary(source, &html)))
            .collect();

        Ok(if lines.is_empty() {
            format!(
                "🌤️ Weather in {city}:\n❌ Unable to fetch real-time data from weather services.\n\n🌐 Try checking:\n\
                 • https://weather.com/search/results?where={q}\n\
                 • https://www.google.com/search?q=weather+{q}\n\
                 • https://openweathermap.org/find?q={q}"
            )
        } else {
            format!("🌤️ Weather in {} (Real-time data):\n{}", city, lines.join("\n"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::FakeLlm;
    use crate::application::tools::test_support;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_fallback_classification() {
        assert_eq!(QueryAnalysis::fallback("Jaipur weather").query_type, "weather");
        assert_eq!(QueryAnalysis::fallback("latest AI headlines").query_type, "news");
        assert_eq!(QueryAnalysis::fallback("Tesla stock price").query_type, "price");
        assert_eq!(QueryAnalysis::fallback("India vs Pakistan score").query_type, "sports");
        assert_eq!(QueryAnalysis::fallback("what is machine learning").query_type, "general");

        let analysis = QueryAnalysis::fallback("weather in Jaipur today please");
        assert_eq!(analysis.keywords, vec!["weather", "in", "Jaipur"]);
        assert_eq!(analysis.search_terms, "weather in Jaipur today please");
        assert_eq!(analysis.scraping_method, "google_search");
    }

    #[test]
    fn test_city_skips_weather_words() {
        let analysis = QueryAnalysis {
            keywords: vec!["Weather".to_string(), "Delhi".to_string()],
            ..QueryAnalysis::default()
        };
        assert_eq!(analysis.city(), "Delhi");
        assert_eq!(QueryAnalysis::default().city(), "current location");
    }

    #[tokio::test]
    async fn test_llm_analysis_with_partial_json() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeLlm::new(&[
            "Here you go:\n{\"query_type\": \"stock\", \"search_terms\": \"TSLA\"}",
        ]));
        let ctx = test_support::context(dir.path(), Some(llm.clone()), true);
        let analysis = analyze_query("tesla shares", &ctx).await;
        assert_eq!(analysis.query_type, "stock");
        assert_eq!(analysis.search_terms, "TSLA");
        assert!(analysis.keywords.is_empty());
        assert!(llm.last_prompt().contains("tesla shares"));
    }

    #[tokio::test]
    async fn test_llm_garbage_falls_back_to_rules() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeLlm::new(&["I cannot help with that"]));
        let ctx = test_support::context(dir.path(), Some(llm), true);
        let analysis = analyze_query("bitcoin price", &ctx).await;
        assert_eq!(analysis.query_type, "price");

        let failing = Arc::new(FakeLlm::failing("quota exceeded"));
        let ctx = test_support::context(dir.path(), Some(failing), true);
        assert_eq!(analyze_query("football match", &ctx).await.query_type, "sports");
    }

    #[test]
    fn test_extractors() {
        assert_eq!(extract_score("Final: India 2 - 1 Pakistan"), Some("2-1".to_string()));
        assert_eq!(extract_score("at 10:30 today"), Some("10-30".to_string()));
        assert_eq!(extract_score("no score"), None);

        let line = weather_summary("🌍 OpenWeatherMap", "<p>Now 21°C and overcast</p>").unwrap();
        assert_eq!(line, "🌍 OpenWeatherMap: Temperature: 21°C Condition: Overcast");
        assert!(weather_summary("x", "<p>nothing</p>").is_none());
    }

    #[test]
    fn test_news_and_snippets_bounds() {
        let long = "y".repeat(200);
        let html = format!(
            "<h3>Too short</h3><h3>{long}</h3><h2>Markets rally after rate decision</h2>"
        );
        assert_eq!(news_headlines(&html), vec!["📰 Markets rally after rate decision"]);

        let snippet = "s".repeat(60);
        let html = format!("<div class=\"VwiC3b\">{snippet}</div><div class=\"hgKElc\">tiny</div>");
        assert_eq!(featured_snippets(&html), vec![snippet]);
    }

    #[test]
    fn test_format_universal() {
        let only_header = vec!["🔍 **Query Analysis:** General".to_string()];
        assert!(format_universal("x y", &only_header).contains("https://www.google.com/search?q=x+y"));

        let sections = vec!["🔍 **Query Analysis:** News".to_string(), "📰 A".to_string()];
        let out = format_universal("ai", &sections);
        assert!(out.starts_with("🌐 **Universal Scraper Results for:** 'ai'\n"));
        assert!(out.contains(&"=".repeat(70)));
        assert!(out.ends_with("📰 A"));
    }
}
