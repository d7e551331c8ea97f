//! # Web Scrapers
//!
//! Keyword-routed scraping (weather, news, prices, general facts) and a targeted scraper for
//! a single URL. Extraction is regex based and tolerant of markup it does not understand.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::{Tool, ToolArgs, ToolContext, clean_input};
use crate::application::utils::{contains_any, ellipsize, truncate_chars};
use crate::infrastructure::web::{class_texts, html_to_text, inline_text, main_content, quote_plus, tag_texts};

const WEATHER_WORDS: [&str; 4] = ["weather", "temperature", "forecast", "climate"];
const NEWS_WORDS: [&str; 5] = ["news", "latest", "recent", "breaking", "current events"];
const PRICE_WORDS: [&str; 6] = ["price", "cost", "value", "stock", "crypto", "bitcoin"];
const CONDITIONS: [&str; 14] = [
    "partly cloudy",
    "mostly cloudy",
    "light rain",
    "heavy rain",
    "thunderstorm",
    "sunny",
    "cloudy",
    "rainy",
    "clear",
    "overcast",
    "storm",
    "snow",
    "fog",
    "hazy",
];

fn temperature_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+\s*°[CF]?").expect("static regex"))
}

fn price_regexes() -> &'static [Regex; 4] {
    static RE: OnceLock<[Regex; 4]> = OnceLock::new();
    RE.get_or_init(|| {
        [r"\$[\d,]+\.?\d*", r"₹[\d,]+\.?\d*", r"€[\d,]+\.?\d*", r"£[\d,]+\.?\d*"]
            .map(|p| Regex::new(p).expect("static regex"))
    })
}

/// Removes the given words (whole words only) and collapses whitespace.
pub fn strip_words(query: &str, words: &[&str]) -> String {
    let mut text = format!(" {} ", query.to_lowercase());
    for word in words {
        let padded = format!(" {} ", word);
        while text.contains(&padded) {
            text = text.replace(&padded, " ");
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// City part of a weather query, e.g. `weather in Jaipur today` -> `jaipur`.
pub fn weather_city(query: &str) -> String {
    let city = strip_words(
        query,
        &["weather", "temperature", "forecast", "climate", "of", "in", "today", "current", "the", "what's", "what", "is"],
    );
    if city.is_empty() {
        "current location".to_string()
    } else {
        city
    }
}

pub fn news_topic(query: &str) -> String {
    let topic = strip_words(query, &["news", "latest", "recent", "breaking", "current events", "about", "on"]);
    if topic.is_empty() {
        "general news".to_string()
    } else {
        topic
    }
}

/// Temperatures such as `31°C`, `-4 °F` or `18°`, first occurrence first.
pub fn extract_temperatures(text: &str) -> Vec<String> {
    let mut temps: Vec<String> = Vec::new();
    for m in temperature_regex().find_iter(text) {
        let value: String = m.as_str().split_whitespace().collect();
        if !temps.contains(&value) {
            temps.push(value);
        }
    }
    temps
}

/// Weather condition words in the order they appear.
pub fn extract_conditions(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut found: Vec<(usize, &str)> = CONDITIONS
        .iter()
        .filter_map(|c| lower.find(c).map(|pos| (pos, *c)))
        .collect();
    found.sort_by_key(|(pos, len)| (*pos, usize::MAX - len.len()));
    let mut conditions: Vec<String> = Vec::new();
    for (_, condition) in found {
        if !conditions.iter().any(|c| c.to_lowercase().contains(condition)) {
            conditions.push(title_case(condition));
        }
    }
    conditions
}

/// Currency amounts, at most `per_currency` for each of `$ ₹ € £`.
pub fn extract_prices(text: &str, per_currency: usize) -> Vec<String> {
    price_regexes()
        .iter()
        .flat_map(|re| re.find_iter(text).take(per_currency).map(|m| m.as_str().to_string()))
        .collect()
}

pub fn title_case(text: &str) -> String {
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

/// Weather lines pulled from a page, empty when the page has none.
pub fn weather_lines(html: &str) -> Vec<String> {
    let text = html_to_text(html);
    let mut lines: Vec<String> = extract_temperatures(&text)
        .into_iter()
        .take(3)
        .map(|t| format!("Temperature: {}", t))
        .collect();
    if let Some(condition) = extract_conditions(&text).into_iter().next() {
        lines.push(format!("Condition: {}", condition));
    }
    lines
}

async fn weather_data(city: &str, ctx: &ToolContext) -> String {
    let q = quote_plus(city);
    let urls = [
        format!("https://www.google.com/search?q=weather+{}", q),
        format!("https://www.weather.com/weather/today/l/{}", q),
        format!("https://openweathermap.org/find?q={}", q),
    ];
    for url in &urls {
        let Ok(html) = ctx.web.get_page(url, ctx.config.web.page_timeout).await else {
            continue;
        };
        let lines = weather_lines(&html);
        if !lines.is_empty() {
            return format!("🌤️ Weather in {}:\n{}", city, lines.into_iter().take(5).collect::<Vec<_>>().join("\n"));
        }
    }
    format!(
        "🌤️ Weather for {}:\nCouldn't fetch specific data. Please check:\n• https://weather.com/search/results?where={q}\n• https://www.google.com/search?q=weather+{q}",
        city
    )
}

/// Headlines mentioning the topic, longest first-seen order kept.
pub fn headlines_about(html: &str, topic: &str, limit: usize) -> Vec<String> {
    let topic = topic.to_lowercase();
    let mut found: Vec<String> = Vec::new();
    let candidates = tag_texts(html, &["h3", "h2"])
        .into_iter()
        .chain(class_texts(html, &["headline", "title"]));
    for text in candidates {
        if text.chars().count() > 20 && text.to_lowercase().contains(&topic) && !found.contains(&text) {
            found.push(text);
        }
    }
    found.truncate(limit);
    found
}

async fn news_data(topic: &str, ctx: &ToolContext) -> String {
    let q = quote_plus(topic);
    let urls = [
        format!("https://www.google.com/search?q={}+news", q),
        format!("https://news.google.com/search?q={}", q),
    ];
    for url in &urls {
        let Ok(html) = ctx.web.get_page(url, ctx.config.web.page_timeout).await else {
            continue;
        };
        let headlines = headlines_about(&html, topic, 5);
        if !headlines.is_empty() {
            let bullets: Vec<String> = headlines.iter().map(|h| format!("• {}", h)).collect();
            return format!("📰 Latest news about {}:\n{}", topic, bullets.join("\n"));
        }
    }
    format!(
        "📰 News about {}:\nCouldn't fetch specific headlines. Check:\n• https://news.google.com/search?q={q}\n• https://www.google.com/search?q={q}+news",
        topic
    )
}

/// First paragraph with real content, used for Wikipedia pages.
pub fn first_paragraph(html: &str, min_chars: usize) -> Option<String> {
    tag_texts(html, &["p"])
        .into_iter()
        .find(|p| p.chars().count() > min_chars)
}

async fn general_info(query: &str, ctx: &ToolContext) -> String {
    let q = quote_plus(query);
    let wiki = format!("https://en.wikipedia.org/wiki/{}", q);
    if let Ok(html) = ctx.web.get_page(&wiki, ctx.config.web.search_timeout).await {
        if let Some(text) = first_paragraph(&html, 100) {
            return format!(
                "📚 Information about {}:\n{}...\n\nSource: Wikipedia",
                query,
                truncate_chars(&text, 500)
            );
        }
    }

    let google = format!("https://www.google.com/search?q={}", q);
    if let Ok(html) = ctx.web.get_page(&google, ctx.config.web.page_timeout).await {
        let snippets: Vec<String> = class_texts(&html, &["BNeawe", "hgKElc", "st", "VwiC3b"])
            .into_iter()
            .filter(|t| (51..300).contains(&t.chars().count()))
            .take(2)
            .collect();
        if !snippets.is_empty() {
            return format!("🔍 Information about {}:\n{}", query, snippets.join("\n\n"));
        }
    }

    format!(
        "🔍 Search for {}:\nCouldn't extract specific information. Try:\n• https://www.google.com/search?q={q}\n• https://en.wikipedia.org/wiki/{q}",
        query
    )
}

/// Query category used by the smart scraper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Weather(String),
    News(String),
    Price,
    General,
}

pub fn route(query: &str) -> Route {
    if contains_any(query, &WEATHER_WORDS) {
        Route::Weather(weather_city(query))
    } else if contains_any(query, &NEWS_WORDS) {
        Route::News(news_topic(query))
    } else if contains_any(query, &PRICE_WORDS) {
        Route::Price
    } else {
        Route::General
    }
}

pub struct SmartWebScraper;

#[async_trait]
impl Tool for SmartWebScraper {
    fn name(&self) -> &'static str {
        "Smart Web Scraper"
    }

    fn description(&self) -> &'static str {
        "Scrapes web content based on the query type (weather, news, prices, general info). Input: the query."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let query = clean_input(input);
        Ok(match route(&query) {
            Route::Weather(city) => weather_data(&city, ctx).await,
            Route::News(topic) => news_data(&topic, ctx).await,
            Route::Price => format!(
                "{}\n\n💡 For real-time prices, check financial websites like Yahoo Finance or CoinGecko",
                general_info(&query, ctx).await
            ),
            Route::General => general_info(&query, ctx).await,
        })
    }
}

/// What the targeted scraper pulls out of a page
pub fn extract_target(html: &str, target_info: &str) -> Vec<String> {
    let target = target_info.to_lowercase();
    if target.contains("headline") {
        return tag_texts(html, &["h1", "h2", "h3", "h4"])
            .into_iter()
            .take(10)
            .filter(|h| h.chars().count() > 10)
            .map(|h| format!("📰 {}", h))
            .collect();
    }
    if target.contains("price") {
        return extract_prices(&html_to_text(html), 5)
            .into_iter()
            .map(|p| format!("💰 {}", p))
            .collect();
    }
    if let Some(content) = main_content(html) {
        return vec![ellipsize(&content, 1000)];
    }
    tag_texts(html, &["p"])
        .into_iter()
        .take(5)
        .map(|p| inline_text(&p))
        .filter(|p| p.chars().count() > 50)
        .collect()
}

pub struct TargetedWebScraper;

#[async_trait]
impl Tool for TargetedWebScraper {
    fn name(&self) -> &'static str {
        "Targeted Web Scraper"
    }

    fn description(&self) -> &'static str {
        "Scrapes specific information from a URL. Input: JSON {\"url\": \"...\", \"target_info\": \"headlines|prices|main content\"} or 'url|target_info'."
    }

    async fn call(&self, input: &str, ctx: &ToolContext) -> Result<String> {
        let args = ToolArgs::parse(input);
        let Some(url) = args.get("url", 0) else {
            return Ok("❌ Targeted Web Scraper needs a url".to_string());
        };
        let target = args.rest("target_info", 1).unwrap_or_else(|| "main content".to_string());

        let html = match ctx.web.get_page(&url, ctx.config.web.scrape_timeout).await {
            Ok(html) => html,
            Err(e) => return Ok(format!("❌ Error accessing {}: {:#}", url, e)),
        };
        let results = extract_target(&html, &target);
        Ok(if results.is_empty() {
            format!(
                "🌐 Content from {}:\n\nCouldn't extract specific information. The page might use dynamic content or have access restrictions.",
                url
            )
        } else {
            format!("🌐 Content from {}:\n\n{}", url, results.join("\n\n"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_and_city_extraction() {
        assert_eq!(route("Jaipur weather"), Route::Weather("jaipur".to_string()));
        assert_eq!(route("weather in Beijing today"), Route::Weather("beijing".to_string()));
        assert_eq!(route("weather"), Route::Weather("current location".to_string()));
        assert_eq!(route("latest AI news"), Route::News("ai".to_string()));
        assert_eq!(route("bitcoin price"), Route::Price);
        assert_eq!(route("Albert Einstein"), Route::General);
    }

    #[test]
    fn test_extract_temperatures_and_conditions() {
        let text = "Now 31°C, feels like 33 °C. Tonight -2°F. Partly cloudy with sunny spells. Low 31°C";
        assert_eq!(extract_temperatures(text), vec!["31°C", "33°C", "-2°F"]);
        assert_eq!(extract_conditions(text), vec!["Partly Cloudy", "Sunny"]);
        assert!(extract_temperatures("no numbers").is_empty());
    }

    #[test]
    fn test_extract_prices_per_currency() {
        let text = "Was $1,299.99 now $999 or ₹74,000 / €899.50 £1 $2 $3 $4 $5 $6";
        let prices = extract_prices(text, 5);
        assert_eq!(prices.iter().filter(|p| p.starts_with('$')).count(), 5);
        assert!(prices.contains(&"₹74,000".to_string()));
        assert!(prices.contains(&"€899.50".to_string()));
        assert!(prices.contains(&"£1".to_string()));
    }

    #[test]
    fn test_weather_lines_from_html() {
        let html = "<html><body><div>Jaipur</div><span>34°C</span><p>Mostly sunny today</p></body></html>";
        let lines = weather_lines(html);
        assert_eq!(lines[0], "Temperature: 34°C");
        assert_eq!(lines.last().unwrap(), "Condition: Sunny");
        assert!(weather_lines("<p>nothing here</p>").is_empty());
    }

    #[test]
    fn test_headlines_filter_by_topic_and_length() {
        let html = "<h2>Rust 2.0 announced at conference</h2><h3>Short rust</h3><h3>Python gets faster interpreter</h3>\
                    <div class=\"headline\">Rust foundation grows membership</div>";
        let found = headlines_about(html, "rust", 5);
        assert_eq!(
            found,
            vec!["Rust 2.0 announced at conference", "Rust foundation grows membership"]
        );
    }

    #[test]
    fn test_extract_target_modes() {
        let html = "<h1>The Main Headline Here</h1><h2>Tiny</h2><p>Price: $19.99 or €17</p>";
        assert_eq!(extract_target(html, "headlines"), vec!["📰 The Main Headline Here"]);
        assert_eq!(extract_target(html, "prices"), vec!["💰 $19.99", "💰 €17"]);

        let body = "content ".repeat(200);
        let article = format!("<article>{}</article>", body);
        let main = extract_target(&article, "main content");
        assert_eq!(main.len(), 1);
        assert!(main[0].ends_with("..."));
        assert_eq!(main[0].chars().count(), 1003);

        let paragraphs = format!("<p>{}</p><p>short</p>", "a paragraph of text ".repeat(4));
        assert_eq!(extract_target(&paragraphs, "main content").len(), 1);
    }

    #[test]
    fn test_first_paragraph() {
        let long = "x".repeat(120);
        let html = format!("<p>short</p><p>{}</p>", long);
        assert_eq!(first_paragraph(&html, 100), Some(long));
        assert_eq!(first_paragraph("<p>short</p>", 100), None);
    }
}
