//! Gemini provider
//!
//! Calls `generateContent` for chat and `embedContent` for memory embeddings.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ProviderConfig;
use crate::infrastructure::llm::{Context, Error, MessageRole, Response, TokenUsage};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// HTTP client reused across requests
fn http_client() -> &'static Client {
    use std::sync::OnceLock;
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// Gemini API request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// Gemini content (message)
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// Gemini content part
#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

/// Generation configuration
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Gemini API response format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

/// Gemini response candidate
#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

/// Gemini usage metadata
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbedValues,
}

#[derive(Debug, Deserialize)]
struct EmbedValues {
    values: Vec<f32>,
}

fn endpoint(config: &ProviderConfig, model: &str, method: &str) -> String {
    let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
    format!(
        "{}/v1beta/models/{}:{}?key={}",
        base_url.trim_end_matches('/'),
        model,
        method,
        config.api_key
    )
}

/// Convert messages to Gemini format.
/// Gemini has no separate system role, so system messages become labelled user messages.
fn to_contents(context: &Context) -> Vec<GeminiContent> {
    context
        .messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                MessageRole::System | MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            let text = if msg.role == MessageRole::System {
                format!("System: {}", msg.content)
            } else {
                msg.content.clone()
            };
            GeminiContent {
                role: role.to_string(),
                parts: vec![GeminiPart { text }],
            }
        })
        .collect()
}

/// Pulls `error.message` out of an error body when present
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|m| format!("HTTP {}: {}", status, m))
        })
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body))
}

async fn post<T: Serialize>(config: &ProviderConfig, url: &str, body: &T) -> Result<String, Error> {
    let response = http_client()
        .post(url)
        .timeout(Duration::from_secs(config.timeout))
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| Error::new("gemini", format!("HTTP request failed: {}", e)))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response".to_string());

    if !status.is_success() {
        return Err(Error::new("gemini", error_message(status, &text)));
    }
    Ok(text)
}

fn parse_chat_response(body: &str, model: String) -> Result<Response, Error> {
    let gemini_response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| Error::new("gemini", format!("Failed to parse response: {}", e)))?;

    let candidate = gemini_response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::new("gemini", "No candidates in response"))?;

    let content = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .map(|part| part.text)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    let usage = gemini_response.usage_metadata.unwrap_or_default();

    Ok(Response {
        content,
        model,
        usage: TokenUsage {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
        },
    })
}

/// Execute a chat request using Gemini's API
pub async fn chat(config: &ProviderConfig, context: Context) -> Result<Response, Error> {
    let model = context.model.clone().unwrap_or_else(|| {
        if config.default_model.is_empty() {
            "gemini-1.5-flash".to_string()
        } else {
            config.default_model.clone()
        }
    });

    let generation_config = if context.temperature.is_some() || context.max_tokens.is_some() {
        Some(GenerationConfig {
            temperature: context.temperature,
            max_output_tokens: context.max_tokens,
        })
    } else {
        None
    };

    let request = GeminiRequest {
        contents: to_contents(&context),
        generation_config,
    };

    let url = endpoint(config, &model, "generateContent");
    let body = post(config, &url, &request).await?;
    parse_chat_response(&body, model)
}

/// Embed one text with the configured embedding model
pub async fn embed(config: &ProviderConfig, text: &str) -> Result<Vec<f32>, Error> {
    let model = &config.embedding_model;
    let request = EmbedRequest {
        model: format!("models/{}", model),
        content: GeminiContent {
            role: String::new(),
            parts: vec![GeminiPart {
                text: text.to_string(),
            }],
        },
    };

    let url = endpoint(config, model, "embedContent");
    let body = post(config, &url, &request).await?;
    let parsed: EmbedResponse = serde_json::from_str(&body)
        .map_err(|e| Error::new("gemini", format!("Failed to parse embedding: {}", e)))?;
    Ok(parsed.embedding.values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::Context;

    fn config() -> ProviderConfig {
        ProviderConfig {
            api_key: "k".to_string(),
            base_url: Some("http://localhost:1/".to_string()),
            default_model: "gemini-1.5-flash".to_string(),
            embedding_model: "gemini-embedding-001".to_string(),
            timeout: 5,
        }
    }

    #[test]
    fn test_endpoint_format() {
        assert_eq!(
            endpoint(&config(), "gemini-1.5-flash", "generateContent"),
            "http://localhost:1/v1beta/models/gemini-1.5-flash:generateContent?key=k"
        );
    }

    #[test]
    fn test_system_messages_become_labelled_user_turns() {
        let ctx = Context::prompt("hello").add_system_message("rules");
        let contents = to_contents(&ctx);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[1].role, "user");
        assert_eq!(contents[1].parts[0].text, "System: rules");
    }

    #[test]
    fn test_request_uses_camel_case() {
        let request = GeminiRequest {
            contents: vec![],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.2),
                max_output_tokens: None,
            }),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"generationConfig\""));
        assert!(!json.contains("maxOutputTokens"));
    }

    #[test]
    fn test_parse_chat_response_joins_parts() {
        let body = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "a"}, {"text": "b"}]}}],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 2, "totalTokenCount": 5}
        }"#;
        let response = parse_chat_response(body, "m".to_string()).unwrap();
        assert_eq!(response.content, "a\nb");
        assert_eq!(response.usage.total_tokens, 5);
    }

    #[test]
    fn test_parse_chat_response_without_candidates() {
        let err = parse_chat_response(r#"{"candidates": []}"#, "m".to_string()).unwrap_err();
        assert!(err.message.contains("No candidates"));
    }

    #[test]
    fn test_error_message_prefers_api_message() {
        let msg = error_message(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error": {"message": "API key not valid"}}"#,
        );
        assert_eq!(msg, "HTTP 400 Bad Request: API key not valid");
    }
}
