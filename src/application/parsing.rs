//! # Parsing Utils
//!
//! Extracts the next ReAct step (tool action or final answer) from raw LLM output.

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::types::AgentStep;

const FINAL_ANSWER: &str = "Final Answer:";

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[ \t]*(.*?)[ \t]*\n\s*Action\s*\d*\s*Input\s*\d*\s*:[ \t]*(.*)")
            .expect("static regex")
    })
}

fn bare_action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*Action\s*\d*\s*:").expect("static regex"))
}

/// Action input ends where the model starts inventing its own observation.
fn trim_action_input(raw: &str) -> String {
    let end = ["\nObservation", "\nThought:", "\nFinal Answer:"]
        .iter()
        .filter_map(|marker| raw.find(marker))
        .min()
        .unwrap_or(raw.len());
    let input = raw[..end].trim();
    let input = input
        .strip_prefix("```")
        .map(|s| s.trim_start_matches(|c: char| c.is_alphanumeric()).trim())
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(input);
    input.to_string()
}

/// Parses one model reply.
///
/// An action written before any final answer wins. A reply with neither is the answer itself.
pub fn parse_step(reply: &str) -> AgentStep {
    let final_at = reply.find(FINAL_ANSWER);

    if let Some(caps) = action_regex().captures(reply) {
        let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
        if final_at.is_none_or(|f| start < f) {
            let tool = caps.get(1).map(|m| m.as_str()).unwrap_or("").trim();
            let tool = tool.trim_matches(|c| c == '[' || c == ']' || c == '`' || c == '"').trim();
            let input = caps.get(2).map(|m| trim_action_input(m.as_str())).unwrap_or_default();
            if tool.is_empty() {
                return AgentStep::Unparsed(reply.to_string());
            }
            return AgentStep::Action {
                tool: tool.to_string(),
                input,
            };
        }
    }

    if let Some(at) = final_at {
        return AgentStep::Final(reply[at + FINAL_ANSWER.len()..].trim().to_string());
    }
    if bare_action_regex().is_match(reply) {
        return AgentStep::Unparsed(reply.to_string());
    }
    let text = reply.trim();
    let text = text
        .strip_prefix("Thought: Do I need to use a tool? No")
        .map(str::trim)
        .unwrap_or(text);
    AgentStep::Final(text.to_string())
}

/// Observation fed back to the model after a reply it could not follow.
pub fn format_reminder(reply: &str) -> String {
    tracing::warn!("Could not parse LLM output: {}", crate::application::utils::ellipsize(reply, 200));
    "Invalid Format: Missing 'Action Input:' after 'Action:'. Use 'Action:' followed by 'Action Input:' \
     to call a tool, or 'Final Answer:' to respond."
        .to_string()
}
