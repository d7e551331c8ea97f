//! # Prompts
//!
//! LLM prompt templates from the `prompts/` directory and the helpers that fill them.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{[A-Z_]+\}\}").expect("static regex"))
}

/// A builder for rendering prompts with context.
pub struct PromptRenderer<'a> {
    template: &'a str,
    replacements: Vec<(&'a str, String)>,
}

impl<'a> PromptRenderer<'a> {
    pub fn new(template: &'a str) -> Self {
        Self {
            template,
            replacements: Vec::new(),
        }
    }

    pub fn set(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.replacements.push((key, value.into()));
        self
    }

    /// Fills every placeholder of the template in one pass, so values are never rescanned.
    pub fn render(self) -> String {
        placeholder_re()
            .replace_all(self.template, |caps: &Captures| {
                let placeholder = &caps[0];
                match self.replacements.iter().find(|(key, _)| *key == placeholder) {
                    Some((_, value)) => value.clone(),
                    None => {
                        // A template placeholder without a set() call
                        tracing::error!(
                            "ADE: [PROMPT RENDER ERROR] Unreplaced placeholder found in output: {}",
                            placeholder
                        );
                        placeholder.to_string()
                    }
                }
            })
            .into_owned()
    }
}

pub const SYSTEM: &str = include_str!("../../prompts/system.md");
pub const REACT: &str = include_str!("../../prompts/react.md");
pub const FINAL_ANSWER: &str = include_str!("../../prompts/final_answer.md");
pub const THINKING: &str = include_str!("../../prompts/thinking.md");
pub const ENHANCED_REQUEST: &str = include_str!("../../prompts/enhanced_request.md");
pub const QUERY_ANALYSIS: &str = include_str!("../../prompts/query_analysis.md");
pub const PROJECT_ANALYSIS: &str = include_str!("../../prompts/project_analysis.md");
pub const FILE_ANALYSIS: &str = include_str!("../../prompts/file_analysis.md");
pub const WRITING_PLAN: &str = include_str!("../../prompts/writing_plan.md");
pub const WRITING_CONTENT: &str = include_str!("../../prompts/writing_content.md");
pub const CODE_GENERATION: &str = include_str!("../../prompts/code_generation.md");
pub const DOCUMENTATION: &str = include_str!("../../prompts/documentation.md");
pub const ERROR_ANALYSIS: &str = include_str!("../../prompts/error_analysis.md");
pub const RECOVERY_GUIDANCE: &str = include_str!("../../prompts/recovery_guidance.md");

/// One ReAct turn: tool catalogue, memories, history, the request and the scratchpad so far.
pub fn react_turn(tools: &str, tool_names: &str, memories: &str, history: &str, input: &str, scratchpad: &str) -> String {
    PromptRenderer::new(REACT)
        .set("{{SYSTEM}}", SYSTEM.trim_end())
        .set("{{TOOLS}}", tools)
        .set("{{TOOL_NAMES}}", tool_names)
        .set("{{MEMORIES}}", memories)
        .set("{{HISTORY}}", history)
        .set("{{INPUT}}", input)
        .set("{{SCRATCHPAD}}", scratchpad)
        .render()
}

/// Last call after the iteration budget runs out.
pub fn final_answer(prompt: &str) -> String {
    PromptRenderer::new(FINAL_ANSWER).set("{{PROMPT}}", prompt).render()
}

pub fn thinking(input: &str) -> String {
    PromptRenderer::new(THINKING).set("{{INPUT}}", input).render()
}

pub fn enhanced_request(input: &str, thinking: &str) -> String {
    PromptRenderer::new(ENHANCED_REQUEST)
        .set("{{INPUT}}", input)
        .set("{{THINKING}}", thinking)
        .render()
}

pub fn query_analysis(query: &str) -> String {
    PromptRenderer::new(QUERY_ANALYSIS).set("{{QUERY}}", query).render()
}

pub fn project_analysis(description: &str) -> String {
    PromptRenderer::new(PROJECT_ANALYSIS).set("{{DESCRIPTION}}", description).render()
}

pub fn file_analysis(path: &str, category: &str, size: &str, lines: usize, content: &str) -> String {
    PromptRenderer::new(FILE_ANALYSIS)
        .set("{{PATH}}", path)
        .set("{{CATEGORY}}", category)
        .set("{{SIZE}}", size)
        .set("{{LINES}}", lines.to_string())
        .set("{{CONTENT}}", content)
        .render()
}

pub fn writing_plan(request: &str, context: &str) -> String {
    PromptRenderer::new(WRITING_PLAN)
        .set("{{REQUEST}}", request)
        .set("{{CONTEXT}}", context)
        .render()
}

pub fn writing_content(plan: &str, context: &str, filename: &str) -> String {
    PromptRenderer::new(WRITING_CONTENT)
        .set("{{PLAN}}", plan)
        .set("{{CONTEXT}}", context)
        .set("{{FILENAME}}", filename)
        .render()
}

pub fn code_generation(language: &str, description: &str) -> String {
    PromptRenderer::new(CODE_GENERATION)
        .set("{{LANGUAGE}}", language)
        .set("{{DESCRIPTION}}", description)
        .render()
}

pub fn documentation(doc_type: &str, topic: &str) -> String {
    PromptRenderer::new(DOCUMENTATION)
        .set("{{DOC_TYPE}}", doc_type)
        .set("{{TOPIC}}", topic)
        .render()
}

pub fn error_analysis(tool: &str, message: &str, context: &str) -> String {
    PromptRenderer::new(ERROR_ANALYSIS)
        .set("{{TOOL}}", tool)
        .set("{{MESSAGE}}", message)
        .set("{{CONTEXT}}", context)
        .render()
}

pub fn recovery_guidance(error: &str, attempted: &str) -> String {
    PromptRenderer::new(RECOVERY_GUIDANCE)
        .set("{{ERROR}}", error)
        .set("{{ATTEMPTED}}", attempted)
        .render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_renderer_basic() {
        let renderer = PromptRenderer::new("Hello {{NAME}}")
            .set("{{NAME}}", "World");
        assert_eq!(renderer.render(), "Hello World");
    }

    #[test]
    fn test_prompt_renderer_missing_key() {
        // Renders as-is and logs an error
        let renderer = PromptRenderer::new("Hello {{MISSING}}");
        assert_eq!(renderer.render(), "Hello {{MISSING}}");
    }

    #[test]
    fn test_prompt_renderer_partial_replace() {
        let renderer = PromptRenderer::new("{{A}} and {{B}}")
            .set("{{A}}", "Apple");
        assert_eq!(renderer.render(), "Apple and {{B}}");
    }

    #[test]
    fn test_values_are_not_substituted_again() {
        let rendered = PromptRenderer::new("{{A}} / {{B}}")
            .set("{{A}}", "literal {{B}}")
            .set("{{B}}", "b")
            .render();
        assert_eq!(rendered, "literal {{B}} / b");
    }

    #[test]
    fn test_react_turn_keeps_placeholders_in_user_text() {
        let prompt = react_turn(
            "> Calculator: math",
            "Calculator",
            "remember {{INPUT}}",
            "Human: {{TOOLS}}",
            "explain {{SCRATCHPAD}} please",
            "Observation: page with {{ mustache }}",
        );
        assert!(prompt.contains("New input: explain {{SCRATCHPAD}} please"));
        assert!(prompt.contains("remember {{INPUT}}"));
        assert!(prompt.contains("Human: {{TOOLS}}"));
        assert!(prompt.trim_end().ends_with("Observation: page with {{ mustache }}"));
        assert_eq!(prompt.matches("> Calculator: math").count(), 1);
    }

    #[test]
    fn test_every_template_renders_completely() {
        let rendered = [
            react_turn("tools", "A, B", "none", "", "hi", ""),
            final_answer("p"),
            thinking("x"),
            enhanced_request("x", "y"),
            query_analysis("q"),
            project_analysis("d"),
            file_analysis("a.py", "code", "1 KB", 3, "print()"),
            writing_plan("r", "c"),
            writing_content("p", "c", "f.txt"),
            code_generation("python", "d"),
            documentation("guide", "t"),
            error_analysis("t", "m", "c"),
            recovery_guidance("e", "none"),
        ];
        for prompt in rendered {
            assert!(!prompt.contains("{{"), "leftover placeholder in: {}", prompt);
        }
    }

    #[test]
    fn test_react_turn_layout() {
        let prompt = react_turn("> Calculator: math", "Calculator", "(none)", "Human: hi", "2+2?", "Thought: x");
        assert!(prompt.starts_with("You are ADE"));
        assert!(prompt.contains("should be one of [Calculator]"));
        assert!(prompt.contains("New input: 2+2?"));
        assert!(prompt.trim_end().ends_with("Thought: x"));
    }
}
