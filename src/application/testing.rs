//! Test doubles for the LLM, embedder, console and consent seams.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::traits::{Approver, Embedder, LlmProvider, Prompter};

/// Replays scripted replies in order, then repeats `fallback`.
pub struct FakeLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
    fallback: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            fallback: Ok("Final Answer: done".to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for FakeLlm {
    async fn completion(&self, prompt: &str, _temperature: Option<f32>) -> Result<String, String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

/// Letter-frequency vectors: similar words land close together.
pub struct FakeEmbedder;

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        let mut vector = vec![0.0f32; 26];
        for c in text.to_lowercase().chars().filter(|c| c.is_ascii_lowercase()) {
            vector[(c as u8 - b'a') as usize] += 1.0;
        }
        Ok(vector)
    }
}

/// Answers questions from a queue; fails once the script runs out.
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub questions: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            questions: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &str, default: Option<&str>) -> Result<String> {
        self.questions.push(question.to_string());
        let answer = self
            .answers
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer for '{}'", question))?;
        match default {
            Some(default) if answer.trim().is_empty() => Ok(default.to_string()),
            _ => Ok(answer),
        }
    }
}

pub struct FixedApprover(pub bool);

impl Approver for FixedApprover {
    fn approve(&self, _summary: &str) -> bool {
        self.0
    }
}
