//! Study tip generation

use std::sync::Arc;

use crate::providers::{GenerationRequest, LlmProvider};

use super::prompt::{PromptBuilder, TIPS_SYSTEM_PROMPT};

/// Tips returned whenever the model fails or yields nothing usable
pub const FALLBACK_TIPS: [&str; 3] = [
    "Review the material regularly",
    "Practice with examples",
    "Connect concepts together",
];

/// Maximum number of tips returned
pub const MAX_TIPS: usize = 3;

const TIPS_MAX_TOKENS: u32 = 150;
const TIPS_TEMPERATURE: f32 = 0.7;

/// Leading list markers stripped from each tip line
const TIP_MARKERS: &[char] = &['•', '-', '*', '1', '2', '3', '4', '5', '6', '7', '8', '9', '.', ' '];

/// Asks the model for short study tips; never fails
pub struct StudyTipGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl StudyTipGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// One to three tips for the question and answer, or [`FALLBACK_TIPS`]
    pub async fn generate(&self, question: &str, answer: &str) -> Vec<String> {
        let request = GenerationRequest::new(PromptBuilder::build_tips_prompt(question, answer), TIPS_TEMPERATURE)
            .with_system(TIPS_SYSTEM_PROMPT)
            .with_max_tokens(TIPS_MAX_TOKENS);

        match self.llm.generate(&request).await {
            Ok(text) => {
                let tips = parse_tips(&text);
                if tips.is_empty() {
                    tracing::warn!("Study tip response contained no tips, using fallback");
                    fallback_tips()
                } else {
                    tips
                }
            }
            Err(e) => {
                tracing::warn!("Study tip generation failed: {}", e);
                fallback_tips()
            }
        }
    }
}

/// Split a model response into at most [`MAX_TIPS`] cleaned tips
pub fn parse_tips(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches(TIP_MARKERS).trim())
        .filter(|line| !line.is_empty())
        .take(MAX_TIPS)
        .map(str::to_string)
        .collect()
}

/// The fixed fallback list
pub fn fallback_tips() -> Vec<String> {
    FALLBACK_TIPS.iter().map(|t| t.to_string()).collect()
}
