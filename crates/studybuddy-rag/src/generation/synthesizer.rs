//! Retrieval-augmented answer synthesis

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::providers::{GenerationRequest, LlmProvider, VectorIndex};
use crate::types::{AnswerResult, SourceDocument};

use super::prompt::PromptBuilder;
use super::tips::StudyTipGenerator;

/// Answers questions from the indexed study materials
pub struct AnswerSynthesizer {
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn LlmProvider>,
    tips: StudyTipGenerator,
    temperature: f32,
}

impl AnswerSynthesizer {
    pub fn new(index: Arc<dyn VectorIndex>, llm: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self {
            index,
            tips: StudyTipGenerator::new(llm.clone()),
            llm,
            temperature,
        }
    }

    /// Retrieve up to `max_sources` chunks, generate an answer and study tips
    ///
    /// Index and embedding failures surface as [`Error::Retrieval`], model
    /// failures as [`Error::Generation`]. Tip failures are absorbed.
    pub async fn answer(&self, question: &str, max_sources: usize) -> Result<AnswerResult> {
        let started = Instant::now();

        let results = self.index.search(question, max_sources).await.map_err(|e| {
            tracing::error!("Retrieval failed for question {:?}: {}", question, e);
            Error::Retrieval(e.to_string())
        })?;
        tracing::debug!("Retrieved {} chunks for question", results.len());

        let context = PromptBuilder::build_context(&results);
        let request = GenerationRequest::new(PromptBuilder::build_tutor_prompt(question, &context), self.temperature);

        let answer = self.llm.generate(&request).await.map_err(|e| {
            tracing::error!("Generation failed for question {:?}: {}", question, e);
            match e {
                Error::Generation(message) => Error::Generation(message),
                other => Error::Generation(other.to_string()),
            }
        })?;

        let sources = results.iter().map(SourceDocument::from_search_result).collect();
        let study_tips = self.tips.generate(question, &answer).await;

        Ok(AnswerResult {
            answer,
            sources,
            study_tips,
            response_time: started.elapsed().as_secs_f64(),
        })
    }
}
