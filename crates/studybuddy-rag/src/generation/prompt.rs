//! Prompt templates for tutoring answers and study tips

use crate::providers::vector_store::VectorSearchResult;

/// System instruction for study tip generation
pub const TIPS_SYSTEM_PROMPT: &str =
    "Generate 2-3 concise study tips based on the question and answer. Each tip should be practical and actionable.";

/// Prompt builder for tutoring queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts, in retrieval order, separated by blank lines
    pub fn build_context(results: &[VectorSearchResult]) -> String {
        results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the tutor prompt around the retrieved context
    pub fn build_tutor_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are StudyBuddy, an AI tutor helping students learn.

Based on the study materials provided, answer the question clearly and helpfully.

Guidelines:
- Provide clear, accurate explanations
- Include examples when helpful
- Keep responses focused and educational
- If you don't know something from the materials, say so

Study Materials Context:
{context}

Student Question: {question}

StudyBuddy's Answer:"#,
            context = context,
            question = question,
        )
    }

    /// Build the user message for study tip generation
    pub fn build_tips_prompt(question: &str, answer: &str) -> String {
        format!("Question: {}\nAnswer: {}\n\nStudy tips:", question, answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, DocumentRecord};

    fn result(text: &str) -> VectorSearchResult {
        let record = DocumentRecord::new("bio.md", String::new(), 0);
        VectorSearchResult {
            chunk: Chunk::new(&record, 0, text.to_string(), None),
            similarity: 0.5,
        }
    }

    #[test]
    fn test_context_joins_with_blank_lines() {
        let context = PromptBuilder::build_context(&[result("First."), result("Second.")]);
        assert_eq!(context, "First.\n\nSecond.");
        assert_eq!(PromptBuilder::build_context(&[]), "");
    }

    #[test]
    fn test_tutor_prompt_contains_context_and_question() {
        let prompt = PromptBuilder::build_tutor_prompt("What is a cell?", "Cells are units.");
        assert!(prompt.starts_with("You are StudyBuddy"));
        assert!(prompt.contains("Study Materials Context:\nCells are units."));
        assert!(prompt.contains("Student Question: What is a cell?"));
        assert!(prompt.contains("say so"));
        assert!(prompt.ends_with("StudyBuddy's Answer:"));
    }

    #[test]
    fn test_tips_prompt() {
        assert_eq!(
            PromptBuilder::build_tips_prompt("Q?", "A."),
            "Question: Q?\nAnswer: A.\n\nStudy tips:"
        );
    }
}
