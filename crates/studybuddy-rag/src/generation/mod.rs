//! Answer and study tip generation

pub mod prompt;
pub mod synthesizer;
pub mod tips;

pub use prompt::PromptBuilder;
pub use synthesizer::AnswerSynthesizer;
pub use tips::{parse_tips, StudyTipGenerator, FALLBACK_TIPS};
