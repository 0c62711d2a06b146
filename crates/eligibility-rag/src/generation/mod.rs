//! Prompt assembly and response cleaning

mod cleaner;
mod prompt;

pub use cleaner::{clean_response, ReasoningMarkers, ResponseCleaner};
pub use prompt::{PromptBuilder, DEFAULT_QUESTION, DEFAULT_TEMPLATE, PASSAGE_DELIMITER};
