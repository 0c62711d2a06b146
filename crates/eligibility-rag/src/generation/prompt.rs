//! Prompt templates for grounded extraction

use crate::error::{Error, Result};
use crate::types::RetrievalResult;

/// Question used for retrieval and injected into the prompt
pub const DEFAULT_QUESTION: &str =
    "What are the mandatory eligibility criteria for applying to this RFP?";

/// Instruction template; `{context}` receives the retrieved passages
pub const DEFAULT_TEMPLATE: &str = r#"You are a compliance expert reviewing an RFP.

Extract the **mandatory eligibility criteria** from the context, including:
- Required certifications
- Past performance or years of experience
- Technical or staffing requirements
- Disqualifiers
Return the result as a clean bullet-point list.

Context:
{context}

Question: {question}
"#;

/// Separator placed between passages so adjacent texts never run together
pub const PASSAGE_DELIMITER: &str = "\n\n";

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUESTION_PLACEHOLDER: &str = "{question}";

/// Prompt builder for grounded extraction
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join passage texts in the order supplied
    pub fn build_context(result: &RetrievalResult) -> String {
        result.texts().collect::<Vec<_>>().join(PASSAGE_DELIMITER)
    }

    /// Fill the template with the retrieved context and the question.
    ///
    /// Placeholders are substituted in a single pass, so placeholder-like
    /// text inside passages or the question is left as-is. An empty result
    /// is rejected; the generator never sees a prompt without context.
    pub fn build(result: &RetrievalResult, question: &str, template: &str) -> Result<String> {
        if !template.contains(CONTEXT_PLACEHOLDER) {
            return Err(Error::invalid_config(
                "Prompt template must contain a {context} placeholder",
            ));
        }
        if result.is_empty() {
            return Err(Error::NoRelevantPassages(
                "retrieval result is empty".to_string(),
            ));
        }

        let context = Self::build_context(result);
        let prompt = template
            .split(CONTEXT_PLACEHOLDER)
            .map(|part| part.replace(QUESTION_PLACEHOLDER, question))
            .collect::<Vec<_>>()
            .join(&context);

        tracing::debug!(
            "Built prompt: {} passages, {} chars",
            result.len(),
            prompt.len()
        );
        Ok(prompt)
    }

    /// Build with the default eligibility template
    pub fn build_default(result: &RetrievalResult, question: &str) -> Result<String> {
        Self::build(result, question, DEFAULT_TEMPLATE)
    }
}
