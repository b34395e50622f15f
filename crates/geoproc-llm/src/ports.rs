//! LLM port definitions

use geoproc_core::error::Result;

/// Port for text generation
pub trait Generator: Send + Sync {
    /// Generate text based on a prompt and optional context
    ///
    /// # Arguments
    /// * `prompt` - The generation prompt
    /// * `context` - Context strings placed before the prompt, such as layer summaries
    ///
    /// # Returns
    /// Generated text string
    fn generate(&self, prompt: &str, context: &[&str]) -> Result<String>;

    /// Get the name/identifier of the generation model
    fn model_name(&self) -> &str;
}
