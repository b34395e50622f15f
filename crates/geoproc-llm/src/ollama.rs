use crate::ports::Generator;
use geoproc_core::error::{GeoprocError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ollama generator implementation
pub struct OllamaGenerator {
    /// Base URL for Ollama API (e.g., "http://localhost:11434")
    base_url: String,

    /// Model name to use for generation
    model: String,

    /// Ask the model for a JSON document instead of free text
    json_output: bool,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaGenerator {
    /// Create a new Ollama generator
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            json_output: true,
            client: reqwest::Client::new(),
        }
    }

    /// Create with default localhost URL
    pub fn localhost(model: impl Into<String>) -> Self {
        Self::new("http://localhost:11434", model)
    }

    /// Toggle Ollama's JSON output mode (on by default, plans are JSON)
    pub fn with_json_output(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }

    fn request(&self, prompt: &str, context: &[&str]) -> OllamaGenerateRequest {
        let prompt = if context.is_empty() {
            prompt.to_string()
        } else {
            format!("{}\n\n{}", context.join("\n\n"), prompt)
        };
        OllamaGenerateRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
            format: self.json_output.then(|| "json".to_string()),
        }
    }

    fn unavailable(&self, reason: String) -> GeoprocError {
        GeoprocError::GeneratorUnavailable {
            reason,
            remediation: format!(
                "Ensure Ollama is running at {} and the model '{}' is available. \
                 Run 'ollama pull {}' to download the model.",
                self.base_url, self.model, self.model
            ),
        }
    }
}

impl Generator for OllamaGenerator {
    fn generate(&self, prompt: &str, context: &[&str]) -> Result<String> {
        // Use tokio runtime to execute async request
        let runtime =
            tokio::runtime::Runtime::new().map_err(|e| GeoprocError::GeneratorUnavailable {
                reason: format!("Failed to create async runtime: {}", e),
                remediation: "Ensure tokio is properly configured".to_string(),
            })?;

        let request = self.request(prompt, context);
        debug!(model = %self.model, prompt_chars = request.prompt.len(), "Sending generation request");

        runtime.block_on(async {
            let response = self
                .client
                .post(format!("{}/api/generate", self.base_url))
                .json(&request)
                .send()
                .await
                .map_err(|e| self.unavailable(format!("Failed to connect to Ollama: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                return Err(GeoprocError::GeneratorUnavailable {
                    reason: format!("Ollama API error ({}): {}", status, error_text),
                    remediation: format!(
                        "Check that the model '{}' is available. Run 'ollama list' to see installed models.",
                        self.model
                    ),
                });
            }

            let generated: OllamaGenerateResponse =
                response.json().await.map_err(|e| GeoprocError::Generation {
                    reason: format!("Failed to parse Ollama response: {}", e),
                })?;

            if generated.response.trim().is_empty() {
                return Err(GeoprocError::Generation {
                    reason: format!("Model '{}' returned an empty response", self.model),
                });
            }
            Ok(generated.response)
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Request body for Ollama generate API
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

/// Response from Ollama generate API
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_generator_creation() {
        let generator = OllamaGenerator::localhost("llama3.1");
        assert_eq!(generator.model_name(), "llama3.1");
        assert_eq!(generator.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_ollama_generator_custom_url() {
        let generator = OllamaGenerator::new("http://custom:11434/", "test-model");
        assert_eq!(generator.base_url, "http://custom:11434");
        assert_eq!(generator.model_name(), "test-model");
    }

    #[test]
    fn test_request_prepends_context() {
        let generator = OllamaGenerator::localhost("llama3.1");
        let request = generator.request("Plan the query", &["layer_0: Point", "layer_1: Polygon"]);
        assert!(request.prompt.starts_with("layer_0: Point\n\nlayer_1: Polygon"));
        assert!(request.prompt.ends_with("Plan the query"));
        assert!(!request.stream);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["format"], "json");
    }

    #[test]
    fn test_free_text_mode_omits_format() {
        let generator = OllamaGenerator::localhost("llama3.1").with_json_output(false);
        let body = serde_json::to_value(generator.request("hi", &[])).unwrap();
        assert!(body.get("format").is_none());
        assert_eq!(body["prompt"], "hi");
    }
}
