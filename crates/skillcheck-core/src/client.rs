//! Deadline-bounded access to an `LlmProvider`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::AssessmentError;
use crate::traits::{GenerateRequest, LlmProvider, DEFAULT_SYSTEM_PROMPT};

/// Model parameters shared by every call a pipeline component makes.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// Model identifier passed to the provider.
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Deadline for one external call.
    pub call_timeout: Duration,
    /// Replaces `DEFAULT_SYSTEM_PROMPT` when set.
    pub system_prompt: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".into(),
            temperature: 0.7,
            max_tokens: 8192,
            call_timeout: Duration::from_secs(120),
            system_prompt: None,
        }
    }
}

/// A provider paired with the settings used to call it.
///
/// Cloning is cheap; the provider is shared.
#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn LlmProvider>,
    settings: ModelSettings,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: ModelSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send `prompt` and return the raw model text.
    ///
    /// Provider errors and elapsed deadlines both become `Transport`. No retry.
    pub async fn complete(&self, prompt: String) -> Result<String, AssessmentError> {
        let request = GenerateRequest {
            model: self.settings.model.clone(),
            prompt,
            system_prompt: Some(
                self.settings
                    .system_prompt
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            ),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            json_output: true,
        };

        let start = Instant::now();
        let result = tokio::time::timeout(self.settings.call_timeout, self.provider.generate(&request)).await;
        match result {
            Ok(Ok(response)) => {
                tracing::debug!(
                    provider = self.provider.name(),
                    model = %response.model,
                    latency_ms = start.elapsed().as_millis() as u64,
                    total_tokens = response.token_usage.total_tokens,
                    "generation call finished"
                );
                Ok(response.content)
            }
            Ok(Err(e)) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "generation call failed");
                Err(AssessmentError::transport(&e))
            }
            Err(_) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    timeout_secs = self.settings.call_timeout.as_secs(),
                    "generation call timed out"
                );
                Err(AssessmentError::Transport(format!(
                    "{} did not respond within {:?}",
                    self.provider.name(),
                    self.settings.call_timeout
                )))
            }
        }
    }
}
