//! Topic inference: ask the model for a "SENDER - TOPIC" line.
//!
//! The [`CompletionClient`] trait is the seam between orchestration and the
//! actual model call: [`ProviderClient`] wraps an `edgequake-llm` provider,
//! tests substitute a scripted client. [`TopicInferencer`] owns everything
//! above the seam: the text budget, the prompt template, and the rule that
//! an unusable response means "no topic" rather than a failed document.

use crate::config::RenameConfig;
use crate::error::ScanSortError;
use crate::prompts::{render_topic_prompt, DEFAULT_TOPIC_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::{debug, warn};

/// Model used when a provider name is given without a model.
const DEFAULT_MODEL: &str = "llama3:8b";

/// One prompt in, one completion out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ScanSortError>;
}

/// [`CompletionClient`] backed by an `edgequake-llm` provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl CompletionClient for ProviderClient {
    async fn complete(&self, prompt: &str) -> Result<String, ScanSortError> {
        let messages = vec![ChatMessage::user(prompt)];
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ScanSortError::Llm {
                message: format!("{}", e),
            })?;

        debug!(
            "Completion: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        Ok(response.content)
    }
}

/// Instantiate a named provider with the given model.
fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ScanSortError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ScanSortError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider for a run.
///
/// The sources, tried in order:
///
/// 1. a provider instance the caller put in `config.provider`, used as-is;
/// 2. `config.provider_name` plus `config.model` (or [`DEFAULT_MODEL`] when
///    no model is given), handed to the factory;
/// 3. the `SCANSORT_LLM_PROVIDER` and `SCANSORT_MODEL` env vars, when both
///    are set and non-empty;
/// 4. [`ProviderFactory::from_env`], which picks a provider from whatever
///    API keys the environment carries.
///
/// Config beats environment so a library caller's explicit choice is never
/// overridden by stray env vars on the host.
pub fn resolve_provider(config: &RenameConfig) -> Result<Arc<dyn LLMProvider>, ScanSortError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("SCANSORT_LLM_PROVIDER"),
        std::env::var("SCANSORT_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ScanSortError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set SCANSORT_LLM_PROVIDER and SCANSORT_MODEL, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

/// Derives a "SENDER - TOPIC" line from OCR'd document text.
pub struct TopicInferencer {
    client: Arc<dyn CompletionClient>,
    template: String,
    budget: usize,
}

impl TopicInferencer {
    pub fn new(client: Arc<dyn CompletionClient>, template: Option<String>, budget: usize) -> Self {
        Self {
            client,
            template: template.unwrap_or_else(|| DEFAULT_TOPIC_PROMPT.to_string()),
            budget,
        }
    }

    /// Ask the model for a topic line. `None` means the document has no
    /// usable topic; the model is not even called for empty text.
    ///
    /// The text is cut to the first `budget` characters before it enters
    /// the prompt, so OCR blobs of any size produce bounded requests. The
    /// response is trimmed but otherwise passed through verbatim; whether
    /// it honoured the "SENDER - TOPIC" format is the sanitiser's problem,
    /// not ours.
    pub async fn infer(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }

        let excerpt: String = text.chars().take(self.budget).collect();
        let prompt = render_topic_prompt(&self.template, &excerpt);

        let response = match self.client.complete(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Topic inference failed: {}", e);
                return None;
            }
        };

        let topic = response.trim();
        if topic.is_empty() {
            warn!("Model returned an empty topic");
            return None;
        }

        Some(topic.to_string())
    }
}
