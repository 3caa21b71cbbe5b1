//! Configuration for a rename run.
//!
//! All behaviour is controlled through [`RenameConfig`], built via its
//! [`RenameConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to map CLI flags onto it, to serialise it for logging, and to construct
//! fixtures in tests instead of relying on fixed constants.

use crate::error::ScanSortError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for processing one Drive folder.
///
/// Built via [`RenameConfig::builder()`] or [`RenameConfig::default()`].
///
/// # Example
/// ```rust
/// use scansort::RenameConfig;
///
/// let config = RenameConfig::builder()
///     .dpi(300)
///     .model("llama3:8b")
///     .text_budget(4000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RenameConfig {
    /// Rasterisation DPI for OCR. Range: 72–600. Default: 300.
    ///
    /// 300 DPI is the conventional sweet spot for tesseract on letter-sized
    /// scans; lower values lose small print, higher values just cost time.
    pub dpi: u32,

    /// LLM model identifier, e.g. "llama3:8b". If `None`, the provider
    /// default is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "ollama", "openai"). If `None` along with
    /// `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the completion. Default: 0.1.
    ///
    /// The model is transcribing a sender and topic it can read in the text;
    /// creativity only hurts here.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate. Default: 128.
    ///
    /// The expected response is one short "SENDER - TOPIC" line; 128 tokens
    /// leaves headroom for verbose models without paying for runaways.
    pub max_tokens: usize,

    /// Custom topic prompt template. Must contain a `{text}` placeholder.
    /// If `None`, the built-in template is used.
    pub prompt_template: Option<String>,

    /// Maximum number of characters of OCR text forwarded to the LLM.
    /// Longer text is cut to exactly this prefix. Default: 4000.
    pub text_budget: usize,

    /// Maximum length of the sanitised base name, in characters. Default: 150.
    pub max_name_length: usize,

    /// Tesseract language code(s), e.g. "eng" or "deu+eng". Default: "eng".
    pub ocr_language: String,

    /// Path to the tesseract binary. Default: "tesseract" (resolved via PATH).
    pub tesseract_path: String,

    /// Path to the persisted Drive token file. Default: "token.json".
    pub token_file: PathBuf,

    /// HTTP timeout for Drive requests in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Report what would be renamed without issuing rename requests.
    /// Default: false.
    pub dry_run: bool,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 128,
            prompt_template: None,
            text_budget: 4000,
            max_name_length: 150,
            ocr_language: "eng".to_string(),
            tesseract_path: "tesseract".to_string(),
            token_file: PathBuf::from("token.json"),
            request_timeout_secs: 120,
            dry_run: false,
        }
    }
}

impl fmt::Debug for RenameConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenameConfig")
            .field("dpi", &self.dpi)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("text_budget", &self.text_budget)
            .field("max_name_length", &self.max_name_length)
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_path", &self.tesseract_path)
            .field("token_file", &self.token_file)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl RenameConfig {
    /// Create a new builder for `RenameConfig`.
    pub fn builder() -> RenameConfigBuilder {
        RenameConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RenameConfig`].
#[derive(Debug)]
pub struct RenameConfigBuilder {
    config: RenameConfig,
}

impl RenameConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn text_budget(mut self, chars: usize) -> Self {
        self.config.text_budget = chars;
        self
    }

    pub fn max_name_length(mut self, chars: usize) -> Self {
        self.config.max_name_length = chars;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<String>) -> Self {
        self.config.tesseract_path = path.into();
        self
    }

    pub fn token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.token_file = path.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn dry_run(mut self, v: bool) -> Self {
        self.config.dry_run = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenameConfig, ScanSortError> {
        let c = &self.config;
        if c.text_budget == 0 {
            return Err(ScanSortError::InvalidConfig(
                "Text budget must be ≥ 1 character".into(),
            ));
        }
        if c.max_name_length == 0 {
            return Err(ScanSortError::InvalidConfig(
                "Maximum name length must be ≥ 1 character".into(),
            ));
        }
        if let Some(ref template) = c.prompt_template {
            if !template.contains("{text}") {
                return Err(ScanSortError::InvalidConfig(
                    "Prompt template must contain a {text} placeholder".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
