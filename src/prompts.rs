//! Prompt for extracting a sender and topic from OCR'd document text.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tweaking the instruction (e.g. adding a
//!    language hint) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can render and inspect the prompt without
//!    calling a real model.
//!
//! Callers can override the template via
//! [`crate::config::RenameConfig::prompt_template`]; the constant here is used
//! only when no override is provided. Templates embed the document text at the
//! `{text}` placeholder.

/// Default prompt template for sender/topic extraction.
///
/// The task statement is repeated after the text on purpose: with long OCR
/// blobs, small local models tend to forget instructions given only at the
/// top of the prompt.
pub const DEFAULT_TOPIC_PROMPT: &str = r#"The following text is a text of a letter or invoice obtained via OCR, likely in German or English.
Extract the sender and the short topic (3-5 words) from it, to use as a file name.
Avoid including any introductory or concluding remarks like 'The topic is:' or similar.

TEXT:
{text}
END OF TEXT

Remember, your task is to extract the sender and the short topic (3-5 words) from it, to use as a file name.
Respond ONLY in the format "SENDER - TOPIC", without any markup, comments or surrounding text.
"#;

/// Render a topic prompt by substituting `{text}` in the template.
pub fn render_topic_prompt(template: &str, text: &str) -> String {
    template.replace("{text}", text)
}
