//! Translation workflow: extract → translate → record.
//!
//! [`Translator`] ties the extraction pipeline, the translation request and
//! the [`TranslationStore`] together. One completion backend is shared by
//! every request the translator makes.

use crate::cancel::CancelToken;
use crate::config::{Credentials, PipelineConfig};
use crate::convert::{self, resolve_backend};
use crate::error::TranslateError;
use crate::language::LanguagePair;
use crate::output::Translation;
use crate::pipeline::input::{load_input, LoadedInput};
use crate::pipeline::llm::{ChatMessage, ChatRequest, CompletionBackend};
use crate::prompts::translation_system_prompt;
use crate::store::TranslationStore;
use std::sync::Arc;
use tracing::info;

/// `file_name` recorded for pasted-text translations.
pub const TEXT_TRANSLATION_NAME: &str = "Text translation";

/// Extracts and translates documents with one shared backend.
pub struct Translator {
    config: PipelineConfig,
    backend: Arc<dyn CompletionBackend>,
}

impl Translator {
    /// Build a translator. Without a backend in `config`, an HTTP client is
    /// created once and reused for extraction and translation.
    pub fn new(mut config: PipelineConfig) -> Result<Self, TranslateError> {
        let backend = resolve_backend(&config)?;
        config.backend = Some(Arc::clone(&backend));
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Text of a PDF (page sections) or an image.
    ///
    /// # Errors
    /// [`TranslateError::NoTextExtracted`] when nothing legible came back.
    pub async fn extract_text(
        &self,
        input: LoadedInput,
        credentials: &Credentials,
        cancel: &CancelToken,
    ) -> Result<String, TranslateError> {
        credentials.ensure_configured()?;
        let name = input.name.clone();
        let text = convert::extract_text(input, credentials, &self.config, cancel).await?;
        if text.trim().is_empty() {
            return Err(TranslateError::NoTextExtracted { name });
        }
        Ok(text)
    }

    /// Translate `text` in one request. Formatting is preserved by the
    /// prompt; the reply is returned trimmed.
    pub async fn translate_text(
        &self,
        text: &str,
        pair: &LanguagePair,
        credentials: &Credentials,
        cancel: &CancelToken,
    ) -> Result<String, TranslateError> {
        credentials.ensure_configured()?;
        let request = build_translation_request(
            &self.config.model,
            text,
            pair,
            self.config.temperature,
        );
        info!("Translating {} chars ({})", text.len(), pair);

        let completion = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TranslateError::Cancelled),
            r = self.backend.complete(credentials, &request) => r.map_err(TranslateError::Translation)?,
        };
        Ok(completion.content)
    }

    /// Load `input` (path or URL), extract, translate, and prepend the
    /// record to `store`.
    pub async fn process_file(
        &self,
        input: &str,
        pair: &LanguagePair,
        credentials: &Credentials,
        store: &mut TranslationStore,
        cancel: &CancelToken,
    ) -> Result<Translation, TranslateError> {
        credentials.ensure_configured()?;
        let loaded = load_input(input, self.config.download_timeout_secs).await?;
        let file_name = loaded.name.clone();

        let original = self.extract_text(loaded, credentials, cancel).await?;
        let translated = self.translate_text(&original, pair, credentials, cancel).await?;

        let record = Translation::new(file_name, original, translated, pair.source(), pair.target());
        store.add(record.clone())?;
        info!("Saved translation {} for '{}'", record.id, record.file_name);
        Ok(record)
    }

    /// Translate pasted text and prepend the record to `store`.
    pub async fn process_text(
        &self,
        text: &str,
        pair: &LanguagePair,
        credentials: &Credentials,
        store: &mut TranslationStore,
        cancel: &CancelToken,
    ) -> Result<Translation, TranslateError> {
        credentials.ensure_configured()?;
        if text.trim().is_empty() {
            return Err(TranslateError::NoTextExtracted {
                name: TEXT_TRANSLATION_NAME.to_string(),
            });
        }
        let translated = self.translate_text(text, pair, credentials, cancel).await?;
        let record = Translation::new(
            TEXT_TRANSLATION_NAME,
            text,
            translated,
            pair.source(),
            pair.target(),
        );
        store.add(record.clone())?;
        Ok(record)
    }
}

/// System prompt naming the languages, then the text as the user turn.
pub fn build_translation_request(
    model: &str,
    text: &str,
    pair: &LanguagePair,
    temperature: Option<f32>,
) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(translation_system_prompt(pair.source_name(), pair.target_name())),
            ChatMessage::user(text),
        ],
        temperature,
    }
}
