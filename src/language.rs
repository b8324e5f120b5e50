//! Supported languages.
//!
//! Targets are one of sixteen ISO 639-1 codes. The source may also be
//! [`AUTO`], in which case the translation prompt leaves it unnamed.

use crate::error::TranslateError;
use std::fmt;

/// Source-language code meaning "detect automatically".
pub const AUTO: &str = "auto";

/// `(code, English name)` for every supported language.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("zh", "Chinese"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("nl", "Dutch"),
    ("tr", "Turkish"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("th", "Thai"),
    ("vi", "Vietnamese"),
];

/// English name for a code, or `None` when unsupported.
pub fn display_name(code: &str) -> Option<&'static str> {
    let code = code.trim().to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// A validated source → target pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    source: String,
    target: String,
    target_name: &'static str,
}

impl LanguagePair {
    /// Validate both codes. `source` may be `"auto"`; `target` may not.
    pub fn new(source: &str, target: &str) -> Result<Self, TranslateError> {
        let source = source.trim().to_ascii_lowercase();
        let target = target.trim().to_ascii_lowercase();
        if source != AUTO && display_name(&source).is_none() {
            return Err(TranslateError::UnsupportedLanguage(source));
        }
        let Some(target_name) = display_name(&target) else {
            return Err(TranslateError::UnsupportedLanguage(target));
        };
        Ok(Self {
            source,
            target,
            target_name,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Display name of the source, `None` for auto-detect.
    pub fn source_name(&self) -> Option<&'static str> {
        display_name(&self.source)
    }

    pub fn target_name(&self) -> &'static str {
        self.target_name
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.source, self.target)
    }
}
