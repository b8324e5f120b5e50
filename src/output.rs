//! Results produced by extraction and translation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Text recognised from one PDF page. `text` is trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-indexed.
    pub page_number: usize,
    pub text: String,
}

/// Run totals for one PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Page count reported by the PDF.
    pub total_pages: usize,
    /// Pages sent to the endpoint (after the page cap).
    pub processed_pages: usize,
    /// Pages that came back empty and were dropped.
    pub skipped_pages: usize,
    /// Prompt tokens summed over successful attempts, when the endpoint reports usage.
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}

/// Ordered page records of one PDF.
///
/// Page numbers are strictly increasing and never exceed the page cap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub pages: Vec<PageRecord>,
    pub stats: DocumentStats,
}

impl Document {
    /// Join pages as `## Page N` sections separated by `---` rules.
    pub fn to_markdown(&self) -> String {
        self.pages
            .iter()
            .map(|p| format!("## Page {}\n\n{}\n\n", p.page_number, p.text))
            .collect::<Vec<_>>()
            .join("---\n\n")
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// One persisted translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub id: String,
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
    pub original_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
}

impl Translation {
    /// A fresh record with a random id, stamped now.
    pub fn new(
        file_name: impl Into<String>,
        original_text: impl Into<String>,
        translated_text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            timestamp: Utc::now(),
            original_text: original_text.into(),
            translated_text: translated_text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_joins_pages_with_rules() {
        let doc = Document {
            pages: vec![
                PageRecord {
                    page_number: 1,
                    text: "Intro".into(),
                },
                PageRecord {
                    page_number: 3,
                    text: "$$E = mc^2$$".into(),
                },
            ],
            stats: DocumentStats::default(),
        };
        assert_eq!(
            doc.to_markdown(),
            "## Page 1\n\nIntro\n\n---\n\n## Page 3\n\n$$E = mc^2$$\n\n"
        );
    }

    #[test]
    fn translation_serializes_camel_case() {
        let t = Translation::new("paper.pdf", "Hallo", "Hello", "de", "en");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["fileName"], "paper.pdf");
        assert_eq!(json["translatedText"], "Hello");
        assert_eq!(json["sourceLanguage"], "de");
        assert!(Uuid::parse_str(json["id"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn ids_are_unique() {
        let a = Translation::new("a", "", "", "auto", "en");
        let b = Translation::new("a", "", "", "auto", "en");
        assert_ne!(a.id, b.id);
    }
}
