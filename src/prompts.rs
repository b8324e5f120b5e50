//! Every prompt sent to the completion endpoint.
//!
//! Kept in one place so a wording change is a one-line diff and tests can
//! inspect the exact text without a live model.
//!
//! The PDF page prompt can be replaced through
//! [`crate::config::PipelineConfig::system_prompt`]; the image and
//! translation prompts are fixed.

/// System instruction for a rendered PDF page.
pub const PDF_PAGE_SYSTEM_PROMPT: &str =
    "You are a PDF document parser. Output the content of the image using Markdown and LaTeX syntax.";

/// User instruction sent alongside each page image.
pub const PDF_PAGE_USER_PROMPT: &str = r#"Transcribe the content of this PDF page as Markdown.

Rules:
1. Write in the same language as the page. Do not translate.
2. Output only the page content: no explanations, no commentary, and do not wrap the output in ```markdown fences.
3. Write block formulas as $$ ... $$ and inline formulas as $ ... $.
4. Convert tables to Markdown tables.
5. Ignore long decorative lines, running headers and footers, and page numbers."#;

/// System instruction for a standalone image.
pub const IMAGE_SYSTEM_PROMPT: &str =
    "You are an image text recognizer. Output the text found in the image using Markdown syntax.";

/// User instruction sent alongside a standalone image.
pub const IMAGE_USER_PROMPT: &str = r#"Recognize the text in this image and output it as Markdown.

Rules:
1. Keep the original formatting and layout.
2. Ignore watermarks and page numbers.
3. Output the text directly, without any explanation."#;

/// System prompt for a translation request.
///
/// `source` is the display name of the source language, or `None` when the
/// source is auto-detected. `target` is the display name of the target.
pub fn translation_system_prompt(source: Option<&str>, target: &str) -> String {
    let from = match source {
        Some(name) => format!("the following {name} text"),
        None => "the following text".to_string(),
    };
    format!(
        "You are a professional translator. Translate {from} into {target}.\n\
Important:\n\
1. Strictly preserve all formatting of the original, including line breaks, spacing and indentation.\n\
2. Do not change the paragraph structure or layout.\n\
3. Keep technical terminology accurate.\n\
4. Make the translation natural and idiomatic.\n\
5. Do not add any explanations or notes.\n\
6. Return only the translation, with nothing else."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_prompt_names_both_languages() {
        let p = translation_system_prompt(Some("French"), "Japanese");
        assert!(p.contains("following French text into Japanese"));
        assert!(p.contains("6. Return only the translation"));
    }

    #[test]
    fn auto_source_is_omitted() {
        let p = translation_system_prompt(None, "English");
        assert!(p.contains("Translate the following text into English."));
    }

    #[test]
    fn page_prompt_forbids_fences() {
        assert!(PDF_PAGE_USER_PROMPT.contains("```markdown"));
        assert!(PDF_PAGE_SYSTEM_PROMPT.contains("LaTeX"));
    }
}
