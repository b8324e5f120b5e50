//! Markdown export of original and translated text.
//!
//! Files are written atomically (temp file + rename) so an interrupted
//! export never leaves a truncated `.md` behind.

use crate::error::TranslateError;
use crate::output::Translation;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Which side of a translation to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportSide {
    Original,
    Translated,
}

/// `{stem}_original.md` or `{stem}_translated_{target}.md`.
///
/// `stem` is `file_name` without a trailing `.pdf`, with characters that are
/// unsafe in file names replaced by `_`.
pub fn export_filename(file_name: &str, side: ExportSide, target_language: &str) -> String {
    let stem = sanitize(strip_pdf_extension(file_name.trim()));
    match side {
        ExportSide::Original => format!("{stem}_original.md"),
        ExportSide::Translated => format!("{stem}_translated_{}.md", sanitize(target_language)),
    }
}

fn strip_pdf_extension(name: &str) -> &str {
    let n = name.len();
    if n > 4 && name.is_char_boundary(n - 4) && name[n - 4..].eq_ignore_ascii_case(".pdf") {
        &name[..n - 4]
    } else {
        name
    }
}

fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('.').to_string();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

/// Write `content` as UTF-8 to `dir/filename`, creating `dir` if needed.
pub fn export_markdown(content: &str, dir: &Path, filename: &str) -> Result<PathBuf, TranslateError> {
    let path = dir.join(filename);
    std::fs::create_dir_all(dir).map_err(|e| TranslateError::OutputWriteFailed {
        path: path.clone(),
        source: e,
    })?;
    write_atomic(&path, content.as_bytes()).map_err(|e| TranslateError::OutputWriteFailed {
        path: path.clone(),
        source: e,
    })?;
    info!("Wrote {}", path.display());
    Ok(path)
}

/// Export one side of a stored translation into `dir`.
pub fn export_translation(
    translation: &Translation,
    side: ExportSide,
    dir: &Path,
) -> Result<PathBuf, TranslateError> {
    let filename = export_filename(&translation.file_name, side, &translation.target_language);
    let content = match side {
        ExportSide::Original => &translation.original_text,
        ExportSide::Translated => &translation.translated_text,
    };
    export_markdown(content, dir, &filename)
}

/// Write to a sibling temp file, then rename over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp_path);
    })
}
