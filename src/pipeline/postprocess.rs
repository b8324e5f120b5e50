//! Post-processing: deterministic cleanup of model-generated Markdown.
//!
//! ## Why is post-processing necessary?
//!
//! Even when told not to, models sometimes wrap the whole answer in a
//! ` ```markdown ` fence, answer with `\r\n` line endings, pad lines with
//! trailing spaces, or leave zero-width characters behind. None of that is
//! content, and all of it shows up in exports and in the translation input.
//!
//! The rules are plain string/regex passes that never touch content. The
//! empty-page check looks at the raw reply, so cleanup only runs on pages
//! that are kept.
//!
//! ## Rule Order
//!
//! Line endings go first so every later rule sees `\n` only; invisible
//! characters go before fence stripping so a leading BOM cannot hide the
//! opening fence.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every rule, then trim the result.
///
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, word joiners)
/// 3. Strip an outer ` ```markdown ` / ` ```md ` / ` ``` ` fence around the whole answer
/// 4. Trim trailing whitespace per line
/// 5. Collapse runs of blank lines to a single blank line
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = strip_outer_fence(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: line endings ─────────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: invisible characters ─────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}', '\u{00AD}'],
        "",
    )
}

// ── Rule 3: outer fence ──────────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:markdown|md)?[ \t]*\n(.*?)\n?```$").expect("literal regex")
});

fn strip_outer_fence(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCE.captures(trimmed) {
        // A fence inside the body means the outer pair is not a wrapper.
        Some(caps) if !caps[1].contains("\n```") => caps[1].to_string(),
        _ => input.to_string(),
    }
}

// ── Rule 4: trailing whitespace ──────────────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: blank-line runs ──────────────────────────────────────────────

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("literal regex"));

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUN.replace_all(input, "\n\n").into_owned()
}
