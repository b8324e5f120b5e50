//! CLI binary for edgequake-pdftrans.
//!
//! A thin shim over the library crate: maps flags onto `PipelineConfig`,
//! resolves credentials from flags or the store, and prints results.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use edgequake_pdftrans::{
    cancel_pair, export_translation, load_input, CancelToken, Credentials, EngineSource, InputKind,
    ExportSide, LanguagePair, PipelineConfig, PipelineProgress, ProgressCallback, Translation,
    TranslationStore, Translator, LANGUAGES,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

fn truncate(msg: &str, max: usize) -> String {
    if msg.chars().count() > max {
        let head: String = msg.chars().take(max - 1).collect();
        format!("{head}\u{2026}")
    } else {
        msg.to_string()
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar plus one log line per page.
struct CliProgress {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    retries: AtomicUsize,
}

impl CliProgress {
    /// Spinner until the page count is known.
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            retries: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Reading");
        self.bar.reset_eta();
    }

    fn page_elapsed(&self, page_num: usize) -> String {
        let ms = self
            .start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        dim(&format!("{:.1}s", ms as f64 / 1000.0))
    }

    /// Switch to a spinner for the translation request.
    fn translating(&self, pair: &LanguagePair) {
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER);
        self.bar.reset();
        self.bar.set_style(style);
        self.bar.set_prefix("Translating");
        self.bar.set_message(pair.to_string());
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgress for CliProgress {
    fn on_document_start(&self, document_pages: usize, selected_pages: usize) {
        self.activate_bar(selected_pages);
        let note = if document_pages > selected_pages {
            format!(" (of {document_pages}; the rest are skipped)")
        } else {
            String::new()
        };
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {selected_pages} pages{note}…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_retry(&self, page_num: usize, attempt: u32, delay: Duration, error: &str) {
        self.retries.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Page {:>3}  attempt {} failed, retrying in {}s  {}",
            yellow("↻"),
            page_num,
            attempt,
            delay.as_secs(),
            dim(&truncate(error, 80)),
        ));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} chars")),
            self.page_elapsed(page_num),
        ));
        self.bar.inc(1);
    }

    fn on_page_skipped(&self, page_num: usize, total: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            dim("○"),
            page_num,
            total,
            dim("no text"),
            self.page_elapsed(page_num),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&truncate(error, 80)),
            self.page_elapsed(page_num),
        ));
        self.bar.finish_and_clear();
    }

    fn on_document_complete(&self, selected_pages: usize, kept_pages: usize) {
        let retries = self.retries.load(Ordering::SeqCst);
        let note = if retries > 0 {
            dim(&format!("  ({retries} retried requests)"))
        } else {
            String::new()
        };
        self.bar.println(format!(
            "{} {} of {} pages contained text{}",
            green("✔"),
            bold(&kept_pages.to_string()),
            selected_pages,
            note
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Store credentials once
  pdftrans config set --api-key sk-... --base-url https://api.openai.com

  # Extract Markdown from a PDF or an image
  pdftrans ocr paper.pdf -o paper.md
  pdftrans ocr scan.png

  # Translate a PDF to Japanese and save the record
  pdftrans translate paper.pdf --to ja

  # Translate text from stdin
  echo "Guten Morgen" | pdftrans text --to en

  # Browse and export saved translations
  pdftrans list
  pdftrans export 3f2a --side both --dir out/

LANGUAGES:
  zh en es fr de ru ja ko it pt nl tr ar hi th vi   (source may also be "auto")

LIMITS:
  PDFs: first 50 pages; each page is retried twice (1 s, then 2 s) before
  the whole document fails. Images: at most 5 MB, downscaled to 800 px.

ENVIRONMENT VARIABLES:
  PDFTRANS_API_KEY        API key (overrides the stored one)
  PDFTRANS_BASE_URL       Endpoint base URL (default https://api.openai.com)
  PDFTRANS_MODEL          Model ID (default gpt-4o-mini)
  PDFTRANS_STORE          Store directory (translations + credentials)
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips the download
  PDFIUM_MIRROR_URL       Mirror serving pdfium-binaries release archives
  PDFIUM_RELEASE          pdfium-binaries release tag
  PDFIUM_CACHE_DIR        Override the pdfium cache directory
"#;

/// Extract text from PDFs and images with vision LLMs, then translate it.
#[derive(Parser, Debug)]
#[command(
    name = "pdftrans",
    version,
    about = "Extract text from PDFs and images with vision LLMs, then translate it",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Directory holding saved translations and credentials.
    #[arg(long, global = true, env = "PDFTRANS_STORE")]
    store: Option<PathBuf>,

    /// API key; overrides the stored key.
    #[arg(long, global = true, env = "PDFTRANS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Endpoint base URL; overrides the stored one.
    #[arg(long, global = true, env = "PDFTRANS_BASE_URL")]
    base_url: Option<String>,

    /// Chat model ID.
    #[arg(long, global = true, env = "PDFTRANS_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFTRANS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "PDFTRANS_QUIET")]
    quiet: bool,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "PDFTRANS_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug, Clone)]
struct ExtractArgs {
    /// Upper bound on PDF pages processed (1–50).
    #[arg(
        long,
        env = "PDFTRANS_MAX_PAGES",
        default_value_t = 50,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=50)
    )]
    max_pages: usize,

    /// Retries per page after the first failed attempt.
    #[arg(long, env = "PDFTRANS_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFTRANS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Path to a text file replacing the page transcription system prompt.
    #[arg(long, env = "PDFTRANS_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Keep model output as-is (only trimmed).
    #[arg(long)]
    no_clean: bool,

    /// Per-request timeout in seconds.
    #[arg(long, env = "PDFTRANS_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Download timeout for URL inputs in seconds.
    #[arg(long, env = "PDFTRANS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Args, Debug, Clone)]
struct LanguageArgs {
    /// Source language code, or "auto".
    #[arg(long, default_value = "auto")]
    from: String,

    /// Target language code.
    #[arg(long, short = 't', env = "PDFTRANS_TARGET", default_value = "en")]
    to: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract Markdown from a PDF or image without translating.
    Ocr {
        /// Local file path or HTTP/HTTPS URL.
        input: String,

        /// Write Markdown to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Extract, translate and save a PDF or image.
    Translate {
        /// Local file path or HTTP/HTTPS URL.
        input: String,

        #[command(flatten)]
        languages: LanguageArgs,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Translate text given as an argument or on stdin, and save it.
    Text {
        /// Text to translate; read from stdin when omitted.
        text: Option<String>,

        #[command(flatten)]
        languages: LanguageArgs,
    },

    /// List saved translations, newest first.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print one saved translation.
    Show {
        /// Record id or unique id prefix.
        id: String,

        /// Print the original text instead of the translation.
        #[arg(long)]
        original: bool,
    },

    /// Delete a saved translation.
    Remove {
        /// Record id or unique id prefix.
        id: String,
    },

    /// Export a saved translation as Markdown files.
    Export {
        /// Record id or unique id prefix.
        id: String,

        /// Which side(s) to write.
        #[arg(long, value_enum, default_value = "both")]
        side: SideArg,

        /// Output directory.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Show or change stored credentials.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// List supported language codes.
    Languages,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Store the API key and base URL.
    Set {
        #[arg(long)]
        api_key: String,

        /// Base URL; a trailing slash is removed. Empty means the default.
        #[arg(long, default_value = "")]
        base_url: String,
    },
    /// Show stored credentials (key masked).
    Show,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SideArg {
    Original,
    Translated,
    Both,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let g = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the user-facing feedback, so library INFO
    // logs are hidden while it is active.
    let show_progress = !g.quiet && !g.no_progress && io::stderr().is_terminal();
    let filter = if g.verbose {
        "debug"
    } else if g.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let store_dir = g.store.clone().unwrap_or_else(TranslationStore::default_dir);
    let mut store = TranslationStore::open(&store_dir)
        .with_context(|| format!("Failed to open store at {}", store_dir.display()))?;

    match &cli.command {
        Command::Ocr {
            input,
            output,
            extract,
        } => {
            let credentials = resolve_credentials(g, &store)?;
            let progress = show_progress.then(CliProgress::new);
            let config = build_config(g, extract, progress.clone()).await?;
            let loaded = load_input(input, extract.download_timeout)
                .await
                .context("Failed to read input")?;
            if loaded.kind == InputKind::Pdf {
                ensure_engine(&config.engine, g.quiet).await;
            }

            let cancel = cancel_on_ctrl_c();
            let translator = Translator::new(config).context("Invalid configuration")?;
            let result = translator.extract_text(loaded, &credentials, &cancel).await;
            if let Some(p) = &progress {
                p.finish();
            }
            let text = result.context("Extraction failed")?;

            match output {
                Some(path) => {
                    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .context("Output path has no file name")?;
                    let written = edgequake_pdftrans::export_markdown(&text, dir, &name)?;
                    if !g.quiet {
                        eprintln!("{}  →  {}", green("✔"), bold(&written.display().to_string()));
                    }
                }
                None => print_text(&text)?,
            }
        }

        Command::Translate {
            input,
            languages,
            extract,
        } => {
            let pair = LanguagePair::new(&languages.from, &languages.to)?;
            let credentials = resolve_credentials(g, &store)?;
            let progress = show_progress.then(CliProgress::new);
            let config = build_config(g, extract, progress.clone()).await?;
            let loaded = load_input(input, extract.download_timeout)
                .await
                .context("Failed to read input")?;
            if loaded.kind == InputKind::Pdf {
                ensure_engine(&config.engine, g.quiet).await;
            }

            let cancel = cancel_on_ctrl_c();
            let translator = Translator::new(config).context("Invalid configuration")?;
            let file_name = loaded.name.clone();
            let original = match translator.extract_text(loaded, &credentials, &cancel).await {
                Ok(t) => t,
                Err(e) => {
                    if let Some(p) = &progress {
                        p.finish();
                    }
                    return Err(e).context("Extraction failed");
                }
            };

            if let Some(p) = &progress {
                p.translating(&pair);
            }
            let translated = translator
                .translate_text(&original, &pair, &credentials, &cancel)
                .await;
            if let Some(p) = &progress {
                p.finish();
            }
            let translated = translated.context("Translation failed")?;

            let record = Translation::new(file_name, original, translated, pair.source(), pair.target());
            store.add(record.clone())?;
            print_text(&record.translated_text)?;
            if !g.quiet {
                eprintln!(
                    "{} saved as {}  {}",
                    green("✔"),
                    bold(short_id(&record.id)),
                    dim(&format!("({pair})"))
                );
            }
        }

        Command::Text { text, languages } => {
            let pair = LanguagePair::new(&languages.from, &languages.to)?;
            let credentials = resolve_credentials(g, &store)?;
            let text = match text {
                Some(t) => t.clone(),
                None => {
                    let mut buf = String::new();
                    io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read stdin")?;
                    buf
                }
            };
            let config = PipelineConfig::builder()
                .model(g.model.clone())
                .build()
                .context("Invalid configuration")?;
            let translator = Translator::new(config)?;
            let cancel = cancel_on_ctrl_c();
            let record = translator
                .process_text(&text, &pair, &credentials, &mut store, &cancel)
                .await
                .context("Translation failed")?;
            print_text(&record.translated_text)?;
            if !g.quiet {
                eprintln!("{} saved as {}", green("✔"), bold(short_id(&record.id)));
            }
        }

        Command::List { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(store.list())?);
            } else if store.list().is_empty() {
                eprintln!("{}", dim("No saved translations."));
            } else {
                for t in store.list() {
                    println!(
                        "{}  {}  {:<5} → {:<3}  {}",
                        bold(short_id(&t.id)),
                        dim(&t.timestamp.format("%Y-%m-%d %H:%M").to_string()),
                        t.source_language,
                        t.target_language,
                        t.file_name
                    );
                }
            }
        }

        Command::Show { id, original } => {
            let t = find(&store, id)?;
            print_text(if *original {
                &t.original_text
            } else {
                &t.translated_text
            })?;
        }

        Command::Remove { id } => {
            let full_id = find(&store, id)?.id.clone();
            store.remove(&full_id)?;
            if !g.quiet {
                eprintln!("{} removed {}", green("✔"), short_id(&full_id));
            }
        }

        Command::Export { id, side, dir } => {
            let t = find(&store, id)?.clone();
            let sides: &[ExportSide] = match side {
                SideArg::Original => &[ExportSide::Original],
                SideArg::Translated => &[ExportSide::Translated],
                SideArg::Both => &[ExportSide::Original, ExportSide::Translated],
            };
            for s in sides {
                let path = export_translation(&t, *s, dir)?;
                if !g.quiet {
                    eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
                }
            }
        }

        Command::Config(ConfigCommand::Set { api_key, base_url }) => {
            let creds = store.set_credentials(api_key, base_url)?;
            eprintln!(
                "{} saved key {} for {}",
                green("✔"),
                creds.masked_key(),
                creds.base_url
            );
        }

        Command::Config(ConfigCommand::Show) => {
            let creds = store.credentials();
            println!("Store:     {}", store.dir().display());
            println!(
                "API key:   {}",
                if creds.api_key.is_empty() {
                    dim("(not set)")
                } else {
                    creds.masked_key()
                }
            );
            println!("Base URL:  {}", creds.base_url);
        }

        Command::Languages => {
            for (code, name) in LANGUAGES {
                println!("{code}  {name}");
            }
        }
    }

    Ok(())
}

/// Flag/env values win over the store; the key must end up non-empty.
fn resolve_credentials(g: &GlobalArgs, store: &TranslationStore) -> Result<Credentials> {
    let stored = store.credentials();
    let api_key = g.api_key.clone().unwrap_or_else(|| stored.api_key.clone());
    let base_url = g.base_url.clone().unwrap_or_else(|| stored.base_url.clone());
    let creds = Credentials::new(api_key, base_url);
    if creds.ensure_configured().is_err() {
        bail!(
            "No API key configured. Run `pdftrans config set --api-key …` or set PDFTRANS_API_KEY."
        );
    }
    Ok(creds)
}

/// Map CLI args to `PipelineConfig`.
async fn build_config(
    g: &GlobalArgs,
    extract: &ExtractArgs,
    progress: Option<Arc<CliProgress>>,
) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .model(g.model.clone())
        .max_pages(extract.max_pages)
        .max_retries(extract.max_retries)
        .clean_markdown(!extract.no_clean)
        .request_timeout_secs(extract.api_timeout)
        .download_timeout_secs(extract.download_timeout);

    if let Some(ref path) = extract.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref pwd) = extract.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb as ProgressCallback);
    }

    builder.build().context("Invalid configuration")
}

/// Make sure a PDFium library is available, showing a download bar on the
/// first run. Failures are reported but not fatal: binding falls back to a
/// system-wide library and reports its own error.
async fn ensure_engine(engine: &EngineSource, quiet: bool) {
    if engine.cached_library().is_some() {
        return;
    }

    let result = if quiet {
        tokio::task::block_in_place(|| pdfium_fetch::ensure_library(engine, None))
    } else {
        let dl_bar = ProgressBar::new(0);
        dl_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(SPINNER),
        );
        dl_bar.set_prefix("PDF engine");
        dl_bar.enable_steady_tick(Duration::from_millis(80));

        let bar = dl_bar.clone();
        let r = tokio::task::block_in_place(|| {
            pdfium_fetch::ensure_library(
                engine,
                Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }),
            )
        });
        dl_bar.finish_and_clear();
        r
    };

    if let Err(e) = result {
        eprintln!("{} PDF engine download failed: {e}", yellow("⚠"));
    }
}

/// A token cancelled by the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancelToken {
    let (handle, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{} cancelling…", yellow("⚠"));
            handle.cancel();
        }
    });
    token
}

fn find<'a>(store: &'a TranslationStore, id: &str) -> Result<&'a Translation> {
    store
        .get(id)
        .with_context(|| format!("No unique saved translation matches '{id}'"))
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn print_text(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_pages_of(args: &[&str]) -> Result<usize, clap::Error> {
        let cli = Cli::try_parse_from(args)?;
        match cli.command {
            Command::Ocr { extract, .. } => Ok(extract.max_pages),
            other => panic!("expected ocr, got {other:?}"),
        }
    }

    #[test]
    fn max_pages_flag_is_limited_to_fifty() {
        assert_eq!(max_pages_of(&["pdftrans", "ocr", "a.pdf"]).unwrap(), 50);
        assert_eq!(max_pages_of(&["pdftrans", "ocr", "a.pdf", "--max-pages", "50"]).unwrap(), 50);
        assert!(max_pages_of(&["pdftrans", "ocr", "a.pdf", "--max-pages", "80"]).is_err());
        assert!(max_pages_of(&["pdftrans", "ocr", "a.pdf", "--max-pages", "0"]).is_err());
    }
}
