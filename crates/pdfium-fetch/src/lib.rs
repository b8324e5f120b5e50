//! # pdfium-fetch
//!
//! Resolve a usable PDFium shared library for `pdfium-render` without baking
//! any download location into the binary.
//!
//! Every location is described by an [`EngineSource`]: an explicit library
//! path, a mirror serving `pdfium-binaries`-style release archives, a release
//! tag, and a cache directory. [`EngineSource::from_env`] fills those in from
//! the environment so deployments behind a proxy or without internet access
//! can point at their own mirror or a preinstalled library.
//!
//! Resolution order used by [`ensure_library`]:
//!
//! 1. `library_path`, when it exists on disk.
//! 2. The cached library under `cache_dir()`.
//! 3. Download `{mirror}/chromium%2F{release}/{archive}` and extract it into
//!    the cache.
//!
//! [`bind`] additionally falls back to the system library when no download
//! is possible (offline mirror, unsupported platform).
//!
//! ## Environment variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `PDFIUM_LIB_PATH`   | `library_path` |
//! | `PDFIUM_MIRROR_URL` | `mirror_url` |
//! | `PDFIUM_RELEASE`    | `release` |
//! | `PDFIUM_CACHE_DIR`  | `cache_root` |

use std::io::Read;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Release tag of `bblanchon/pdfium-binaries` used when none is configured.
pub const DEFAULT_RELEASE: &str = "7690";

/// Default mirror: the GitHub release download root of `pdfium-binaries`.
pub const DEFAULT_MIRROR_URL: &str =
    "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Errors returned while locating or binding PDFium.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No PDFium build is published for {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cache directory '{path}' is not writable: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download of '{url}' failed: {reason}")]
    Download { url: String, reason: String },

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

/// Per-platform archive layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub archive: &'static str,
    pub member: &'static str,
    pub file_name: &'static str,
}

const MAC_LIB: (&str, &str) = ("lib/libpdfium.dylib", "libpdfium.dylib");
const LINUX_LIB: (&str, &str) = ("lib/libpdfium.so", "libpdfium.so");
const WIN_LIB: (&str, &str) = ("bin/pdfium.dll", "pdfium.dll");

/// Map an `(os, arch)` pair to its archive layout.
pub fn target_for(os: &str, arch: &str) -> Result<Target, FetchError> {
    let (archive, (member, file_name)) = match (os, arch) {
        ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", MAC_LIB),
        ("macos", "x86_64") => ("pdfium-mac-x64.tgz", MAC_LIB),
        ("linux", "x86_64") => ("pdfium-linux-x64.tgz", LINUX_LIB),
        ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", LINUX_LIB),
        ("windows", "x86_64") => ("pdfium-win-x64.tgz", WIN_LIB),
        ("windows", "aarch64") => ("pdfium-win-arm64.tgz", WIN_LIB),
        ("windows", "x86") => ("pdfium-win-x86.tgz", WIN_LIB),
        _ => {
            return Err(FetchError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };
    Ok(Target {
        archive,
        member,
        file_name,
    })
}

/// Target for the running host.
pub fn host_target() -> Result<Target, FetchError> {
    target_for(std::env::consts::OS, std::env::consts::ARCH)
}

/// Where to find (or fetch) the PDFium library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSource {
    /// Use this library file directly when it exists.
    pub library_path: Option<PathBuf>,
    /// Base URL serving `chromium%2F{release}/{archive}`; no trailing slash.
    pub mirror_url: String,
    /// Release tag appended to the mirror URL.
    pub release: String,
    /// Root of the download cache; `None` uses the platform cache dir.
    pub cache_root: Option<PathBuf>,
}

impl Default for EngineSource {
    fn default() -> Self {
        Self {
            library_path: None,
            mirror_url: DEFAULT_MIRROR_URL.to_string(),
            release: DEFAULT_RELEASE.to_string(),
            cache_root: None,
        }
    }
}

impl EngineSource {
    /// Defaults overridden by `PDFIUM_*` environment variables.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let mut source = Self::default();
        if let Some(p) = non_empty("PDFIUM_LIB_PATH") {
            source.library_path = Some(PathBuf::from(p));
        }
        if let Some(url) = non_empty("PDFIUM_MIRROR_URL") {
            source.mirror_url = url.trim_end_matches('/').to_string();
        }
        if let Some(release) = non_empty("PDFIUM_RELEASE") {
            source.release = release;
        }
        if let Some(dir) = non_empty("PDFIUM_CACHE_DIR") {
            source.cache_root = Some(PathBuf::from(dir));
        }
        source
    }

    /// Versioned cache directory, e.g. `~/.cache/pdftrans/pdfium-7690`.
    pub fn cache_dir(&self) -> PathBuf {
        let root = match &self.cache_root {
            Some(root) => root.clone(),
            None => dirs::cache_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
                .unwrap_or_else(std::env::temp_dir)
                .join("pdftrans"),
        };
        root.join(format!("pdfium-{}", self.release))
    }

    /// Full download URL of the archive for `target`.
    pub fn archive_url(&self, target: &Target) -> String {
        format!(
            "{}/chromium%2F{}/{}",
            self.mirror_url.trim_end_matches('/'),
            self.release,
            target.archive
        )
    }

    /// The library that would be loaded without touching the network, if any.
    pub fn cached_library(&self) -> Option<PathBuf> {
        if let Some(p) = self.library_path.as_ref().filter(|p| p.exists()) {
            return Some(p.clone());
        }
        let target = host_target().ok()?;
        let path = self.cache_dir().join(target.file_name);
        path.exists().then_some(path)
    }
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// Return a local path to the PDFium library, downloading it if needed.
///
/// Blocking: run it on a blocking thread when called from async code.
pub fn ensure_library(
    source: &EngineSource,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, FetchError> {
    if let Some(path) = source.cached_library() {
        debug!("Using PDFium at {}", path.display());
        return Ok(path);
    }
    if let Some(ref p) = source.library_path {
        warn!("PDFIUM_LIB_PATH '{}' does not exist; falling back to the mirror", p.display());
    }

    let target = host_target()?;
    let cache_dir = source.cache_dir();
    std::fs::create_dir_all(&cache_dir).map_err(|e| FetchError::CacheDir {
        path: cache_dir.clone(),
        source: e,
    })?;

    let url = source.archive_url(&target);
    info!("Downloading PDFium from {}", url);
    let archive = download(&url, on_progress)?;

    let dest = cache_dir.join(target.file_name);
    extract_member(&archive, target.member, &dest)?;
    info!("PDFium cached at {}", dest.display());
    Ok(dest)
}

/// Bind PDFium described by `source`, falling back to the system library.
pub fn bind(source: &EngineSource) -> Result<Pdfium, FetchError> {
    match ensure_library(source, None) {
        Ok(path) => bind_path(&path),
        Err(fetch_err) => {
            warn!("PDFium unavailable from mirror ({fetch_err}); trying system library");
            Pdfium::bind_to_system_library()
                .map(Pdfium::new)
                .map_err(|_| fetch_err)
        }
    }
}

/// Bind the library at an explicit path.
pub fn bind_path(path: &Path) -> Result<Pdfium, FetchError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| FetchError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn download(url: &str, on_progress: Option<DownloadProgress<'_>>) -> Result<Vec<u8>, FetchError> {
    let fail = |reason: String| FetchError::Download {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-fetch/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| fail(e.to_string()))?;

    let mut response = client.get(url).send().map_err(|e| fail(e.to_string()))?;
    if !response.status().is_success() {
        return Err(fail(format!("HTTP {}", response.status())));
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(32 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; 64 * 1024];
    let mut downloaded = 0u64;

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(fail(format!("read error: {e}"))),
        }
    }

    Ok(buf)
}

/// Extract one member of a `.tgz` archive to `dest`.
fn extract_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), FetchError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let extract_err = |e: std::io::Error| FetchError::Extract(e.to_string());
    let mut archive = Archive::new(GzDecoder::new(archive));

    for entry in archive.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        let matches = entry.path().map_err(extract_err)?.to_string_lossy() == member;
        if matches {
            entry
                .unpack(dest)
                .map_err(|e| FetchError::Extract(format!("unpack {member}: {e}")))?;
            return Ok(());
        }
    }

    Err(FetchError::Extract(format!("'{member}' not found in archive")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_targets_resolve() {
        let linux = target_for("linux", "x86_64").unwrap();
        assert_eq!(linux.archive, "pdfium-linux-x64.tgz");
        assert_eq!(linux.member, "lib/libpdfium.so");

        let win = target_for("windows", "x86").unwrap();
        assert_eq!(win.file_name, "pdfium.dll");
    }

    #[test]
    fn unknown_target_is_rejected() {
        let err = target_for("plan9", "mips").unwrap_err();
        assert!(err.to_string().contains("plan9/mips"));
    }

    #[test]
    fn archive_url_uses_configured_mirror() {
        let source = EngineSource {
            mirror_url: "https://mirror.internal/pdfium/".into(),
            release: "1234".into(),
            ..EngineSource::default()
        };
        let target = target_for("macos", "aarch64").unwrap();
        assert_eq!(
            source.archive_url(&target),
            "https://mirror.internal/pdfium/chromium%2F1234/pdfium-mac-arm64.tgz"
        );
    }

    #[test]
    fn cache_dir_is_versioned_under_root() {
        let source = EngineSource {
            cache_root: Some(PathBuf::from("/tmp/pdftrans-cache")),
            release: "42".into(),
            ..EngineSource::default()
        };
        assert_eq!(source.cache_dir(), PathBuf::from("/tmp/pdftrans-cache/pdfium-42"));
    }

    #[test]
    fn missing_library_path_is_not_cached() {
        let source = EngineSource {
            library_path: Some(PathBuf::from("/definitely/not/libpdfium.so")),
            cache_root: Some(std::env::temp_dir().join("pdfium-fetch-empty-cache")),
            ..EngineSource::default()
        };
        assert!(source.cached_library().is_none());
    }

    #[test]
    fn extract_member_reports_missing_entry() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        let data = b"not a library";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "lib/README", &data[..])
            .unwrap();
        let bytes = builder.into_inner().unwrap().finish().unwrap();

        let dest = std::env::temp_dir().join("pdfium-fetch-missing-member");
        let err = extract_member(&bytes, "lib/libpdfium.so", &dest).unwrap_err();
        assert!(err.to_string().contains("lib/libpdfium.so"));
    }
}
