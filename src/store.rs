//! Durable store of translation records and endpoint credentials.
//!
//! A directory holding two JSON documents:
//!
//! | File | Contents |
//! |------|----------|
//! | `translations.json` | array of [`Translation`], newest first |
//! | `credentials.json`  | `{ "apiKey": …, "baseUrl": … }` |
//!
//! Loading is forgiving: a missing or unreadable document falls back to an
//! empty list / default credentials (with a warning), so one corrupt file
//! never locks the user out. Every mutation rewrites its document
//! atomically.

use crate::config::Credentials;
use crate::error::TranslateError;
use crate::export::write_atomic;
use crate::output::Translation;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const TRANSLATIONS_FILE: &str = "translations.json";
const CREDENTIALS_FILE: &str = "credentials.json";

/// Environment variable overriding [`TranslationStore::default_dir`].
pub const STORE_DIR_ENV: &str = "PDFTRANS_STORE";

/// Translation records plus credentials, backed by a directory.
#[derive(Debug)]
pub struct TranslationStore {
    dir: PathBuf,
    translations: Vec<Translation>,
    credentials: Credentials,
}

impl TranslationStore {
    /// `$PDFTRANS_STORE`, else `{data_dir}/pdftrans`.
    pub fn default_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(STORE_DIR_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(dir);
        }
        dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .unwrap_or_else(std::env::temp_dir)
            .join("pdftrans")
    }

    /// Open (creating if needed) the store at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, TranslateError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| TranslateError::Store {
            path: dir.clone(),
            detail: e.to_string(),
        })?;

        let translations: Vec<Translation> = load_or_default(&dir.join(TRANSLATIONS_FILE));
        let credentials = load_or_default::<Credentials>(&dir.join(CREDENTIALS_FILE)).normalized();
        debug!(
            "Opened store at {} ({} translations)",
            dir.display(),
            translations.len()
        );

        Ok(Self {
            dir,
            translations,
            credentials,
        })
    }

    /// Open the store at [`Self::default_dir`].
    pub fn open_default() -> Result<Self, TranslateError> {
        Self::open(Self::default_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All records, newest first.
    pub fn list(&self) -> &[Translation] {
        &self.translations
    }

    /// Look up a record by id, or by a unique id prefix.
    pub fn get(&self, id: &str) -> Option<&Translation> {
        if let Some(t) = self.translations.iter().find(|t| t.id == id) {
            return Some(t);
        }
        let mut matches = self.translations.iter().filter(|t| t.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(t), None) if !id.is_empty() => Some(t),
            _ => None,
        }
    }

    /// Prepend a record and persist.
    pub fn add(&mut self, translation: Translation) -> Result<(), TranslateError> {
        self.translations.insert(0, translation);
        self.save_translations()
    }

    /// Remove the record with exactly this id. Returns whether one was removed.
    pub fn remove(&mut self, id: &str) -> Result<bool, TranslateError> {
        let before = self.translations.len();
        self.translations.retain(|t| t.id != id);
        if self.translations.len() == before {
            return Ok(false);
        }
        self.save_translations()?;
        Ok(true)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Replace the stored credentials. The base URL is normalised.
    pub fn set_credentials(&mut self, api_key: &str, base_url: &str) -> Result<&Credentials, TranslateError> {
        self.credentials = Credentials::new(api_key, base_url);
        let path = self.dir.join(CREDENTIALS_FILE);
        self.write_json(&path, &self.credentials)?;
        restrict_permissions(&path);
        Ok(&self.credentials)
    }

    fn save_translations(&self) -> Result<(), TranslateError> {
        self.write_json(&self.dir.join(TRANSLATIONS_FILE), &self.translations)
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), TranslateError> {
        let store_err = |detail: String| TranslateError::Store {
            path: path.to_path_buf(),
            detail,
        };
        let json = serde_json::to_vec_pretty(value).map_err(|e| store_err(e.to_string()))?;
        write_atomic(path, &json).map_err(|e| store_err(e.to_string()))
    }
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!("Cannot read {}: {}; starting empty", path.display(), e);
            return T::default();
        }
    };
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        warn!("Ignoring unreadable {}: {}", path.display(), e);
        T::default()
    })
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        warn!("Could not restrict permissions on {}: {}", path.display(), e);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}
