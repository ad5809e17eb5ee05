//! Persisted theme preference.
//!
//! The dashboard keeps exactly one piece of client state across restarts:
//! whether the dark theme is on. It is stored as a one-key TOML document.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Key under which the preference is stored.
pub const DARK_THEME_KEY: &str = "dark_theme";

/// Errors that can occur while reading or writing the preference file.
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    /// The file could not be read or written.
    #[error("Preference file {}: {source}", path.display())]
    Io {
        /// Preference file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file exists but is not a valid preference document.
    #[error("Invalid preference file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The preference could not be serialized.
    #[error("Failed to serialize preference: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ThemeDocument {
    #[serde(default)]
    dark_theme: bool,
}

/// File-backed store for the dark-theme flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Creates a store backed by `path`. Nothing is read until
    /// [`PreferenceStore::load_dark_theme`] is called.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the flag. A missing file means the light theme.
    ///
    /// # Errors
    ///
    /// * [`PreferenceError::Io`] if the file exists but cannot be read
    /// * [`PreferenceError::Parse`] if it is not a preference document
    pub fn load_dark_theme(&self) -> Result<bool, PreferenceError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(source) => {
                return Err(PreferenceError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let document: ThemeDocument = toml::de::from_str(&text)?;
        Ok(document.dark_theme)
    }

    /// Writes the flag, replacing any previous value.
    ///
    /// # Errors
    ///
    /// * [`PreferenceError::Serialize`] if the document cannot be rendered
    /// * [`PreferenceError::Io`] if the file cannot be written
    pub fn save_dark_theme(&self, dark: bool) -> Result<(), PreferenceError> {
        let text = toml::to_string(&ThemeDocument { dark_theme: dark })?;
        std::fs::write(&self.path, text).map_err(|source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("Saved {DARK_THEME_KEY}={dark} to {}", self.path.display());
        Ok(())
    }
}
