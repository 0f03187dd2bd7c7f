//! One pretty-printed JSON file per profile under a data directory.
use cagebound_game::{Profile, ProfileStorage};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Letters, digits, spaces, dashes and underscores; no separators or dots.
static PROFILE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}\p{N}][\p{L}\p{N} _-]*$").expect("profile name pattern is valid")
});

const EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0:?} cannot be used as a profile file name")]
    InvalidName(String),
    #[error("could not access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("profile file {} is not valid JSON for a profile", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Profiles stored as `<root>/<Name>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the file holding `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidName`] for names that could escape the
    /// data directory, and [`StorageError::Io`] when the current directory
    /// cannot be resolved.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        if !PROFILE_NAME.is_match(name) {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        let relative = self.root.join(format!("{name}.{EXTENSION}"));
        std::path::absolute(&relative).map_err(|source| StorageError::Io {
            path: relative,
            source,
        })
    }

    fn temp_path(path: &Path) -> PathBuf {
        path.with_extension(format!("{EXTENSION}.tmp"))
    }
}

impl ProfileStorage for JsonFileStorage {
    type Error = StorageError;

    fn load_profile(&self, name: &str) -> Result<Option<Profile>, Self::Error> {
        let path = self.path_for(name)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        let profile = serde_json::from_str(&text).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;
        log::debug!("loaded {}", path.display());
        Ok(Some(profile))
    }

    fn save_profile(&self, name: &str, profile: &Profile) -> Result<(), Self::Error> {
        let path = self.path_for(name)?;
        let json = serde_json::to_string_pretty(profile).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // Write beside the target and swap in, so a save is all-or-nothing.
        let temp = Self::temp_path(&path);
        fs::write(&temp, json).map_err(|source| StorageError::Io {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        log::debug!("saved {}", path.display());
        Ok(())
    }

    fn delete_profile(&self, name: &str) -> Result<bool, Self::Error> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("deleted {}", path.display());
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}
