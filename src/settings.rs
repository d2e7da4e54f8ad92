//! JSON-backed store for connection profiles and mailing-job settings.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Table read by `customers fetch` when a profile does not name one.
pub const DEFAULT_CUSTOMER_TABLE: &str = "customers";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("I/O error on settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("A connection profile named '{0}' already exists")]
    DuplicateProfile(String),

    #[error("No connection profile named '{0}'")]
    UnknownProfile(String),

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Profile '{profile}' has an unusable instance '{instance}'")]
    InvalidInstance { profile: String, instance: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    Postgres,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum Authentication {
    Sql { username: String, password: String },
    Integrated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub name: String,
    pub driver: DatabaseDriver,
    /// `host[:port]` for server databases, a file path for sqlite.
    pub instance: String,
    pub database_name: String,
    pub authentication: Authentication,
    /// Customer table read by `customers fetch`.
    #[serde(default)]
    pub table_name: Option<String>,
}

impl ConnectionProfile {
    /// Connection URL for the sqlx `Any` driver. Credentials are
    /// percent-encoded, so passwords may contain `@`, `/` or `#`.
    pub fn connection_url(&self) -> Result<String, SettingsError> {
        match self.driver {
            DatabaseDriver::Sqlite => Ok(format!("sqlite://{}?mode=rwc", self.instance)),
            DatabaseDriver::Postgres => {
                let invalid = || SettingsError::InvalidInstance {
                    profile: self.name.clone(),
                    instance: self.instance.clone(),
                };
                let mut url = Url::parse(&format!("postgres://{}", self.instance))
                    .map_err(|_| invalid())?;
                let has_path = !matches!(url.path(), "" | "/");
                if url.host_str().is_none_or(str::is_empty) || has_path {
                    return Err(invalid());
                }
                if let Authentication::Sql { username, password } = &self.authentication {
                    url.set_username(username).map_err(|_| invalid())?;
                    url.set_password(Some(password)).map_err(|_| invalid())?;
                }
                url.set_path(&format!("/{}", self.database_name));
                Ok(url.into())
            }
        }
    }

    pub fn customer_table(&self) -> &str {
        self.table_name
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_CUSTOMER_TABLE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSettings {
    pub paused: bool,
    pub batch_size: usize,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            paused: false,
            batch_size: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default)]
    pub profiles: Vec<ConnectionProfile>,
    #[serde(default)]
    pub email: EmailSettings,
}

/// Owns the settings document and its file. Every mutation is written through
/// before returning.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    document: SettingsDocument,
}

impl SettingsStore {
    /// Reads the settings file. A missing, empty or unparsable file is replaced
    /// with defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        match Self::read_document(&path)? {
            Some(document) => Ok(Self { path, document }),
            None => {
                let store = Self {
                    path,
                    document: SettingsDocument::default(),
                };
                store.save()?;
                info!("Wrote default settings to {}", store.path.display());
                Ok(store)
            }
        }
    }

    /// Like [`SettingsStore::load`] but never writes: a missing or unusable
    /// file yields defaults in memory only. For commands that only read
    /// settings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let document = Self::read_document(&path)?.unwrap_or_default();
        Ok(Self { path, document })
    }

    fn read_document(path: &Path) -> Result<Option<SettingsDocument>, SettingsError> {
        let existing = match std::fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => None,
            Ok(text) => match serde_json::from_str::<SettingsDocument>(&text) {
                Ok(document) => Some(document),
                Err(e) => {
                    warn!(
                        "Settings file {} is invalid ({}), resetting to defaults",
                        path.display(),
                        e
                    );
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Ok(existing)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &SettingsDocument {
        &self.document
    }

    pub fn profiles(&self) -> &[ConnectionProfile] {
        &self.document.profiles
    }

    pub fn profile(&self, name: &str) -> Result<&ConnectionProfile, SettingsError> {
        self.document
            .profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| SettingsError::UnknownProfile(name.to_string()))
    }

    pub fn email_settings(&self) -> EmailSettings {
        self.document.email
    }

    pub fn add_profile(&mut self, profile: ConnectionProfile) -> Result<(), SettingsError> {
        if self.document.profiles.iter().any(|p| p.name == profile.name) {
            return Err(SettingsError::DuplicateProfile(profile.name));
        }
        self.document.profiles.push(profile);
        self.save()
    }

    pub fn remove_profile(&mut self, name: &str) -> Result<ConnectionProfile, SettingsError> {
        let index = self
            .document
            .profiles
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| SettingsError::UnknownProfile(name.to_string()))?;
        let removed = self.document.profiles.remove(index);
        self.save()?;
        Ok(removed)
    }

    pub fn set_paused(&mut self, paused: bool) -> Result<(), SettingsError> {
        self.document.email.paused = paused;
        self.save()
    }

    pub fn set_batch_size(&mut self, batch_size: usize) -> Result<(), SettingsError> {
        if batch_size == 0 {
            return Err(SettingsError::InvalidBatchSize);
        }
        self.document.email.batch_size = batch_size;
        self.save()
    }

    /// Writes to a sibling temporary file, then renames it over the target.
    fn save(&self) -> Result<(), SettingsError> {
        let io_err = |source: std::io::Error| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_vec_pretty(&self.document)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}
