//! User-extensible command store, persisted as JSON.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::CommandInfo;

/// Errors from the custom command store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid custom command store {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize custom commands: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed flag spec '{0}': expected FLAG:DESCRIPTION")]
    MalformedFlag(String),

    #[error("invalid danger level '{0}': expected low, medium, high or critical")]
    InvalidDangerLevel(String),

    #[error("no location for the custom command store; set [custom_commands] path")]
    NoStorePath,
}

/// Default store location under the user's data directory.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("shell-explain").join("custom_commands.json"))
}

/// JSON file mapping command names to [`CommandInfo`].
#[derive(Debug, Clone)]
pub struct CustomCommandStore {
    path: PathBuf,
}

impl CustomCommandStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all entries. A missing or unreadable file is an empty store.
    pub fn load(&self) -> BTreeMap<String, CommandInfo> {
        self.read().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring custom command store");
            BTreeMap::new()
        })
    }

    /// Load all entries; only a missing file counts as empty.
    pub fn read(&self) -> Result<BTreeMap<String, CommandInfo>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no custom command store");
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&content).map_err(|source| StoreError::Invalid {
            path: self.path.clone(),
            source,
        })
    }

    /// Insert or replace `name`, rewriting the whole file.
    ///
    /// An existing store that cannot be read or parsed is left untouched.
    pub fn add(&self, name: &str, info: CommandInfo) -> Result<(), StoreError> {
        let mut commands = self.read()?;
        commands.insert(name.to_string(), info);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&commands)?;
        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Parse `"-f:description, -g:description"` into a flag map.
///
/// Single quotes are dropped. An empty spec is an empty map.
pub fn parse_flag_spec(spec: &str) -> Result<BTreeMap<String, String>, StoreError> {
    let mut flags = BTreeMap::new();
    if spec.trim().is_empty() {
        return Ok(flags);
    }
    for item in spec.split(',') {
        let cleaned = item.replace('\'', "");
        let Some((flag, description)) = cleaned.split_once(':') else {
            return Err(StoreError::MalformedFlag(item.trim().to_string()));
        };
        let flag = flag.trim();
        if flag.is_empty() {
            return Err(StoreError::MalformedFlag(item.trim().to_string()));
        }
        flags.insert(flag.to_string(), description.trim().to_string());
    }
    Ok(flags)
}
