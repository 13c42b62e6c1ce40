use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::persona::persona_model::PersonaData;

pub const DEFAULT_STORE_PATH: &str = "persona.json";

/// On-disk layout: one key holding the serialized profile as a string.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreFile {
    #[serde(default)]
    persona_data: Option<String>,
}

/// File-backed persona storage.
#[derive(Debug, Clone)]
pub struct PersonaStore {
    path: PathBuf,
}

impl PersonaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PersonaStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }

    /// The serialized profile exactly as stored. A missing file is `None`.
    pub fn load_raw(&self) -> Result<Option<String>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path_str(), "no persona store yet");
                return Ok(None);
            }
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.path_str(),
                    source: e,
                });
            }
        };

        let file: StoreFile = serde_json::from_str(&text).map_err(|e| StoreError::Json {
            path: self.path_str(),
            source: e,
        })?;
        Ok(file.persona_data)
    }

    /// Decoded profile. A stored blob that is not a profile is treated as absent.
    pub fn load(&self) -> Result<Option<PersonaData>, StoreError> {
        let Some(raw) = self.load_raw()? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(persona) => Ok(Some(persona)),
            Err(e) => {
                warn!(path = %self.path_str(), error = %e, "stored persona is not a valid profile");
                Ok(None)
            }
        }
    }

    pub fn save(&self, persona: &PersonaData) -> Result<(), StoreError> {
        let json_err = |e: serde_json::Error| StoreError::Json {
            path: self.path_str(),
            source: e,
        };
        let file = StoreFile {
            persona_data: Some(serde_json::to_string(persona).map_err(json_err)?),
        };
        let text = serde_json::to_string_pretty(&file).map_err(json_err)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: self.path_str(),
                source: e,
            })?;
        }

        fs::write(&self.path, text).map_err(|e| StoreError::Io {
            path: self.path_str(),
            source: e,
        })?;
        debug!(path = %self.path_str(), "saved persona");
        Ok(())
    }
}
