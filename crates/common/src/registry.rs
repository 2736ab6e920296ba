//! Volume table and its on-disk snapshot.
//!
//! The snapshot is a single JSON object keyed by volume name. It is always
//! rewritten in full: the new content lands in a sibling temp file which is
//! then renamed over the old one, so a crash mid-write leaves either the
//! previous or the new table, never a torn one.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::volume::Volume;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse state file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("volume {0} in state file has a consumer count that contradicts its mount state")]
    Inconsistent(String),
    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Every volume the plugin manages, by name.
#[derive(Debug)]
pub struct Registry {
    volumes: BTreeMap<String, Volume>,
    state_path: PathBuf,
}

impl Registry {
    /// An empty table that will persist to `state_path`.
    pub fn empty(state_path: impl Into<PathBuf>) -> Self {
        Self {
            volumes: BTreeMap::new(),
            state_path: state_path.into(),
        }
    }

    /// Read the snapshot at `state_path`.
    ///
    /// A missing file is a fresh install and yields an empty table. A file
    /// that exists but cannot be read or parsed is an error: starting with an
    /// empty table would orphan every remote resource it describes.
    pub fn load(state_path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let state_path = state_path.into();

        let data = match std::fs::read(&state_path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %state_path.display(), "state not found, starting empty");
                return Ok(Self::empty(state_path));
            }
            Err(source) => {
                return Err(RegistryError::Read {
                    path: state_path,
                    source,
                })
            }
        };

        let mut volumes: BTreeMap<String, Volume> =
            serde_json::from_slice(&data).map_err(|source| RegistryError::Parse {
                path: state_path.clone(),
                source,
            })?;

        for (name, volume) in volumes.iter_mut() {
            volume.set_name(name.clone());
            if !volume.is_consistent() {
                return Err(RegistryError::Inconsistent(name.clone()));
            }
        }

        tracing::info!(
            path = %state_path.display(),
            volumes = volumes.len(),
            "loaded volume state"
        );
        Ok(Self {
            volumes,
            state_path,
        })
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn get(&self, name: &str) -> Option<&Volume> {
        self.volumes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Volume> {
        self.volumes.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.volumes.contains_key(name)
    }

    /// Volumes ordered by name.
    pub fn list(&self) -> impl Iterator<Item = &Volume> {
        self.volumes.values()
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Insert or replace the record keyed by the volume's name.
    pub fn insert(&mut self, volume: Volume) {
        self.volumes.insert(volume.name().to_owned(), volume);
    }

    pub fn remove(&mut self, name: &str) -> Option<Volume> {
        self.volumes.remove(name)
    }

    /// Persist the table, logging instead of failing.
    ///
    /// The in-memory table stays authoritative for the running process; a
    /// lost write only matters after a restart.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            tracing::error!(error = %e, "failed to save volume state");
        }
    }

    /// Persist the table, reporting failures.
    pub fn try_save(&self) -> Result<(), RegistryError> {
        let write_err = |source| RegistryError::Write {
            path: self.state_path.clone(),
            source,
        };

        let data = serde_json::to_vec_pretty(&self.volumes)
            .map_err(|e| write_err(std::io::Error::new(ErrorKind::InvalidData, e)))?;

        let dir = match self.state_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(write_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&data).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.state_path)
            .map_err(|e| write_err(e.error))?;

        tracing::debug!(path = %self.state_path.display(), volumes = self.volumes.len(), "saved volume state");
        Ok(())
    }
}
