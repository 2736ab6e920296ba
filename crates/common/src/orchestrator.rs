//! Lifecycle operations exposed to the host container runtime.
//!
//! Per volume name: absent → provisioned (unmounted) ⇄ mounted → absent.
//!
//! Every mutating operation holds the registry's write lock for its whole
//! duration, remote round-trips and mount commands included, so lifecycle
//! calls serialize against each other even across different names. Reads
//! share the lock.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::mount::{MountCoordinator, MountError};
use crate::provisioner::{ProvisionError, Provisioner};
use crate::registry::Registry;
use crate::volume::{validate_name, OptionsError, Volume, VolumeSpec};

const VOLUMES_DIR: &str = "volumes";
const STATE_DIR: &str = "state";
const STATE_FILE: &str = "elastifile-state.json";

/// Directory holding one mountpoint per volume.
pub fn volumes_dir(root: &Path) -> PathBuf {
    root.join(VOLUMES_DIR)
}

/// Location of the registry snapshot.
pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(STATE_FILE)
}

/// Whether volumes are visible cluster-wide or only on this host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Global,
    Local,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Local => f.write_str("local"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scope {0:?}, expected \"global\" or \"local\"")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(Scope::Global),
            "local" => Ok(Scope::Local),
            _ => Err(UnknownScope(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub scope: Scope,
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("volume {0} not found")]
    NotFound(String),
    #[error("volume {0} already exists")]
    AlreadyExists(String),
    #[error("volume {name} is in use by {consumers} consumer(s)")]
    InUse { name: String, consumers: u32 },
    #[error(transparent)]
    InvalidArgument(#[from] OptionsError),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error(transparent)]
    Mount(#[from] MountError),
    #[error("failed to remove {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct Orchestrator {
    registry: RwLock<Registry>,
    provisioner: Provisioner,
    mounts: MountCoordinator,
    volumes_dir: PathBuf,
    capabilities: Capabilities,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provisioner", &self.provisioner)
            .field("mounts", &self.mounts)
            .field("volumes_dir", &self.volumes_dir)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(
        registry: Registry,
        provisioner: Provisioner,
        mounts: MountCoordinator,
        volumes_dir: impl Into<PathBuf>,
        scope: Scope,
    ) -> Self {
        Self {
            registry: RwLock::new(registry),
            provisioner,
            mounts,
            volumes_dir: volumes_dir.into(),
            capabilities: Capabilities { scope },
        }
    }

    /// Provision the remote resources for `name` and record the volume.
    ///
    /// Nothing is recorded unless provisioning succeeds.
    #[tracing::instrument(skip(self, options))]
    pub async fn create(
        &self,
        name: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<Volume, OrchestratorError> {
        validate_name(name)?;

        let mut registry = self.registry.write().await;
        if registry.contains(name) {
            return Err(OrchestratorError::AlreadyExists(name.to_owned()));
        }

        let spec = VolumeSpec::parse(name, options)?;
        let (dc, export) = self
            .provisioner
            .provision(&spec.data_container, &spec.export)
            .await?;

        let volume = Volume::new(
            name,
            self.volumes_dir.join(name),
            spec.mount_options,
            dc,
            export,
        );
        registry.insert(volume.clone());
        registry.save();

        tracing::info!(
            mountpoint = %volume.mountpoint().display(),
            data_container = volume.data_container().id,
            export = volume.export().id,
            "volume created"
        );
        Ok(volume)
    }

    /// Remove the mountpoint, tear down the remote resources, forget the
    /// volume. Refused while any consumer holds it.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, name: &str) -> Result<(), OrchestratorError> {
        let mut registry = self.registry.write().await;
        let volume = registry
            .get(name)
            .cloned()
            .ok_or_else(|| OrchestratorError::NotFound(name.to_owned()))?;

        if volume.active_consumers() != 0 {
            return Err(OrchestratorError::InUse {
                name: name.to_owned(),
                consumers: volume.active_consumers(),
            });
        }

        remove_mountpoint(volume.mountpoint()).await?;
        self.provisioner
            .teardown(volume.data_container(), volume.export())
            .await?;

        registry.remove(name);
        registry.save();

        tracing::info!("volume removed");
        Ok(())
    }

    /// Register a consumer and return where the volume is bound.
    #[tracing::instrument(skip(self))]
    pub async fn mount(&self, name: &str) -> Result<PathBuf, OrchestratorError> {
        let mut registry = self.registry.write().await;
        let volume = registry
            .get_mut(name)
            .ok_or_else(|| OrchestratorError::NotFound(name.to_owned()))?;

        self.mounts.acquire(volume).await?;
        let mountpoint = volume.mountpoint().to_path_buf();

        registry.save();
        Ok(mountpoint)
    }

    #[tracing::instrument(skip(self))]
    pub async fn unmount(&self, name: &str) -> Result<(), OrchestratorError> {
        let mut registry = self.registry.write().await;
        let volume = registry
            .get_mut(name)
            .ok_or_else(|| OrchestratorError::NotFound(name.to_owned()))?;

        self.mounts.release(volume).await?;

        registry.save();
        Ok(())
    }

    pub async fn path(&self, name: &str) -> Result<PathBuf, OrchestratorError> {
        let registry = self.registry.read().await;
        registry
            .get(name)
            .map(|v| v.mountpoint().to_path_buf())
            .ok_or_else(|| OrchestratorError::NotFound(name.to_owned()))
    }

    pub async fn get(&self, name: &str) -> Result<Volume, OrchestratorError> {
        let registry = self.registry.read().await;
        registry
            .get(name)
            .cloned()
            .ok_or_else(|| OrchestratorError::NotFound(name.to_owned()))
    }

    pub async fn list(&self) -> Vec<Volume> {
        let registry = self.registry.read().await;
        registry.list().cloned().collect()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

async fn remove_mountpoint(path: &Path) -> Result<(), OrchestratorError> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(OrchestratorError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
