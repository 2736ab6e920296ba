use std::sync::Arc;

use common::mount::{MountCoordinator, SystemMounter};
use common::orchestrator::{self, Orchestrator};
use common::provisioner::{ProvisionMode, Provisioner};
use common::registry::{Registry, RegistryError};

use crate::ems::{ApiError, EmsClient};
use crate::ServiceConfig;

/// Shared handle passed to every request handler.
#[derive(Clone, Debug)]
pub struct State {
    orchestrator: Arc<Orchestrator>,
}

impl State {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Load the persisted registry and wire the orchestrator to the
    /// management service and the host's mount utilities.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, StateError> {
        let registry = Registry::load(orchestrator::state_path(&config.root))?;

        let ems = Arc::new(EmsClient::new(
            &config.management_url,
            config.credentials.clone(),
        )?);

        let mode = ProvisionMode::from_idempotent_flag(config.crud_idempotent);
        let provisioner = Provisioner::new(ems.clone(), mode);
        let mounts = MountCoordinator::new(
            Arc::new(SystemMounter::default()),
            ems,
            config.storage_addr.clone(),
        );

        tracing::info!(
            root = %config.root.display(),
            storage_addr = %config.storage_addr,
            ?mode,
            scope = %config.scope,
            volumes = registry.len(),
            "service state ready"
        );

        Ok(Self::new(Orchestrator::new(
            registry,
            provisioner,
            mounts,
            orchestrator::volumes_dir(&config.root),
            config.scope,
        )))
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to load volume registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to set up management client: {0}")]
    Client(#[from] ApiError),
}
