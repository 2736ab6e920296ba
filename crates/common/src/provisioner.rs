//! Remote provisioning of the data container + export pair behind a volume.
//!
//! In [`ProvisionMode::Idempotent`] every mutation is preceded by a lookup,
//! so repeating a create or delete converges instead of failing on "already
//! exists" or "already gone". The lookups are not atomic with the mutation:
//! two creators racing on one name can both see it absent. Within one plugin
//! instance the orchestrator's exclusive lock serializes them.
//!
//! [`ProvisionMode::Strict`] issues creates and deletes blindly and surfaces
//! whatever the service answers.

use std::fmt;
use std::sync::Arc;

use crate::ems::{
    DataContainer, DcCreateOpts, EmsError, Export, ExportCreateOpts, StorageManager,
    DEFAULT_EXPORT_NAME,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProvisionMode {
    /// Fail loudly on pre-existing or missing remote state.
    #[default]
    Strict,
    /// Check remote state before every create and delete.
    Idempotent,
}

impl ProvisionMode {
    pub fn from_idempotent_flag(idempotent: bool) -> Self {
        if idempotent {
            ProvisionMode::Idempotent
        } else {
            ProvisionMode::Strict
        }
    }
}

/// The remote call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    ResolveDefaultPolicy,
    LookupDataContainer,
    CreateDataContainer,
    DeleteDataContainer,
    LookupExport,
    CreateExport,
    DeleteExport,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            ProvisionStep::ResolveDefaultPolicy => "resolve default policy",
            ProvisionStep::LookupDataContainer => "check if data container exists",
            ProvisionStep::CreateDataContainer => "create data container",
            ProvisionStep::DeleteDataContainer => "delete data container",
            ProvisionStep::LookupExport => "check if export exists",
            ProvisionStep::CreateExport => "create export",
            ProvisionStep::DeleteExport => "delete export",
        };
        f.write_str(step)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to {step}: {source}")]
pub struct ProvisionError {
    pub step: ProvisionStep,
    #[source]
    pub source: EmsError,
}

impl ProvisionError {
    fn at(step: ProvisionStep) -> impl FnOnce(EmsError) -> Self {
        move |source| Self { step, source }
    }
}

#[derive(Clone)]
pub struct Provisioner {
    storage: Arc<dyn StorageManager>,
    mode: ProvisionMode,
}

impl fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner")
            .field("mode", &self.mode)
            .finish()
    }
}

impl Provisioner {
    pub fn new(storage: Arc<dyn StorageManager>, mode: ProvisionMode) -> Self {
        Self { storage, mode }
    }

    pub fn mode(&self) -> ProvisionMode {
        self.mode
    }

    pub fn storage(&self) -> &Arc<dyn StorageManager> {
        &self.storage
    }

    /// Create the backing resources according to the configured mode.
    pub async fn provision(
        &self,
        dc_opts: &DcCreateOpts,
        export_opts: &ExportCreateOpts,
    ) -> Result<(DataContainer, Export), ProvisionError> {
        match self.mode {
            ProvisionMode::Idempotent => self.ensure_created(dc_opts, export_opts).await,
            ProvisionMode::Strict => self.create_unconditionally(dc_opts, export_opts).await,
        }
    }

    /// Remove the backing resources according to the configured mode.
    pub async fn teardown(&self, dc: &DataContainer, export: &Export) -> Result<(), ProvisionError> {
        match self.mode {
            ProvisionMode::Idempotent => self.ensure_deleted(dc, export).await,
            ProvisionMode::Strict => self.delete_unconditionally(dc, export).await,
        }
    }

    /// Guarantee a data container named `dc_opts.name` and its export exist,
    /// creating only what is missing.
    pub async fn ensure_created(
        &self,
        dc_opts: &DcCreateOpts,
        export_opts: &ExportCreateOpts,
    ) -> Result<(DataContainer, Export), ProvisionError> {
        let dc = match self.find_data_container(&dc_opts.name).await? {
            Some(dc) => {
                tracing::debug!(name = %dc.name, id = dc.id, "data container already exists");
                dc
            }
            None => self.create_data_container(dc_opts).await?,
        };

        let export = match self.find_export(DEFAULT_EXPORT_NAME, dc.id).await? {
            Some(export) => {
                tracing::debug!(name = %export.name, dc_id = dc.id, "export already exists");
                export
            }
            None => {
                tracing::debug!(name = DEFAULT_EXPORT_NAME, dc_id = dc.id, "export not found, creating");
                self.create_export(&dc, export_opts).await?
            }
        };

        tracing::info!(name = %dc.name, id = dc.id, export = %export.name, "ensured data container and export");
        Ok((dc, export))
    }

    /// Create both resources without looking first. A remote "already
    /// exists" answer surfaces as an error.
    pub async fn create_unconditionally(
        &self,
        dc_opts: &DcCreateOpts,
        export_opts: &ExportCreateOpts,
    ) -> Result<(DataContainer, Export), ProvisionError> {
        let dc = self.create_data_container(dc_opts).await?;
        let export = self.create_export(&dc, export_opts).await?;

        tracing::info!(name = %dc.name, id = dc.id, export = %export.name, "created data container and export");
        Ok((dc, export))
    }

    /// Guarantee the resources are gone. Anything already deleted by another
    /// actor is skipped, not reported.
    pub async fn ensure_deleted(
        &self,
        dc: &DataContainer,
        export: &Export,
    ) -> Result<(), ProvisionError> {
        // A container recreated elsewhere under the same name is not ours.
        match self.find_data_container(&dc.name).await? {
            Some(found) if found.id == dc.id => {}
            Some(found) => {
                tracing::warn!(
                    name = %dc.name,
                    id = dc.id,
                    found_id = found.id,
                    "skipping removal of data container, it was replaced elsewhere"
                );
                return Ok(());
            }
            None => {
                tracing::debug!(
                    name = %dc.name,
                    "skipping removal of data container, it has been deleted elsewhere"
                );
                return Ok(());
            }
        }

        // The container cannot go while an export still references it.
        match self.find_export(&export.name, dc.id).await? {
            Some(found) => self.delete_export(&found).await?,
            None => tracing::debug!(
                export = %export.name,
                data_container = %dc.name,
                "skipping removal of export, it has been deleted elsewhere"
            ),
        }

        self.delete_data_container(dc).await
    }

    /// Delete export then data container without looking first.
    pub async fn delete_unconditionally(
        &self,
        dc: &DataContainer,
        export: &Export,
    ) -> Result<(), ProvisionError> {
        self.delete_export(export).await?;
        self.delete_data_container(dc).await
    }

    async fn find_data_container(&self, name: &str) -> Result<Option<DataContainer>, ProvisionError> {
        let dcs = self
            .storage
            .list_data_containers()
            .await
            .map_err(ProvisionError::at(ProvisionStep::LookupDataContainer))?;
        Ok(dcs.into_iter().find(|dc| dc.name == name))
    }

    async fn find_export(&self, name: &str, dc_id: u64) -> Result<Option<Export>, ProvisionError> {
        let exports = self
            .storage
            .list_exports()
            .await
            .map_err(ProvisionError::at(ProvisionStep::LookupExport))?;
        Ok(exports
            .into_iter()
            .find(|e| e.name == name && e.data_container_id == dc_id))
    }

    async fn create_data_container(&self, opts: &DcCreateOpts) -> Result<DataContainer, ProvisionError> {
        // TODO: honor a caller-selected policy once create options carry one.
        let policy = self
            .storage
            .default_policy()
            .await
            .map_err(ProvisionError::at(ProvisionStep::ResolveDefaultPolicy))?;

        tracing::debug!(name = %opts.name, policy_id = policy.id, hard_quota = opts.hard_quota, "creating data container");
        self.storage
            .create_data_container(policy.id, opts)
            .await
            .map_err(ProvisionError::at(ProvisionStep::CreateDataContainer))
    }

    async fn create_export(
        &self,
        dc: &DataContainer,
        opts: &ExportCreateOpts,
    ) -> Result<Export, ProvisionError> {
        let opts = ExportCreateOpts {
            data_container_id: dc.id,
            ..opts.clone()
        };
        tracing::debug!(dc_id = dc.id, user_mapping = %opts.user_mapping, "creating export");
        self.storage
            .create_export(DEFAULT_EXPORT_NAME, &opts)
            .await
            .map_err(ProvisionError::at(ProvisionStep::CreateExport))
    }

    async fn delete_export(&self, export: &Export) -> Result<(), ProvisionError> {
        tracing::debug!(id = export.id, name = %export.name, "deleting export");
        self.storage
            .delete_export(export)
            .await
            .map_err(ProvisionError::at(ProvisionStep::DeleteExport))
    }

    async fn delete_data_container(&self, dc: &DataContainer) -> Result<(), ProvisionError> {
        tracing::debug!(id = dc.id, name = %dc.name, "deleting data container");
        self.storage
            .delete_data_container(dc)
            .await
            .map_err(ProvisionError::at(ProvisionStep::DeleteDataContainer))
    }
}
