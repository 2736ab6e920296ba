//! Remote resource model and the client contract.
//!
//! The plugin only ever touches three kinds of remote objects:
//!
//! - **[`DataContainer`]**: quota-bound storage unit, owned by a [`Policy`]
//! - **[`Export`]**: NFS mount target bound 1:1 to a data container
//! - **[`Policy`]**: storage profile; new data containers use the default one
//!
//! [`StorageManager`] is the seam between the lifecycle core and the wire
//! client. The daemon provides the HTTP implementation; tests use
//! [`crate::testkit::FakeStorageManager`].

mod error;
mod types;

use async_trait::async_trait;

pub use error::EmsError;
pub use types::{
    legal_volume_name, DataContainer, DcCreateOpts, Export, ExportAccess, ExportCreateOpts,
    Policy, UnknownUserMapping, UserMapping, DEFAULT_EXPORT_NAME,
};

/// Operations the management service exposes for data containers, exports
/// and policies.
#[async_trait]
pub trait StorageManager: Send + Sync {
    async fn list_data_containers(&self) -> Result<Vec<DataContainer>, EmsError>;

    /// Fetch the full record of one data container.
    async fn get_data_container(&self, id: u64) -> Result<DataContainer, EmsError>;

    async fn create_data_container(
        &self,
        policy_id: u64,
        opts: &DcCreateOpts,
    ) -> Result<DataContainer, EmsError>;

    async fn delete_data_container(&self, dc: &DataContainer) -> Result<(), EmsError>;

    async fn list_exports(&self) -> Result<Vec<Export>, EmsError>;

    async fn create_export(&self, name: &str, opts: &ExportCreateOpts)
        -> Result<Export, EmsError>;

    async fn delete_export(&self, export: &Export) -> Result<(), EmsError>;

    async fn list_policies(&self) -> Result<Vec<Policy>, EmsError>;

    /// The policy flagged as default on the service.
    async fn default_policy(&self) -> Result<Policy, EmsError> {
        self.list_policies()
            .await?
            .into_iter()
            .find(|p| p.is_default)
            .ok_or(EmsError::DefaultPolicyNotFound)
    }

    /// Path of an export relative to the storage address, `<dc>/<export>`.
    async fn export_path(&self, export: &Export) -> Result<String, EmsError> {
        let dc = self.get_data_container(export.data_container_id).await?;
        Ok(format!("{}/{}", dc.name, export.name))
    }
}
