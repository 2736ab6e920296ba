/// In-memory stand-ins for the management service and the host's mount
/// utilities, so lifecycle code can be exercised without a cluster or root.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use common::testkit::{FakeStorageManager, RecordingMounter, StorageCall};
///
/// #[tokio::test]
/// async fn test_create_then_mount() -> anyhow::Result<()> {
///     let storage = Arc::new(FakeStorageManager::new());
///     let mounter = Arc::new(RecordingMounter::new());
///
///     // ... build an orchestrator over `storage` and `mounter` ...
///
///     assert_eq!(storage.count(StorageCall::CreateDataContainer), 1);
///     assert_eq!(mounter.mount_count(), 1);
///     Ok(())
/// }
/// ```
mod mounter;
mod storage;

use std::path::Path;

use crate::ems::{ExportCreateOpts, StorageManager, DEFAULT_EXPORT_NAME};
use crate::volume::{Volume, VolumeSpec};

pub use mounter::{MountCall, RecordingMounter};
pub use storage::{FakeStorageManager, StorageCall};

/// Provision `name` on `storage` with default options and wrap the result in
/// an unmounted [`Volume`] at `mountpoint`.
pub async fn sample_volume(
    storage: &FakeStorageManager,
    name: &str,
    mountpoint: &Path,
) -> anyhow::Result<Volume> {
    let spec = VolumeSpec::parse(name, &Default::default())?;
    let policy = storage.default_policy().await?;
    let dc = storage
        .create_data_container(policy.id, &spec.data_container)
        .await?;
    let export_opts = ExportCreateOpts {
        data_container_id: dc.id,
        ..spec.export
    };
    let export = storage
        .create_export(DEFAULT_EXPORT_NAME, &export_opts)
        .await?;
    Ok(Volume::new(name, mountpoint, spec.mount_options, dc, export))
}
