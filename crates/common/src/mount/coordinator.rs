use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use tokio::fs::DirBuilder;

use super::{MountError, Mounter};
use crate::ems::StorageManager;
use crate::volume::Volume;

/// Reference counts consumers of each volume.
///
/// Only the first acquire binds the export and only the last release
/// unbinds it. A failed bind or unbind leaves the volume untouched.
pub struct MountCoordinator {
    mounter: Arc<dyn Mounter>,
    storage: Arc<dyn StorageManager>,
    /// Address of the storage network NFS is served on.
    storage_addr: String,
}

impl std::fmt::Debug for MountCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountCoordinator")
            .field("storage_addr", &self.storage_addr)
            .finish()
    }
}

impl MountCoordinator {
    pub fn new(
        mounter: Arc<dyn Mounter>,
        storage: Arc<dyn StorageManager>,
        storage_addr: impl Into<String>,
    ) -> Self {
        Self {
            mounter,
            storage,
            storage_addr: storage_addr.into(),
        }
    }

    /// Register a consumer, binding the export if it is the first one.
    pub async fn acquire(&self, volume: &mut Volume) -> Result<(), MountError> {
        if volume.is_mounted() {
            volume.add_consumer();
            tracing::debug!(
                name = volume.name(),
                consumers = volume.active_consumers(),
                "volume already mounted"
            );
            return Ok(());
        }

        prepare_mountpoint(volume.mountpoint()).await?;

        let export_path = self
            .storage
            .export_path(volume.export())
            .await
            .map_err(MountError::ExportPath)?;
        let source = format!("{}:{}", self.storage_addr, export_path);

        self.mounter
            .mount(&source, volume.mountpoint(), volume.mount_options())
            .await?;

        volume.mark_mounted();
        tracing::info!(
            name = volume.name(),
            %source,
            mountpoint = %volume.mountpoint().display(),
            "volume mounted"
        );
        Ok(())
    }

    /// Drop a consumer, unbinding the export when none remain.
    ///
    /// A release without a matching acquire is ignored so the count never
    /// goes negative and the unbind is never repeated.
    pub async fn release(&self, volume: &mut Volume) -> Result<(), MountError> {
        if !volume.is_mounted() {
            tracing::warn!(name = volume.name(), "unmount of a volume that is not mounted, ignoring");
            return Ok(());
        }

        if volume.active_consumers() > 1 {
            volume.drop_consumer();
            tracing::debug!(
                name = volume.name(),
                consumers = volume.active_consumers(),
                "volume still in use"
            );
            return Ok(());
        }

        self.mounter.unmount(volume.mountpoint()).await?;

        volume.mark_unmounted();
        tracing::info!(
            name = volume.name(),
            mountpoint = %volume.mountpoint().display(),
            "volume unmounted"
        );
        Ok(())
    }
}

/// Make sure `path` is a directory, creating it when absent.
async fn prepare_mountpoint(path: &Path) -> Result<(), MountError> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(MountError::NotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let mut builder = DirBuilder::new();
            builder.recursive(true);
            #[cfg(unix)]
            builder.mode(0o755);
            builder
                .create(path)
                .await
                .map_err(|source| MountError::Mountpoint {
                    path: path.to_path_buf(),
                    source,
                })
        }
        Err(source) => Err(MountError::Mountpoint {
            path: path.to_path_buf(),
            source,
        }),
    }
}
