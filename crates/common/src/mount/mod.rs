//! Local mount handling
//!
//! - **[`MountCoordinator`]**: reference counts consumers per volume and
//!   touches the kernel only on the 0→1 and 1→0 edges
//! - **[`Mounter`]**: the seam performing the actual bind and unbind
//! - **[`SystemMounter`]**: runs the host's `mount` and `umount` utilities

mod coordinator;
mod system;

use std::path::PathBuf;

use crate::ems::EmsError;

pub use coordinator::MountCoordinator;
pub use system::{mount_args, Mounter, SystemMounter};

#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("failed to prepare mountpoint {path}: {source}")]
    Mountpoint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} already exists and it's not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to get full export path: {0}")]
    ExportPath(#[source] EmsError),
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} command failed: {status} ({output})")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },
}
