use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::mount::{MountError, Mounter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountCall {
    Mount {
        source: String,
        target: PathBuf,
        options: Vec<String>,
    },
    Unmount {
        target: PathBuf,
    },
}

#[derive(Default)]
struct Inner {
    calls: Vec<MountCall>,
    fail_mount: Option<String>,
    fail_unmount: Option<String>,
}

/// Records binds and unbinds instead of running them.
///
/// Failed attempts are not recorded.
#[derive(Default)]
pub struct RecordingMounter {
    inner: Mutex<Inner>,
}

impl RecordingMounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn calls(&self) -> Vec<MountCall> {
        self.lock().calls.clone()
    }

    pub fn mount_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, MountCall::Mount { .. }))
            .count()
    }

    pub fn unmount_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, MountCall::Unmount { .. }))
            .count()
    }

    /// Make the next mount fail with `output` as the command's output.
    pub fn fail_next_mount(&self, output: &str) {
        self.lock().fail_mount = Some(output.to_owned());
    }

    pub fn fail_next_unmount(&self, output: &str) {
        self.lock().fail_unmount = Some(output.to_owned());
    }
}

fn failed(command: &str, output: String) -> MountError {
    MountError::CommandFailed {
        command: command.to_owned(),
        status: "exit status: 32".to_owned(),
        output,
    }
}

#[async_trait]
impl Mounter for RecordingMounter {
    async fn mount(
        &self,
        source: &str,
        target: &Path,
        options: &[String],
    ) -> Result<(), MountError> {
        let mut inner = self.lock();
        if let Some(output) = inner.fail_mount.take() {
            return Err(failed("mount", output));
        }
        inner.calls.push(MountCall::Mount {
            source: source.to_owned(),
            target: target.to_path_buf(),
            options: options.to_vec(),
        });
        Ok(())
    }

    async fn unmount(&self, target: &Path) -> Result<(), MountError> {
        let mut inner = self.lock();
        if let Some(output) = inner.fail_unmount.take() {
            return Err(failed("umount", output));
        }
        inner.calls.push(MountCall::Unmount {
            target: target.to_path_buf(),
        });
        Ok(())
    }
}
