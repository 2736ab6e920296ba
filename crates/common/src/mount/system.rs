use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use super::MountError;

/// Binds a remote export onto a local directory and tears it down again.
#[async_trait]
pub trait Mounter: Send + Sync {
    async fn mount(&self, source: &str, target: &Path, options: &[String])
        -> Result<(), MountError>;

    async fn unmount(&self, target: &Path) -> Result<(), MountError>;
}

/// Arguments for `mount`: `-o <opts> <source> <target>`, `-o` omitted when
/// there are no options.
pub fn mount_args(source: &str, target: &Path, options: &[String]) -> Vec<OsString> {
    let mut args = Vec::with_capacity(4);
    if !options.is_empty() {
        args.push(OsString::from("-o"));
        args.push(OsString::from(options.join(",")));
    }
    args.push(OsString::from(source));
    args.push(target.as_os_str().to_owned());
    args
}

/// Shells out to the host's mount utilities.
#[derive(Debug, Clone)]
pub struct SystemMounter {
    mount_bin: PathBuf,
    umount_bin: PathBuf,
}

impl Default for SystemMounter {
    fn default() -> Self {
        Self::with_binaries("mount", "umount")
    }
}

impl SystemMounter {
    pub fn with_binaries(mount_bin: impl Into<PathBuf>, umount_bin: impl Into<PathBuf>) -> Self {
        Self {
            mount_bin: mount_bin.into(),
            umount_bin: umount_bin.into(),
        }
    }

    async fn run(&self, bin: &Path, args: Vec<OsString>) -> Result<(), MountError> {
        let command = bin.display().to_string();
        tracing::debug!(%command, ?args, "executing");

        let output = Command::new(bin)
            .args(&args)
            .output()
            .await
            .map_err(|source| MountError::Spawn {
                command: command.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let combined = combined.trim().to_owned();

        if !output.status.success() {
            tracing::error!(%command, status = %output.status, output = %combined, "command failed");
            return Err(MountError::CommandFailed {
                command,
                status: output.status.to_string(),
                output: combined,
            });
        }

        tracing::debug!(%command, output = %combined, "command succeeded");
        Ok(())
    }
}

#[async_trait]
impl Mounter for SystemMounter {
    async fn mount(
        &self,
        source: &str,
        target: &Path,
        options: &[String],
    ) -> Result<(), MountError> {
        tracing::info!(%source, target = %target.display(), "mounting volume");
        self.run(&self.mount_bin, mount_args(source, target, options))
            .await
    }

    async fn unmount(&self, target: &Path) -> Result<(), MountError> {
        tracing::info!(target = %target.display(), "unmounting volume");
        self.run(&self.umount_bin, vec![target.as_os_str().to_owned()])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_join_options() {
        let args = mount_args(
            "10.0.0.1:db1/root",
            Path::new("/mnt/volumes/db1"),
            &["nolock".to_string(), "vers=3".to_string()],
        );
        assert_eq!(
            args,
            vec!["-o", "nolock,vers=3", "10.0.0.1:db1/root", "/mnt/volumes/db1"]
                .into_iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn args_without_options_skip_flag() {
        let args = mount_args("host:path", Path::new("/m"), &[]);
        assert_eq!(args, vec![OsString::from("host:path"), OsString::from("/m")]);
    }

    #[tokio::test]
    async fn successful_command_is_ok() {
        let mounter = SystemMounter::with_binaries("true", "true");
        mounter
            .mount("host:path", Path::new("/m"), &["nolock".to_string()])
            .await
            .unwrap();
        mounter.unmount(Path::new("/m")).await.unwrap();
    }

    #[tokio::test]
    async fn failing_command_reports_status() {
        let mounter = SystemMounter::with_binaries("false", "false");
        let err = mounter.unmount(Path::new("/m")).await.unwrap_err();
        assert!(matches!(err, MountError::CommandFailed { ref command, .. } if command == "false"));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let mounter = SystemMounter::with_binaries("/nonexistent/mount", "/nonexistent/umount");
        let err = mounter.unmount(Path::new("/m")).await.unwrap_err();
        assert!(matches!(err, MountError::Spawn { .. }));
    }
}
