//! Logical volumes and their creation options.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ems::{
    legal_volume_name, DataContainer, DcCreateOpts, Export, ExportCreateOpts, UnknownUserMapping,
    UserMapping,
};
use crate::size::{self, SizeError, GIB};

/// Quota applied when the caller does not pass `size`.
pub const DEFAULT_VOLUME_SIZE: u64 = 100 * GIB;
/// Mount options every volume starts with.
pub const DEFAULT_MOUNT_OPTIONS: &[&str] = &["nolock"];

pub const OPTION_SIZE: &str = "size";
pub const OPTION_USER_MAPPING_TYPE: &str = "user-mapping-type";
pub const OPTION_USER_MAPPING_UID: &str = "user-mapping-uid";
pub const OPTION_USER_MAPPING_GID: &str = "user-mapping-gid";

/// Whether the kernel bind for a volume is currently in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountState {
    #[default]
    Unmounted,
    Mounted,
}

/// A named volume and the remote resources backing it.
///
/// Mount options and remote handles are fixed at creation. Only the mount
/// state and the consumer count change afterwards, and only through
/// [`crate::mount::MountCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Key of the registry table, not repeated in the snapshot record.
    #[serde(skip)]
    name: String,
    mountpoint: PathBuf,
    mount_options: Vec<String>,
    #[serde(default)]
    active_consumers: u32,
    #[serde(default)]
    state: MountState,
    data_container: DataContainer,
    export: Export,
}

impl Volume {
    pub fn new(
        name: impl Into<String>,
        mountpoint: impl Into<PathBuf>,
        mount_options: Vec<String>,
        data_container: DataContainer,
        export: Export,
    ) -> Self {
        Self {
            name: name.into(),
            mountpoint: mountpoint.into(),
            mount_options,
            active_consumers: 0,
            state: MountState::Unmounted,
            data_container,
            export,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mountpoint(&self) -> &Path {
        &self.mountpoint
    }

    pub fn mount_options(&self) -> &[String] {
        &self.mount_options
    }

    pub fn active_consumers(&self) -> u32 {
        self.active_consumers
    }

    pub fn state(&self) -> MountState {
        self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.state == MountState::Mounted
    }

    pub fn data_container(&self) -> &DataContainer {
        &self.data_container
    }

    pub fn export(&self) -> &Export {
        &self.export
    }

    /// Extra detail reported to the host runtime on inspect.
    pub fn status(&self) -> VolumeStatus {
        VolumeStatus {
            data_container: self.data_container.name.clone(),
            data_container_id: self.data_container.id,
            export: self.export.name.clone(),
            quota: size::format_size(self.data_container.hard_quota),
            user_mapping: self.export.user_mapping,
            active_consumers: self.active_consumers,
            state: self.state,
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// A consumer count that disagrees with the mount state cannot be trusted.
    pub(crate) fn is_consistent(&self) -> bool {
        (self.active_consumers == 0) == (self.state == MountState::Unmounted)
    }

    pub(crate) fn mark_mounted(&mut self) {
        self.state = MountState::Mounted;
        self.active_consumers = 1;
    }

    pub(crate) fn mark_unmounted(&mut self) {
        self.state = MountState::Unmounted;
        self.active_consumers = 0;
    }

    pub(crate) fn add_consumer(&mut self) {
        self.active_consumers = self.active_consumers.saturating_add(1);
    }

    pub(crate) fn drop_consumer(&mut self) {
        self.active_consumers = self.active_consumers.saturating_sub(1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeStatus {
    pub data_container: String,
    pub data_container_id: u64,
    pub export: String,
    pub quota: String,
    pub user_mapping: UserMapping,
    pub active_consumers: u32,
    pub state: MountState,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("invalid volume name {0:?}: use only letters, digits, '.', '_' and '-'")]
    InvalidName(String),
    #[error("failed to parse volume size {value:?}: {source}")]
    Size {
        value: String,
        #[source]
        source: SizeError,
    },
    #[error(transparent)]
    UserMapping(#[from] UnknownUserMapping),
    #[error("unsupported {key} value: {value:?}")]
    InvalidId { key: &'static str, value: String },
}

/// Reject names that would escape or collapse the mountpoint directory, and
/// names the service would store under a different data container name.
///
/// Names differing only in stripped characters would share a container.
pub fn validate_name(name: &str) -> Result<(), OptionsError> {
    if name.is_empty() || name == "." || name == ".." || legal_volume_name(name) != name {
        return Err(OptionsError::InvalidName(name.to_owned()));
    }
    Ok(())
}

/// Everything a create request resolves to before touching the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSpec {
    pub data_container: DcCreateOpts,
    pub export: ExportCreateOpts,
    pub mount_options: Vec<String>,
}

impl VolumeSpec {
    /// Split creation options into remote settings and local mount options.
    ///
    /// Recognized keys configure the data container quota and the export's
    /// identity mapping. Any other key is forwarded to `mount -o` verbatim,
    /// as `key=value` or as a bare `key` when the value is empty.
    pub fn parse(name: &str, options: &BTreeMap<String, String>) -> Result<Self, OptionsError> {
        let mut data_container = DcCreateOpts::new(name);
        let mut export = ExportCreateOpts::default();
        let mut mount_options: Vec<String> =
            DEFAULT_MOUNT_OPTIONS.iter().map(|o| o.to_string()).collect();

        for (key, value) in options {
            match key.as_str() {
                OPTION_SIZE => {
                    data_container.hard_quota =
                        size::parse_size(value).map_err(|source| OptionsError::Size {
                            value: value.clone(),
                            source,
                        })?;
                }
                OPTION_USER_MAPPING_TYPE => {
                    export.user_mapping = value.parse()?;
                }
                OPTION_USER_MAPPING_UID => {
                    export.uid = Some(parse_id(OPTION_USER_MAPPING_UID, value)?);
                }
                OPTION_USER_MAPPING_GID => {
                    export.gid = Some(parse_id(OPTION_USER_MAPPING_GID, value)?);
                }
                _ if value.is_empty() => mount_options.push(key.clone()),
                _ => mount_options.push(format!("{}={}", key, value)),
            }
        }

        if data_container.hard_quota == 0 {
            tracing::info!(size = DEFAULT_VOLUME_SIZE, "using default volume size");
            data_container.hard_quota = DEFAULT_VOLUME_SIZE;
        }
        // The service rejects a hard quota without a soft one.
        data_container.soft_quota = data_container.hard_quota;

        Ok(Self {
            data_container,
            export,
            mount_options,
        })
    }
}

fn parse_id(key: &'static str, value: &str) -> Result<u32, OptionsError> {
    value.trim().parse().map_err(|_| OptionsError::InvalidId {
        key,
        value: value.to_owned(),
    })
}
