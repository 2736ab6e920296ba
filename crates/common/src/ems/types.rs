//! Resource types exchanged with the management service.
//!
//! Field names follow the service's JSON representation so the same structs
//! travel over the wire and into the persisted registry snapshot.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Name given to the single export created for every data container.
pub const DEFAULT_EXPORT_NAME: &str = "root";

static ILLEGAL_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9._-]+").expect("static regex"));

/// Strip every character the service refuses in a data container name.
pub fn legal_volume_name(name: &str) -> String {
    ILLEGAL_NAME_CHARS.replace_all(name, "").into_owned()
}

/// A quota-bound storage unit on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataContainer {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub policy_id: u64,
    #[serde(default)]
    pub hard_quota: u64,
    #[serde(default)]
    pub soft_quota: u64,
}

/// Network mount target bound to exactly one data container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub id: u64,
    pub name: String,
    #[serde(default = "default_export_path")]
    pub path: String,
    pub data_container_id: u64,
    #[serde(default)]
    pub access: ExportAccess,
    #[serde(default)]
    pub user_mapping: UserMapping,
    #[serde(default)]
    pub uid: Option<u32>,
    #[serde(default)]
    pub gid: Option<u32>,
}

fn default_export_path() -> String {
    "/".to_owned()
}

/// Storage behavior profile. Exactly one is flagged as the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportAccess {
    #[default]
    ReadWrite,
    ReadOnly,
}

/// How client identities are squashed by the export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserMapping {
    NoMapping,
    RemapRoot,
    #[default]
    RemapAll,
}

impl UserMapping {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserMapping::NoMapping => "no_mapping",
            UserMapping::RemapRoot => "remap_root",
            UserMapping::RemapAll => "remap_all",
        }
    }
}

impl fmt::Display for UserMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported user mapping type: {0}")]
pub struct UnknownUserMapping(pub String);

impl FromStr for UserMapping {
    type Err = UnknownUserMapping;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_mapping" => Ok(UserMapping::NoMapping),
            "remap_root" => Ok(UserMapping::RemapRoot),
            "remap_all" => Ok(UserMapping::RemapAll),
            other => Err(UnknownUserMapping(other.to_owned())),
        }
    }
}

/// Desired shape of a data container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcCreateOpts {
    pub name: String,
    pub hard_quota: u64,
    pub soft_quota: u64,
    pub dir_permissions: u32,
    pub dedup: u8,
    pub compression: u8,
}

impl DcCreateOpts {
    /// Defaults used by the plugin; quotas are filled in by option parsing.
    pub fn new(name: &str) -> Self {
        Self {
            name: legal_volume_name(name),
            hard_quota: 0,
            soft_quota: 0,
            dir_permissions: 777,
            dedup: 0,
            compression: 1,
        }
    }
}

/// Desired shape of the export bound to a data container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportCreateOpts {
    pub path: String,
    pub access: ExportAccess,
    pub user_mapping: UserMapping,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    /// Filled in once the data container exists.
    #[serde(default)]
    pub data_container_id: u64,
}

impl Default for ExportCreateOpts {
    fn default() -> Self {
        Self {
            path: default_export_path(),
            access: ExportAccess::ReadWrite,
            user_mapping: UserMapping::RemapAll,
            uid: Some(0),
            gid: Some(0),
            data_container_id: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_name_strips_illegal_characters() {
        assert_eq!(legal_volume_name("db1"), "db1");
        assert_eq!(legal_volume_name("my vol/01!"), "myvol01");
        assert_eq!(legal_volume_name("a.b_c-d"), "a.b_c-d");
    }

    #[test]
    fn user_mapping_parses_wire_names() {
        assert_eq!("remap_root".parse::<UserMapping>().unwrap(), UserMapping::RemapRoot);
        assert_eq!("no_mapping".parse::<UserMapping>().unwrap(), UserMapping::NoMapping);
        assert!("squash".parse::<UserMapping>().is_err());
    }

    #[test]
    fn export_deserializes_with_defaults() {
        let json = r#"{"id": 7, "name": "root", "data_container_id": 3}"#;
        let export: Export = serde_json::from_str(json).unwrap();
        assert_eq!(export.path, "/");
        assert_eq!(export.access, ExportAccess::ReadWrite);
        assert_eq!(export.user_mapping, UserMapping::RemapAll);
        assert_eq!(export.uid, None);
    }

    #[test]
    fn dc_create_opts_defaults() {
        let opts = DcCreateOpts::new("vol 1");
        assert_eq!(opts.name, "vol1");
        assert_eq!(opts.dir_permissions, 777);
        assert_eq!(opts.compression, 1);
        assert_eq!(opts.dedup, 0);
    }
}
