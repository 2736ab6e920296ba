use std::path::PathBuf;

use url::Url;

use common::orchestrator::Scope;

use crate::ems::Credentials;

#[derive(Debug, Clone)]
pub struct Config {
    // management service
    /// base URL of the management service REST API
    pub management_url: Url,
    pub credentials: Credentials,
    /// address of the storage network NFS exports are served on
    pub storage_addr: String,
    /// check remote state before every create and delete
    pub crud_idempotent: bool,

    // local layout
    /// directory holding `volumes/` and `state/`
    pub root: PathBuf,
    /// unix socket the plugin API is served on
    pub socket_path: PathBuf,
    pub scope: Scope,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}
