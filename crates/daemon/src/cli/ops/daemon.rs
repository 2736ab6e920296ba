use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args};

use common::orchestrator::Scope;
use efs_daemon::ems::{management_url, Credentials};
use efs_daemon::{spawn_service, ServiceConfig};

pub const DEFAULT_SOCKET_PATH: &str = "/run/docker/plugins/elastifile.sock";

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Management service address, `host[:port]` or a full URL
    #[arg(long, env = "EFS_MANAGEMENT_ADDR")]
    pub management_addr: String,

    #[arg(long, env = "EFS_MANAGEMENT_USER", default_value = "admin")]
    pub management_user: String,

    #[arg(long, env = "EFS_MANAGEMENT_PASSWORD", hide_env_values = true)]
    pub management_password: String,

    /// Storage network address the NFS exports are mounted from
    #[arg(long, env = "EFS_STORAGE_ADDR")]
    pub storage_addr: String,

    /// Look up remote resources before creating or deleting them
    #[arg(
        long,
        env = "EFS_CRUD_IDEMPOTENT",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set,
        default_value = "false"
    )]
    pub crud_idempotent: bool,

    /// Unix socket the plugin API is served on
    #[arg(long, env = "EFS_SOCKET", default_value = DEFAULT_SOCKET_PATH)]
    pub socket: PathBuf,

    /// Volume scope reported to the host runtime (global or local)
    #[arg(long, env = "EFS_SCOPE", default_value = "global")]
    pub scope: Scope,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long, env = "EFS_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "DEBUG",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set,
        default_value = "false"
    )]
    pub debug: bool,
}

impl Daemon {
    pub fn service_config(&self, root: PathBuf) -> Result<ServiceConfig, DaemonError> {
        let management_url = management_url(&self.management_addr).map_err(|source| {
            DaemonError::ManagementAddr {
                addr: self.management_addr.clone(),
                source,
            }
        })?;

        Ok(ServiceConfig {
            management_url,
            credentials: Credentials {
                login: self.management_user.clone(),
                password: self.management_password.clone(),
            },
            storage_addr: self.storage_addr.clone(),
            crud_idempotent: self.crud_idempotent,
            root,
            socket_path: self.socket.clone(),
            scope: self.scope,
            log_level: if self.debug {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            },
            log_dir: self.log_dir.clone(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("invalid management address {addr:?}: {source}")]
    ManagementAddr {
        addr: String,
        #[source]
        source: url::ParseError,
    },
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = self.service_config(ctx.root.clone())?;
        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
