use std::collections::BTreeMap;
use std::fmt::Write;

use clap::Args;

use common::orchestrator;
use common::registry::{Registry, RegistryError};
use common::volume::Volume;

/// Print the persisted volume table without contacting the daemon.
#[derive(Args, Debug, Clone)]
pub struct Volumes {
    /// Print the records as JSON, keyed by volume name
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum VolumesError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("failed to encode volumes: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Volumes {
    type Error = VolumesError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let registry = Registry::load(orchestrator::state_path(&ctx.root))?;
        if self.json {
            let table: BTreeMap<&str, &Volume> = registry.list().map(|v| (v.name(), v)).collect();
            return Ok(serde_json::to_string_pretty(&table)?);
        }
        Ok(format_table(registry.list()))
    }
}

fn format_table<'a>(volumes: impl Iterator<Item = &'a Volume>) -> String {
    let mut out = String::new();
    let _ = write!(out, "NAME\tSTATE\tCONSUMERS\tQUOTA\tMOUNTPOINT");
    for volume in volumes {
        let status = volume.status();
        let state = if volume.is_mounted() { "mounted" } else { "unmounted" };
        let _ = write!(
            out,
            "\n{}\t{}\t{}\t{}\t{}",
            volume.name(),
            state,
            status.active_consumers,
            status.quota,
            volume.mountpoint().display()
        );
    }
    out
}
