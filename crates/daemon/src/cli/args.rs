pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "efs-volume-plugin")]
#[command(about = "Docker volume plugin backed by Elastifile data containers")]
pub struct Args {
    /// Directory holding `volumes/` (mountpoints) and `state/` (registry snapshot)
    #[arg(long, global = true, env = "EFS_ROOT", default_value = "/mnt")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: crate::Command,
}
