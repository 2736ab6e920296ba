pub mod daemon;
pub mod version;
pub mod volumes;

pub use daemon::Daemon;
pub use version::Version;
pub use volumes::Volumes;
