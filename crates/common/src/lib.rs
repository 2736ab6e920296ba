/**
 * Client-side view of the Elastifile management service (EMS).
 *  Data containers, exports and policies, plus the
 *  `StorageManager` trait every remote client implements.
 */
pub mod ems;
/**
 * Local mount bookkeeping: the consumer-counting
 *  coordinator and the `mount`/`umount` executor.
 */
pub mod mount;
/**
 * Lifecycle operations consumed by the host
 *  container runtime (create, remove, mount, unmount,
 *  path, get, list, capabilities).
 */
pub mod orchestrator;
/**
 * Check-then-act provisioning of the remote
 *  data container and export backing a volume.
 */
pub mod provisioner;
/**
 * In-memory volume table with full-snapshot
 *  persistence for crash recovery.
 */
pub mod registry;
/**
 * Human readable byte sizes ("50GiB", "100G").
 */
pub mod size;
/**
 * In-memory fakes of the remote and local seams.
 */
pub mod testkit;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;
/**
 * The logical volume record and the parsing of
 *  creation options into remote and local settings.
 */
pub mod volume;

pub mod prelude {
    pub use crate::ems::{DataContainer, EmsError, Export, StorageManager};
    pub use crate::mount::{MountCoordinator, MountError, Mounter, SystemMounter};
    pub use crate::orchestrator::{Capabilities, Orchestrator, OrchestratorError, Scope};
    pub use crate::provisioner::{ProvisionError, ProvisionMode, Provisioner};
    pub use crate::registry::{Registry, RegistryError};
    pub use crate::version::BuildInfo;
    pub use crate::build_info;
    pub use crate::volume::{MountState, Volume, VolumeStatus};
}
