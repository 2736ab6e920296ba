//! Shared test utilities for lifecycle integration tests
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::mount::MountCoordinator;
use common::orchestrator::{self, Orchestrator, Scope};
use common::provisioner::{ProvisionMode, Provisioner};
use common::registry::Registry;
use common::testkit::{FakeStorageManager, RecordingMounter};
use tempfile::TempDir;

pub const STORAGE_ADDR: &str = "10.11.12.13";

/// An orchestrator over in-memory fakes, rooted in a temp directory.
pub struct TestEnv {
    pub root: TempDir,
    pub storage: Arc<FakeStorageManager>,
    pub mounter: Arc<RecordingMounter>,
    pub mode: ProvisionMode,
    pub orchestrator: Orchestrator,
}

impl TestEnv {
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn mountpoint(&self, name: &str) -> PathBuf {
        orchestrator::volumes_dir(self.root()).join(name)
    }

    pub fn state_path(&self) -> PathBuf {
        orchestrator::state_path(self.root())
    }

    /// Simulate a process restart: reload the snapshot into a fresh
    /// orchestrator talking to the same remote service.
    pub fn restart(self) -> TestEnv {
        let orchestrator = build(self.root(), &self.storage, &self.mounter, self.mode);
        TestEnv {
            orchestrator,
            ..self
        }
    }
}

fn build(
    root: &Path,
    storage: &Arc<FakeStorageManager>,
    mounter: &Arc<RecordingMounter>,
    mode: ProvisionMode,
) -> Orchestrator {
    let registry = Registry::load(orchestrator::state_path(root)).unwrap();
    let provisioner = Provisioner::new(storage.clone(), mode);
    let mounts = MountCoordinator::new(mounter.clone(), storage.clone(), STORAGE_ADDR);
    Orchestrator::new(
        registry,
        provisioner,
        mounts,
        orchestrator::volumes_dir(root),
        Scope::Global,
    )
}

pub fn setup_test_env(mode: ProvisionMode) -> TestEnv {
    // RUST_LOG=debug shows the orchestrator's spans for a failing test
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let root = TempDir::new().unwrap();
    let storage = Arc::new(FakeStorageManager::new());
    let mounter = Arc::new(RecordingMounter::new());
    let orchestrator = build(root.path(), &storage, &mounter, mode);
    TestEnv {
        root,
        storage,
        mounter,
        mode,
        orchestrator,
    }
}

pub fn opts(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
