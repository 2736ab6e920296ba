//! Integration tests for the volume lifecycle

mod common;

use std::sync::Arc;

use ::common::mount::MountError;
use ::common::orchestrator::OrchestratorError;
use ::common::provisioner::{ProvisionMode, ProvisionStep};
use ::common::size::GIB;
use ::common::testkit::{MountCall, StorageCall};
use ::common::ems::{EmsError, UserMapping};

use common::{opts, setup_test_env, TestEnv, STORAGE_ADDR};

async fn consumers(env: &TestEnv, name: &str) -> u32 {
    env.orchestrator.get(name).await.unwrap().active_consumers()
}

#[tokio::test]
async fn test_create_then_path() {
    let env = setup_test_env(ProvisionMode::Idempotent);
    env.orchestrator.create("web", &opts(&[])).await.unwrap();

    let path = env.orchestrator.path("web").await.unwrap();
    assert_eq!(path, env.mountpoint("web"));
    let volume = env.orchestrator.get("web").await.unwrap();
    assert_eq!(volume.active_consumers(), 0);
    assert!(!volume.is_mounted());
}

#[tokio::test]
async fn test_double_create_is_rejected() {
    let env = setup_test_env(ProvisionMode::Idempotent);
    let first = env
        .orchestrator
        .create("web", &opts(&[("size", "10GiB")]))
        .await
        .unwrap();

    let err = env
        .orchestrator
        .create("web", &opts(&[("size", "20GiB")]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::AlreadyExists(ref name) if name == "web"));

    assert_eq!(env.orchestrator.get("web").await.unwrap(), first);
    assert_eq!(env.orchestrator.list().await.len(), 1);
    assert_eq!(env.storage.count(StorageCall::CreateDataContainer), 1);
}

#[tokio::test]
async fn test_failed_provisioning_records_nothing() {
    let env = setup_test_env(ProvisionMode::Idempotent);
    env.storage
        .fail_next(StorageCall::CreateExport, EmsError::transport("connection refused"));

    let err = env.orchestrator.create("web", &opts(&[])).await.unwrap_err();
    match err {
        OrchestratorError::Provision(e) => assert_eq!(e.step, ProvisionStep::CreateExport),
        other => panic!("unexpected error: {other}"),
    }
    assert!(env.orchestrator.list().await.is_empty());
    assert!(matches!(
        env.orchestrator.path("web").await,
        Err(OrchestratorError::NotFound(_))
    ));

    // The data container survived; an idempotent retry picks it up.
    env.orchestrator.create("web", &opts(&[])).await.unwrap();
    assert_eq!(env.storage.count(StorageCall::CreateDataContainer), 1);
    assert_eq!(env.storage.data_containers().len(), 1);
}

#[tokio::test]
async fn test_invalid_options_are_rejected_before_provisioning() {
    let env = setup_test_env(ProvisionMode::Idempotent);

    let err = env
        .orchestrator
        .create("web", &opts(&[("size", "huge")]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::InvalidArgument(_)));

    let err = env.orchestrator.create("../etc", &opts(&[])).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::InvalidArgument(_)));

    assert!(env.storage.calls().is_empty());
}

#[tokio::test]
async fn test_remove_in_use_is_rejected() {
    let env = setup_test_env(ProvisionMode::Idempotent);
    env.orchestrator.create("web", &opts(&[])).await.unwrap();
    env.orchestrator.mount("web").await.unwrap();
    let calls_before = env.storage.calls().len();

    let err = env.orchestrator.remove("web").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::InUse { consumers: 1, .. }));

    assert_eq!(env.storage.calls().len(), calls_before);
    assert_eq!(env.mounter.unmount_count(), 0);
    assert!(env.mountpoint("web").is_dir());
    assert!(env.orchestrator.get("web").await.is_ok());
}

#[tokio::test]
async fn test_mount_twice_unmount_twice() {
    let env = setup_test_env(ProvisionMode::Idempotent);
    env.orchestrator.create("web", &opts(&[])).await.unwrap();

    let mut seen = vec![consumers(&env, "web").await];

    env.orchestrator.mount("web").await.unwrap();
    seen.push(consumers(&env, "web").await);
    env.orchestrator.mount("web").await.unwrap();
    seen.push(consumers(&env, "web").await);
    env.orchestrator.unmount("web").await.unwrap();
    seen.push(consumers(&env, "web").await);
    env.orchestrator.unmount("web").await.unwrap();
    seen.push(consumers(&env, "web").await);

    assert_eq!(seen, vec![0, 1, 2, 1, 0]);
    assert_eq!(env.mounter.mount_count(), 1);
    assert_eq!(env.mounter.unmount_count(), 1);
}

#[tokio::test]
async fn test_extra_unmount_is_harmless() {
    let env = setup_test_env(ProvisionMode::Idempotent);
    env.orchestrator.create("web", &opts(&[])).await.unwrap();

    env.orchestrator.unmount("web").await.unwrap();
    env.orchestrator.mount("web").await.unwrap();
    env.orchestrator.unmount("web").await.unwrap();
    env.orchestrator.unmount("web").await.unwrap();

    let volume = env.orchestrator.get("web").await.unwrap();
    assert_eq!(volume.active_consumers(), 0);
    assert_eq!(env.mounter.unmount_count(), 1);
}

#[tokio::test]
async fn test_failed_mount_is_not_counted() {
    let env = setup_test_env(ProvisionMode::Idempotent);
    env.orchestrator.create("web", &opts(&[])).await.unwrap();
    env.mounter.fail_next_mount("mount.nfs: Connection timed out");

    let err = env.orchestrator.mount("web").await.unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Mount(MountError::CommandFailed { .. })
    ));
    assert_eq!(env.orchestrator.get("web").await.unwrap().active_consumers(), 0);
}

#[tokio::test]
async fn test_unknown_names_are_not_found() {
    let env = setup_test_env(ProvisionMode::Strict);

    for err in [
        env.orchestrator.remove("ghost").await.unwrap_err(),
        env.orchestrator.mount("ghost").await.unwrap_err(),
        env.orchestrator.unmount("ghost").await.unwrap_err(),
        env.orchestrator.path("ghost").await.unwrap_err(),
        env.orchestrator.get("ghost").await.unwrap_err(),
    ] {
        assert!(matches!(err, OrchestratorError::NotFound(ref name) if name == "ghost"));
        assert_eq!(err.to_string(), "volume ghost not found");
    }
}

#[tokio::test]
async fn test_remove_aborts_when_mountpoint_cannot_be_removed() {
    let env = setup_test_env(ProvisionMode::Idempotent);
    env.orchestrator.create("web", &opts(&[])).await.unwrap();

    // A file where the volumes directory should be makes the removal fail
    // with something other than "not found".
    let volumes = env.mountpoint("web").parent().unwrap().to_path_buf();
    std::fs::write(&volumes, b"").unwrap();

    let err = env.orchestrator.remove("web").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Io { .. }));
    assert_eq!(env.storage.count(StorageCall::DeleteExport), 0);
    assert_eq!(env.storage.count(StorageCall::DeleteDataContainer), 0);
    assert!(env.orchestrator.get("web").await.is_ok());
}

#[tokio::test]
async fn test_strict_remove_surfaces_missing_remote_state() {
    let env = setup_test_env(ProvisionMode::Strict);
    let volume = env.orchestrator.create("web", &opts(&[])).await.unwrap();
    env.storage.remove_data_container(volume.data_container().id);

    let err = env.orchestrator.remove("web").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Provision(_)));
    assert!(env.orchestrator.get("web").await.is_ok());
}

#[tokio::test]
async fn test_idempotent_remove_tolerates_missing_remote_state() {
    let env = setup_test_env(ProvisionMode::Idempotent);
    let volume = env.orchestrator.create("web", &opts(&[])).await.unwrap();
    env.storage.remove_data_container(volume.data_container().id);

    env.orchestrator.remove("web").await.unwrap();
    assert!(env.orchestrator.list().await.is_empty());
}

#[tokio::test]
async fn test_db1_walkthrough() {
    let env = setup_test_env(ProvisionMode::Idempotent);

    let volume = env
        .orchestrator
        .create(
            "db1",
            &opts(&[("size", "50GiB"), ("user-mapping-type", "remap_root")]),
        )
        .await
        .unwrap();
    assert_eq!(volume.data_container().hard_quota, 50 * GIB);
    assert_eq!(volume.data_container().soft_quota, 50 * GIB);
    assert_eq!(volume.export().user_mapping, UserMapping::RemapRoot);
    assert_eq!(volume.mountpoint(), env.root().join("volumes").join("db1"));

    let mountpoint = env.orchestrator.mount("db1").await.unwrap();
    assert_eq!(mountpoint, env.mountpoint("db1"));
    assert!(mountpoint.is_dir());

    env.orchestrator.unmount("db1").await.unwrap();
    assert_eq!(
        env.mounter.calls(),
        vec![
            MountCall::Mount {
                source: format!("{STORAGE_ADDR}:db1/root"),
                target: mountpoint.clone(),
                options: vec!["nolock".to_string()],
            },
            MountCall::Unmount {
                target: mountpoint.clone()
            },
        ]
    );

    env.orchestrator.remove("db1").await.unwrap();
    let deletes: Vec<_> = env
        .storage
        .calls()
        .into_iter()
        .filter(|c| matches!(c, StorageCall::DeleteExport | StorageCall::DeleteDataContainer))
        .collect();
    assert_eq!(
        deletes,
        vec![StorageCall::DeleteExport, StorageCall::DeleteDataContainer]
    );
    assert!(!mountpoint.exists());
    assert!(env.storage.data_containers().is_empty());
    assert!(env.storage.exports().is_empty());
    assert!(env.orchestrator.list().await.is_empty());
}

#[tokio::test]
async fn test_list_is_sorted_by_name() {
    let env = setup_test_env(ProvisionMode::Idempotent);
    for name in ["zeta", "alpha", "mid"] {
        env.orchestrator.create(name, &opts(&[])).await.unwrap();
    }

    let names: Vec<_> = env
        .orchestrator
        .list()
        .await
        .iter()
        .map(|v| v.name().to_owned())
        .collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}

#[tokio::test]
async fn test_names_that_alias_a_data_container_are_rejected() {
    let env = setup_test_env(ProvisionMode::Idempotent);
    env.orchestrator.create("ab", &opts(&[])).await.unwrap();

    for name in ["a b", "a!b", "!!!"] {
        let err = env.orchestrator.create(name, &opts(&[])).await.unwrap_err();
        assert!(
            matches!(err, OrchestratorError::InvalidArgument(_)),
            "{name}: {err:?}"
        );
    }
    assert_eq!(env.storage.count(StorageCall::CreateDataContainer), 1);
    assert_eq!(env.storage.data_containers().len(), 1);

    env.orchestrator.remove("ab").await.unwrap();
    assert!(env.storage.data_containers().is_empty());
    assert!(env.orchestrator.list().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_of_one_name_provision_once() {
    let env = Arc::new(setup_test_env(ProvisionMode::Idempotent));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let env = env.clone();
            tokio::spawn(async move { env.orchestrator.create("db1", &opts(&[])).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(err) => assert!(
                matches!(err, OrchestratorError::AlreadyExists(ref name) if name == "db1"),
                "{err:?}"
            ),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(env.storage.count(StorageCall::CreateDataContainer), 1);
    assert_eq!(env.storage.count(StorageCall::CreateExport), 1);
    assert_eq!(env.orchestrator.list().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mounts_bind_and_unbind_once() {
    let env = Arc::new(setup_test_env(ProvisionMode::Idempotent));
    env.orchestrator.create("db1", &opts(&[])).await.unwrap();

    let mounts: Vec<_> = (0..8)
        .map(|_| {
            let env = env.clone();
            tokio::spawn(async move { env.orchestrator.mount("db1").await })
        })
        .collect();
    for handle in mounts {
        assert_eq!(handle.await.unwrap().unwrap(), env.mountpoint("db1"));
    }
    assert_eq!(env.mounter.mount_count(), 1);
    assert_eq!(consumers(&env, "db1").await, 8);

    let unmounts: Vec<_> = (0..8)
        .map(|_| {
            let env = env.clone();
            tokio::spawn(async move { env.orchestrator.unmount("db1").await })
        })
        .collect();
    for handle in unmounts {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(env.mounter.unmount_count(), 1);
    assert_eq!(consumers(&env, "db1").await, 0);
    assert!(!env.orchestrator.get("db1").await.unwrap().is_mounted());
}
