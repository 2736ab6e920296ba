use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::ems::{
    DataContainer, DcCreateOpts, EmsError, Export, ExportCreateOpts, Policy, StorageManager,
};

/// One invocation of a [`StorageManager`] method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageCall {
    ListDataContainers,
    GetDataContainer,
    CreateDataContainer,
    DeleteDataContainer,
    ListExports,
    CreateExport,
    DeleteExport,
    ListPolicies,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    data_containers: Vec<DataContainer>,
    exports: Vec<Export>,
    policies: Vec<Policy>,
    calls: Vec<StorageCall>,
    failures: HashMap<StorageCall, Vec<EmsError>>,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Log the call and pop an injected failure, if any.
    fn record(&mut self, call: StorageCall) -> Result<(), EmsError> {
        self.calls.push(call);
        match self.failures.get_mut(&call) {
            Some(queue) if !queue.is_empty() => Err(queue.remove(0)),
            _ => Ok(()),
        }
    }
}

/// Management service double backed by plain vectors.
///
/// Mirrors the service's constraints the plugin depends on: data container
/// names are unique, and a data container cannot be deleted while an export
/// still references it.
pub struct FakeStorageManager {
    inner: Mutex<Inner>,
}

impl Default for FakeStorageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeStorageManager {
    /// A service with a default policy and one non-default policy.
    pub fn new() -> Self {
        let fake = Self::without_default_policy();
        fake.lock().policies.insert(
            0,
            Policy {
                id: 1,
                name: "default".to_owned(),
                is_default: true,
            },
        );
        fake
    }

    /// A service where no policy is flagged as default.
    pub fn without_default_policy() -> Self {
        let inner = Inner {
            next_id: 100,
            policies: vec![Policy {
                id: 2,
                name: "archive".to_owned(),
                is_default: false,
            }],
            ..Default::default()
        };
        Self {
            inner: Mutex::new(inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn data_containers(&self) -> Vec<DataContainer> {
        self.lock().data_containers.clone()
    }

    pub fn exports(&self) -> Vec<Export> {
        self.lock().exports.clone()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<StorageCall> {
        self.lock().calls.clone()
    }

    pub fn count(&self, call: StorageCall) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// Make the next invocation of `call` fail with `err`.
    pub fn fail_next(&self, call: StorageCall, err: EmsError) {
        self.lock().failures.entry(call).or_default().push(err);
    }

    /// Simulate another actor deleting an export.
    pub fn remove_export(&self, id: u64) {
        self.lock().exports.retain(|e| e.id != id);
    }

    /// Simulate another actor deleting a data container and its exports.
    pub fn remove_data_container(&self, id: u64) {
        let mut inner = self.lock();
        inner.exports.retain(|e| e.data_container_id != id);
        inner.data_containers.retain(|dc| dc.id != id);
    }
}

fn status(code: u16, body: impl Into<String>) -> EmsError {
    EmsError::Status {
        code,
        body: body.into(),
    }
}

#[async_trait]
impl StorageManager for FakeStorageManager {
    async fn list_data_containers(&self) -> Result<Vec<DataContainer>, EmsError> {
        let mut inner = self.lock();
        inner.record(StorageCall::ListDataContainers)?;
        Ok(inner.data_containers.clone())
    }

    async fn get_data_container(&self, id: u64) -> Result<DataContainer, EmsError> {
        let mut inner = self.lock();
        inner.record(StorageCall::GetDataContainer)?;
        inner
            .data_containers
            .iter()
            .find(|dc| dc.id == id)
            .cloned()
            .ok_or_else(|| status(404, format!("data container {id} not found")))
    }

    async fn create_data_container(
        &self,
        policy_id: u64,
        opts: &DcCreateOpts,
    ) -> Result<DataContainer, EmsError> {
        let mut inner = self.lock();
        inner.record(StorageCall::CreateDataContainer)?;
        if inner.data_containers.iter().any(|dc| dc.name == opts.name) {
            return Err(status(409, format!("name {} has already been taken", opts.name)));
        }
        if !inner.policies.iter().any(|p| p.id == policy_id) {
            return Err(status(422, format!("policy {policy_id} does not exist")));
        }
        let dc = DataContainer {
            id: inner.next_id(),
            name: opts.name.clone(),
            policy_id,
            hard_quota: opts.hard_quota,
            soft_quota: opts.soft_quota,
        };
        inner.data_containers.push(dc.clone());
        Ok(dc)
    }

    async fn delete_data_container(&self, dc: &DataContainer) -> Result<(), EmsError> {
        let mut inner = self.lock();
        inner.record(StorageCall::DeleteDataContainer)?;
        if inner.exports.iter().any(|e| e.data_container_id == dc.id) {
            return Err(status(409, format!("data container {} has exports", dc.id)));
        }
        let before = inner.data_containers.len();
        inner.data_containers.retain(|d| d.id != dc.id);
        if inner.data_containers.len() == before {
            return Err(status(404, format!("data container {} not found", dc.id)));
        }
        Ok(())
    }

    async fn list_exports(&self) -> Result<Vec<Export>, EmsError> {
        let mut inner = self.lock();
        inner.record(StorageCall::ListExports)?;
        Ok(inner.exports.clone())
    }

    async fn create_export(&self, name: &str, opts: &ExportCreateOpts) -> Result<Export, EmsError> {
        let mut inner = self.lock();
        inner.record(StorageCall::CreateExport)?;
        if !inner
            .data_containers
            .iter()
            .any(|dc| dc.id == opts.data_container_id)
        {
            return Err(status(
                422,
                format!("data container {} does not exist", opts.data_container_id),
            ));
        }
        if inner
            .exports
            .iter()
            .any(|e| e.name == name && e.data_container_id == opts.data_container_id)
        {
            return Err(status(409, format!("export {name} has already been taken")));
        }
        let export = Export {
            id: inner.next_id(),
            name: name.to_owned(),
            path: opts.path.clone(),
            data_container_id: opts.data_container_id,
            access: opts.access,
            user_mapping: opts.user_mapping,
            uid: opts.uid,
            gid: opts.gid,
        };
        inner.exports.push(export.clone());
        Ok(export)
    }

    async fn delete_export(&self, export: &Export) -> Result<(), EmsError> {
        let mut inner = self.lock();
        inner.record(StorageCall::DeleteExport)?;
        let before = inner.exports.len();
        inner.exports.retain(|e| e.id != export.id);
        if inner.exports.len() == before {
            return Err(status(404, format!("export {} not found", export.id)));
        }
        Ok(())
    }

    async fn list_policies(&self) -> Result<Vec<Policy>, EmsError> {
        let mut inner = self.lock();
        inner.record(StorageCall::ListPolicies)?;
        Ok(inner.policies.clone())
    }
}
