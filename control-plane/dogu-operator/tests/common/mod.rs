#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dogu_operator::crd::dogu::{Dogu, DoguSpec, DoguStatus, HealthStatus};
use dogu_operator::descriptor::{
    Dependency, DependencyType, DoguDescriptor, FetchError, LocalDoguFetcher,
};
use dogu_operator::events::EventPublisher;
use dogu_operator::repository::{RepositoryError, ResourceRepository, RetryPolicy};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStatus};
use k8s_openapi::api::core::v1::ObjectReference;
use kube::core::ErrorResponse;
use kube::runtime::events::EventType;
use kube::{Resource, ResourceExt};

pub fn no_backoff(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: Duration::ZERO,
    }
}

pub fn api_error(code: u16) -> RepositoryError {
    RepositoryError::Kube(kube::Error::Api(ErrorResponse {
        status: "Failure".into(),
        message: "injected failure".into(),
        reason: "InternalError".into(),
        code,
    }))
}

// In-memory stand-in for the API server, including resourceVersion checks
// on status writes.
pub struct FakeRepository<K> {
    kind: &'static str,
    items: Mutex<BTreeMap<String, K>>,
    broken_gets: Mutex<HashSet<String>>,
    broken_updates: Mutex<HashSet<String>>,
    pending_conflicts: Mutex<HashMap<String, u32>>,
    list_broken: Mutex<bool>,
    gets: Mutex<HashMap<String, usize>>,
    writes: Mutex<HashMap<String, usize>>,
}

impl<K> FakeRepository<K>
where
    K: Resource + Clone + Send + Sync + 'static,
{
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            items: Mutex::new(BTreeMap::new()),
            broken_gets: Mutex::new(HashSet::new()),
            broken_updates: Mutex::new(HashSet::new()),
            pending_conflicts: Mutex::new(HashMap::new()),
            list_broken: Mutex::new(false),
            gets: Mutex::new(HashMap::new()),
            writes: Mutex::new(HashMap::new()),
        }
    }

    pub fn with(kind: &'static str, objs: impl IntoIterator<Item = K>) -> Self {
        let repo = Self::new(kind);
        for obj in objs {
            repo.insert(obj);
        }
        repo
    }

    pub fn insert(&self, mut obj: K) {
        if obj.meta().resource_version.is_none() {
            obj.meta_mut().resource_version = Some("1".into());
        }
        self.items.lock().unwrap().insert(obj.name_any(), obj);
    }

    pub fn stored(&self, name: &str) -> Option<K> {
        self.items.lock().unwrap().get(name).cloned()
    }

    /// Simulate a foreign writer: mutate the stored object and bump its version.
    pub fn modify(&self, name: &str, f: impl FnOnce(&mut K)) {
        let mut items = self.items.lock().unwrap();
        let obj = items.get_mut(name).expect("object exists");
        f(obj);
        bump(obj);
    }

    pub fn break_get(&self, name: &str) {
        self.broken_gets.lock().unwrap().insert(name.to_string());
    }

    pub fn break_update(&self, name: &str) {
        self.broken_updates.lock().unwrap().insert(name.to_string());
    }

    pub fn break_list(&self) {
        *self.list_broken.lock().unwrap() = true;
    }

    /// The next `n` status writes for `name` lose a race against another writer.
    pub fn conflict_next(&self, name: &str, n: u32) {
        self.pending_conflicts
            .lock()
            .unwrap()
            .insert(name.to_string(), n);
    }

    pub fn gets(&self, name: &str) -> usize {
        self.gets.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn writes(&self, name: &str) -> usize {
        self.writes.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    fn not_found(&self, name: &str) -> RepositoryError {
        RepositoryError::NotFound {
            kind: self.kind.into(),
            name: name.into(),
        }
    }

    fn conflict(&self, name: &str) -> RepositoryError {
        RepositoryError::Conflict {
            kind: self.kind.into(),
            name: name.into(),
        }
    }
}

fn bump<K: Resource>(obj: &mut K) {
    let next = obj
        .meta()
        .resource_version
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    obj.meta_mut().resource_version = Some(next.to_string());
}

#[async_trait]
impl<K> ResourceRepository<K> for FakeRepository<K>
where
    K: Resource + Clone + Send + Sync + 'static,
{
    async fn get(&self, name: &str) -> Result<K, RepositoryError> {
        *self.gets.lock().unwrap().entry(name.to_string()).or_default() += 1;
        if self.broken_gets.lock().unwrap().contains(name) {
            return Err(api_error(500));
        }
        self.stored(name).ok_or_else(|| self.not_found(name))
    }

    async fn list(&self) -> Result<Vec<K>, RepositoryError> {
        if *self.list_broken.lock().unwrap() {
            return Err(api_error(503));
        }
        Ok(self.items.lock().unwrap().values().cloned().collect())
    }

    async fn update_status(&self, obj: &K) -> Result<K, RepositoryError> {
        let name = obj.name_any();
        *self.writes.lock().unwrap().entry(name.clone()).or_default() += 1;
        if self.broken_updates.lock().unwrap().contains(&name) {
            return Err(api_error(500));
        }

        let mut items = self.items.lock().unwrap();
        let Some(current) = items.get_mut(&name) else {
            return Err(self.not_found(&name));
        };

        if let Some(left) = self.pending_conflicts.lock().unwrap().get_mut(&name) {
            if *left > 0 {
                *left -= 1;
                bump(current);
                return Err(self.conflict(&name));
            }
        }
        if current.meta().resource_version != obj.meta().resource_version {
            return Err(self.conflict(&name));
        }

        let mut next = obj.clone();
        next.meta_mut().resource_version = current.meta().resource_version.clone();
        bump(&mut next);
        *current = next.clone();
        Ok(next)
    }
}

#[derive(Default)]
pub struct FakeFetcher {
    descriptors: HashMap<String, DoguDescriptor>,
    broken: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn with(descriptors: impl IntoIterator<Item = DoguDescriptor>) -> Self {
        Self {
            descriptors: descriptors
                .into_iter()
                .map(|d| (d.simple_name().to_string(), d))
                .collect(),
            ..Default::default()
        }
    }

    /// Registers `descriptor` under a lookup key other than its own name.
    pub fn insert_as(mut self, key: &str, descriptor: DoguDescriptor) -> Self {
        self.descriptors.insert(key.to_string(), descriptor);
        self
    }

    pub fn broken(mut self, name: &str) -> Self {
        self.broken.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocalDoguFetcher for FakeFetcher {
    async fn fetch_installed(
        &self,
        simple_name: &str,
    ) -> Result<DoguDescriptor, FetchError> {
        self.calls.lock().unwrap().push(simple_name.to_string());
        if self.broken.contains(simple_name) {
            return Err(FetchError::Registry(format!(
                "etcd unreachable while reading {simple_name}"
            )));
        }
        self.descriptors
            .get(simple_name)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(simple_name.to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct RecordedEvent {
    pub object: String,
    pub type_: EventType,
    pub reason: String,
    pub note: String,
}

#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEvents {
    pub fn recorded(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingEvents {
    async fn publish(
        &self,
        reference: &ObjectReference,
        type_: EventType,
        reason: &str,
        _action: &str,
        note: String,
    ) {
        self.events.lock().unwrap().push(RecordedEvent {
            object: reference.name.clone().unwrap_or_default(),
            type_,
            reason: reason.to_string(),
            note,
        });
    }
}

pub fn dogu(name: &str, health: Option<HealthStatus>) -> Dogu {
    let mut d = Dogu::new(
        name,
        DoguSpec {
            name: format!("official/{name}"),
            version: "1.0.0-1".into(),
            stopped: None,
            support_mode: None,
        },
    );
    d.metadata.namespace = Some("ecosystem".into());
    d.status = health.map(|health| DoguStatus {
        status: "installed".into(),
        health,
        ..Default::default()
    });
    d
}

pub fn deployment(name: &str, ready: bool) -> Deployment {
    let available = if ready { 1 } else { 0 };
    let mut d = Deployment {
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            ..Default::default()
        }),
        status: Some(DeploymentStatus {
            replicas: Some(1),
            updated_replicas: Some(1),
            available_replicas: Some(available),
            ..Default::default()
        }),
        ..Default::default()
    };
    d.metadata.name = Some(name.into());
    d
}

pub fn descriptor(name: &str, mandatory: &[&str], optional: &[&str]) -> DoguDescriptor {
    DoguDescriptor {
        name: format!("official/{name}"),
        version: "1.0.0-1".into(),
        dependencies: mandatory.iter().map(|n| dep(n)).collect(),
        optional_dependencies: optional.iter().map(|n| dep(n)).collect(),
    }
}

/// "official/x" style names are accepted; the verifier strips the namespace.
fn dep(name: &str) -> Dependency {
    Dependency::dogu(format!("official/{name}"))
}

pub fn non_dogu(kind: DependencyType, name: &str) -> Dependency {
    Dependency {
        r#type: kind,
        name: name.into(),
        version: String::new(),
    }
}
