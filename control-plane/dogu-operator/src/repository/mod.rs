//! Generic access to Kubernetes resources plus the optimistic-concurrency
//! retry loop shared by every writer of dogu status.

mod kube_repo;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

pub use kube_repo::KubeRepository;

#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("{kind} {name} not found")]
    NotFound { kind: String, name: String },
    #[error("conflicting update on {kind} {name}")]
    Conflict { kind: String, name: String },
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict { .. })
    }
}

/// Namespace-scoped CRUD subset the health engine needs, for any resource kind.
#[async_trait]
pub trait ResourceRepository<K>: Send + Sync
where
    K: Send + Sync + 'static,
{
    async fn get(&self, name: &str) -> Result<K, RepositoryError>;

    async fn list(&self) -> Result<Vec<K>, RepositoryError>;

    /// Write the status subresource. The object's resourceVersion is sent
    /// along, so a concurrent write yields [`RepositoryError::Conflict`].
    async fn update_status(&self, obj: &K) -> Result<K, RepositoryError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(10),
        }
    }
}

/// Read-modify-write loop: fetch a fresh copy, apply `mutate`, write it.
/// Only conflicts are retried; every other error is returned immediately.
pub async fn update_with_retry<K, G, GF, M, P, PF>(
    policy: &RetryPolicy,
    mut get: G,
    mut mutate: M,
    mut put: P,
) -> Result<K, RepositoryError>
where
    G: FnMut() -> GF,
    GF: Future<Output = Result<K, RepositoryError>>,
    M: FnMut(&mut K),
    P: FnMut(K) -> PF,
    PF: Future<Output = Result<K, RepositoryError>>,
{
    let mut attempt = 1;
    loop {
        let mut obj = get().await?;
        mutate(&mut obj);
        match put(obj).await {
            Err(e) if e.is_conflict() && attempt < policy.max_attempts => {
                debug!(attempt, error = %e, "write conflict; retrying on fresh copy");
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            res => return res,
        }
    }
}

/// [`update_with_retry`] bound to a repository's get and status write.
pub async fn update_status_with_retry<K, R, M>(
    repo: &R,
    name: &str,
    policy: &RetryPolicy,
    mutate: M,
) -> Result<K, RepositoryError>
where
    K: Send + Sync + 'static,
    R: ResourceRepository<K> + ?Sized,
    M: FnMut(&mut K),
{
    update_with_retry(
        policy,
        move || repo.get(name),
        mutate,
        move |obj: K| async move { repo.update_status(&obj).await },
    )
    .await
}
