use std::fmt::Debug;

use async_trait::async_trait;
use kube::api::{Api, ListParams, PostParams};
use kube::core::NamespaceResourceScope;
use kube::{Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{RepositoryError, ResourceRepository};

/// [`ResourceRepository`] backed by a namespaced `kube::Api`.
pub struct KubeRepository<K> {
    api: Api<K>,
}

impl<K> KubeRepository<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    pub fn namespaced(client: Client, ns: &str) -> Self {
        Self {
            api: Api::namespaced(client, ns),
        }
    }
}

impl<K> KubeRepository<K>
where
    K: Resource,
    <K as Resource>::DynamicType: Default,
{
    fn classify(name: &str, err: kube::Error) -> RepositoryError {
        let kind = K::kind(&Default::default()).to_string();
        match err {
            kube::Error::Api(ref resp) if resp.code == 404 => {
                RepositoryError::NotFound {
                    kind,
                    name: name.to_string(),
                }
            }
            kube::Error::Api(ref resp) if resp.code == 409 => {
                RepositoryError::Conflict {
                    kind,
                    name: name.to_string(),
                }
            }
            other => RepositoryError::Kube(other),
        }
    }
}

#[async_trait]
impl<K> ResourceRepository<K> for KubeRepository<K>
where
    K: Resource
        + Clone
        + DeserializeOwned
        + Serialize
        + Debug
        + Send
        + Sync
        + 'static,
    <K as Resource>::DynamicType: Default,
{
    async fn get(&self, name: &str) -> Result<K, RepositoryError> {
        self.api
            .get(name)
            .await
            .map_err(|e| Self::classify(name, e))
    }

    async fn list(&self) -> Result<Vec<K>, RepositoryError> {
        self.api
            .list(&ListParams::default())
            .await
            .map(|list| list.items)
            .map_err(|e| Self::classify("", e))
    }

    async fn update_status(&self, obj: &K) -> Result<K, RepositoryError> {
        let name = obj.name_any();
        let data = serde_json::to_vec(obj)?;
        self.api
            .replace_status(&name, &PostParams::default(), data)
            .await
            .map_err(|e| Self::classify(&name, e))
    }
}
