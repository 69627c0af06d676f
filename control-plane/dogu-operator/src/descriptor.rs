//! Static dependency metadata of an installed dogu version and the seam
//! through which it is looked up.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DoguDescriptor {
    /// Namespaced name, e.g. "official/redmine"
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub optional_dependencies: Vec<Dependency>,
}

/// Dependency entry of a descriptor. Unlike the descriptor itself, its keys
/// are lowercase in dogu.json.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    #[serde(default)]
    pub r#type: DependencyType,
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    #[default]
    Dogu,
    Client,
    Package,
}

impl DoguDescriptor {
    /// Name without the dogu namespace ("official/redmine" -> "redmine").
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

impl Dependency {
    pub fn dogu(name: impl Into<String>) -> Self {
        Self {
            r#type: DependencyType::Dogu,
            name: name.into(),
            version: String::new(),
        }
    }

    pub fn is_dogu(&self) -> bool {
        self.r#type == DependencyType::Dogu
    }
}

pub fn simple_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("dogu descriptor {0} not found in local registry")]
    NotFound(String),
    #[error("registry lookup failed: {0}")]
    Registry(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

/// Looks up descriptors of dogus installed in the local registry.
#[async_trait]
pub trait LocalDoguFetcher: Send + Sync {
    async fn fetch_installed(
        &self,
        simple_name: &str,
    ) -> Result<DoguDescriptor, FetchError>;
}
