use std::fmt;

use thiserror::Error;

use crate::crd::dogu::HealthStatus;
use crate::descriptor::FetchError;
use crate::repository::RepositoryError;

/// Failures of the components that write dogu health and conditions.
#[derive(Error, Debug)]
pub enum HealthError {
    #[error("failed to list dogu resources: {0}")]
    ListDogus(#[source] RepositoryError),

    #[error("failed to get dogu resource {name}: {source}")]
    GetDogu {
        name: String,
        #[source]
        source: RepositoryError,
    },

    #[error("failed to get deployment of dogu {name}: {source}")]
    GetWorkload {
        name: String,
        #[source]
        source: RepositoryError,
    },

    #[error("failed to update dogu {name} with health status {health}: {source}")]
    UpdateHealth {
        name: String,
        health: HealthStatus,
        #[source]
        source: RepositoryError,
    },

    #[error("failed to update conditions of dogu {name}: {source}")]
    UpdateConditions {
        name: String,
        #[source]
        source: RepositoryError,
    },

    #[error("failed to invalidate health of dogu {name}: {source}")]
    InvalidateHealth {
        name: String,
        #[source]
        source: RepositoryError,
    },
}

impl HealthError {
    /// Name of the dogu this failure belongs to, if any.
    pub fn dogu(&self) -> Option<&str> {
        match self {
            HealthError::ListDogus(_) => None,
            HealthError::GetDogu { name, .. }
            | HealthError::GetWorkload { name, .. }
            | HealthError::UpdateHealth { name, .. }
            | HealthError::UpdateConditions { name, .. }
            | HealthError::InvalidateHealth { name, .. } => Some(name),
        }
    }
}

/// A dependency's resource exists but its cached health is not `available`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("dogu {dogu} appears unhealthy (health: {health})")]
pub struct UnhealthyDependencyError {
    pub dogu: String,
    pub health: HealthStatus,
}

/// One independent problem found while verifying a dependency closure.
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("registry lookup failed for {dogu}: {source}")]
    DescriptorLookup {
        dogu: String,
        #[source]
        source: FetchError,
    },

    #[error("dogu {dogu} resource not found")]
    ResourceNotFound { dogu: String },

    #[error(transparent)]
    Unhealthy(#[from] UnhealthyDependencyError),

    #[error("failed to get dogu resource {dogu}: {source}")]
    Api {
        dogu: String,
        #[source]
        source: RepositoryError,
    },
}

impl DependencyError {
    pub fn dogu(&self) -> &str {
        match self {
            DependencyError::DescriptorLookup { dogu, .. }
            | DependencyError::ResourceNotFound { dogu }
            | DependencyError::Api { dogu, .. } => dogu,
            DependencyError::Unhealthy(e) => &e.dogu,
        }
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, DependencyError::Unhealthy(_))
    }
}

/// Independent failures collected instead of stopping at the first one.
#[derive(Debug)]
pub struct ErrorList<E>(Vec<E>);

impl<E> ErrorList<E> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, err: E) {
        self.0.push(err);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<E> {
        self.0
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl<E> Default for ErrorList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Display> fmt::Display for ErrorList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for ErrorList<E> {}

impl<E> Extend<E> for ErrorList<E> {
    fn extend<T: IntoIterator<Item = E>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl<E> FromIterator<E> for ErrorList<E> {
    fn from_iter<T: IntoIterator<Item = E>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<E> IntoIterator for ErrorList<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a ErrorList<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
