//! Health verification of a dogu's dependency closure.
//!
//! The verifier never derives health itself. It reads `status.health` as
//! last written by each dependency's own reconcile loop, so a verdict can be
//! stale by up to one of those cycles. That trade buys a single read per
//! dependency instead of re-deriving workload state along every path.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{debug, instrument};

use crate::crd::dogu::{Dogu, HealthStatus};
use crate::descriptor::{Dependency, DoguDescriptor, LocalDoguFetcher, simple_name};
use crate::errors::{DependencyError, ErrorList, UnhealthyDependencyError};
use crate::repository::ResourceRepository;

pub struct DependencyHealthVerifier {
    fetcher: Arc<dyn LocalDoguFetcher>,
    dogus: Arc<dyn ResourceRepository<Dogu>>,
}

impl DependencyHealthVerifier {
    pub fn new(
        fetcher: Arc<dyn LocalDoguFetcher>,
        dogus: Arc<dyn ResourceRepository<Dogu>>,
    ) -> Self {
        Self { fetcher, dogus }
    }

    /// Fails unless the named dogu exists and its cached health is available.
    pub async fn check_by_name(&self, name: &str) -> Result<(), DependencyError> {
        let dogu = self.dogus.get(name).await.map_err(|source| {
            if source.is_not_found() {
                DependencyError::ResourceNotFound {
                    dogu: name.to_string(),
                }
            } else {
                DependencyError::Api {
                    dogu: name.to_string(),
                    source,
                }
            }
        })?;

        let health = dogu.health();
        if health != HealthStatus::Available {
            return Err(UnhealthyDependencyError {
                dogu: name.to_string(),
                health,
            }
            .into());
        }
        Ok(())
    }

    /// Checks only the direct dependencies of `descriptor`.
    #[instrument(skip_all, fields(dogu = %descriptor.simple_name()))]
    pub async fn check_dependencies(
        &self,
        descriptor: &DoguDescriptor,
    ) -> Result<(), ErrorList<DependencyError>> {
        let mut errs = ErrorList::new();
        let mut path = vec![descriptor.simple_name().to_string()];
        self.walk(descriptor, &mut path, &mut errs, false).await;
        errs.into_result()
    }

    /// Checks every dogu dependency reachable from `descriptor`, mandatory
    /// and optional, direct and transitive.
    ///
    /// Every branch is explored even after failures, and all problems are
    /// returned together. A dependency reachable via several paths is
    /// visited once per path. Only dependencies already on the current path
    /// are skipped, which stops dependency cycles.
    #[instrument(skip_all, fields(dogu = %descriptor.simple_name()))]
    pub async fn check_dependencies_recursive(
        &self,
        descriptor: &DoguDescriptor,
    ) -> Result<(), ErrorList<DependencyError>> {
        let mut errs = ErrorList::new();
        let mut path = vec![descriptor.simple_name().to_string()];
        self.walk(descriptor, &mut path, &mut errs, true).await;
        if !errs.is_empty() {
            debug!(failures = errs.len(), "dependency closure is not healthy");
        }
        errs.into_result()
    }

    fn walk<'a>(
        &'a self,
        descriptor: &'a DoguDescriptor,
        path: &'a mut Vec<String>,
        errs: &'a mut ErrorList<DependencyError>,
        recurse: bool,
    ) -> BoxFuture<'a, ()> {
        async move {
            let edges = descriptor
                .dependencies
                .iter()
                .map(|d| (d, false))
                .chain(descriptor.optional_dependencies.iter().map(|d| (d, true)));

            for (dependency, optional) in edges {
                let Some((name, dep_descriptor)) =
                    self.visit(dependency, optional, path, errs).await
                else {
                    continue;
                };
                if recurse {
                    path.push(name);
                    self.walk(&dep_descriptor, path, errs, true).await;
                    path.pop();
                }
            }
        }
        .boxed()
    }

    /// Applies the per-edge policy and returns the looked-up name with the
    /// dependency's descriptor when the traversal should continue below it.
    async fn visit(
        &self,
        dependency: &Dependency,
        optional: bool,
        path: &[String],
        errs: &mut ErrorList<DependencyError>,
    ) -> Option<(String, DoguDescriptor)> {
        if !dependency.is_dogu() {
            return None;
        }
        let name = simple_name(&dependency.name);
        if path.iter().any(|p| p == name) {
            debug!(dependency = %name, "dependency cycle; not descending again");
            return None;
        }

        let dep_descriptor = match self.fetcher.fetch_installed(name).await {
            Ok(d) => d,
            Err(e) if optional && e.is_not_found() => {
                debug!(dependency = %name, "optional dependency is not installed");
                return None;
            }
            Err(source) => {
                errs.push(DependencyError::DescriptorLookup {
                    dogu: name.to_string(),
                    source,
                });
                return None;
            }
        };

        // Descend even when this node is unhealthy so deeper problems are
        // reported in the same pass.
        if let Err(e) = self.check_by_name(name).await {
            debug!(dependency = %name, error = %e, "dependency check failed");
            errs.push(e);
        }
        Some((name.to_string(), dep_descriptor))
    }
}
