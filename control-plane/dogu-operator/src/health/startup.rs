use std::sync::Arc;

use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;
use tracing::{info, instrument, warn};

use super::availability::AvailabilityChecker;
use super::status::DoguHealthStatusUpdater;
use crate::crd::dogu::{Dogu, HealthStatus};
use crate::errors::{ErrorList, HealthError};
use crate::repository::ResourceRepository;

/// Boot-time catch-up: health changes that happened while no operator was
/// running are republished for every dogu.
pub struct StartupHandler {
    dogus: Arc<dyn ResourceRepository<Dogu>>,
    deployments: Arc<dyn ResourceRepository<Deployment>>,
    availability: Arc<dyn AvailabilityChecker>,
    status_updater: DoguHealthStatusUpdater,
}

/// A dogu's Deployment carries the dogu's resource name.
pub fn workload_name(dogu: &Dogu) -> String {
    dogu.name_any()
}

impl StartupHandler {
    pub fn new(
        dogus: Arc<dyn ResourceRepository<Dogu>>,
        deployments: Arc<dyn ResourceRepository<Deployment>>,
        availability: Arc<dyn AvailabilityChecker>,
        status_updater: DoguHealthStatusUpdater,
    ) -> Self {
        Self {
            dogus,
            deployments,
            availability,
            status_updater,
        }
    }

    /// Refresh the health of every dogu. A dogu whose Deployment cannot be
    /// read is published as unavailable; the read failure is still reported.
    #[instrument(skip_all)]
    pub async fn start(&self) -> Result<(), ErrorList<HealthError>> {
        let dogus = self.dogus.list().await.map_err(|e| {
            ErrorList::from_iter([HealthError::ListDogus(e)])
        })?;
        info!(count = dogus.len(), "refreshing health of all dogus");

        let mut errs = ErrorList::new();
        for dogu in &dogus {
            let name = dogu.name_any();
            let available = match self.deployments.get(&workload_name(dogu)).await {
                Ok(deployment) => self.availability.is_available(&deployment),
                Err(source) => {
                    warn!(
                        dogu = %name,
                        error = %source,
                        "failed to get deployment; assuming unavailable"
                    );
                    errs.push(HealthError::GetWorkload {
                        name: name.clone(),
                        source,
                    });
                    false
                }
            };

            info!(
                dogu = %name,
                health = %HealthStatus::from_available(available),
                "publishing dogu health"
            );
            if let Err(e) = self.status_updater.update_status(&name, available).await {
                errs.push(e);
            }
        }

        errs.into_result()
    }
}
