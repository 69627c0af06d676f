use k8s_openapi::api::apps::v1::Deployment;

/// Replica count Kubernetes assumes when `spec.replicas` is unset.
const DEFAULT_REPLICAS: i32 = 1;

/// Decides whether a dogu's workload is serving.
pub trait AvailabilityChecker: Send + Sync {
    fn is_available(&self, deployment: &Deployment) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultAvailabilityChecker;

impl AvailabilityChecker for DefaultAvailabilityChecker {
    fn is_available(&self, deployment: &Deployment) -> bool {
        is_available(deployment)
    }
}

/// A deployment is available once the full desired replica set is rolled
/// out, no old replicas are still terminating, and every updated replica
/// reports available. Missing status counts read as zero.
pub fn is_available(deployment: &Deployment) -> bool {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(DEFAULT_REPLICAS);
    let status = deployment.status.clone().unwrap_or_default();
    let updated = status.updated_replicas.unwrap_or(0);
    let total = status.replicas.unwrap_or(0);
    let available = status.available_replicas.unwrap_or(0);

    if updated < desired {
        return false;
    }
    if total > updated {
        return false;
    }
    available >= updated
}
