use std::time::Duration;

use envconfig::Envconfig;

use crate::repository::RetryPolicy;

#[derive(Envconfig, Clone, Debug)]
pub struct OperatorConfig {
    /// Namespace holding the Dogu resources and their Deployments.
    /// Env: NAMESPACE
    #[envconfig(from = "NAMESPACE", default = "ecosystem")]
    pub namespace: String,

    /// Controller name reported on emitted events.
    /// Env: DOGU_OPERATOR_REPORTER
    #[envconfig(from = "DOGU_OPERATOR_REPORTER", default = "k8s-dogu-operator")]
    pub reporter: String,

    /// Reporting instance on emitted events, usually injected via the downward API.
    /// Env: POD_NAME
    #[envconfig(from = "POD_NAME")]
    pub pod_name: Option<String>,

    #[envconfig(nested)]
    pub conflict_retry: ConflictRetryConfig,
}

#[derive(Envconfig, Clone, Debug)]
pub struct ConflictRetryConfig {
    /// Total write attempts for a status update that keeps hitting 409 Conflict.
    #[envconfig(from = "DOGU_OPERATOR_CONFLICT_RETRY_ATTEMPTS", default = "5")]
    pub attempts: u32,
    #[envconfig(
        from = "DOGU_OPERATOR_CONFLICT_RETRY_BACKOFF_MS",
        default = "10"
    )]
    pub backoff_ms: u64,
}

impl OperatorConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            // zero attempts would never write anything
            max_attempts: self.conflict_retry.attempts.max(1),
            backoff: Duration::from_millis(self.conflict_retry.backoff_ms),
        }
    }
}
