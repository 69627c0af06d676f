use std::sync::Arc;

use chrono::Utc;
use kube::ResourceExt;
use tracing::{error, info, instrument};

use crate::crd::dogu::{
    CONDITION_HEALTHY, CONDITION_MEETS_MIN_VOLUME_SIZE, CONDITION_READY,
    CONDITION_SUPPORT_MODE, Condition, ConditionStatus, Dogu, HealthStatus,
};
use crate::errors::{ErrorList, HealthError};
use crate::repository::{ResourceRepository, RetryPolicy, update_status_with_retry};

pub const REASON_STOPPING_OPERATOR: &str = "StoppingOperator";
pub const MESSAGE_STOPPING_OPERATOR: &str =
    "The operator is stopping and cannot observe the dogu; the state of this condition is unknown.";

/// Conditions the operator owns and therefore invalidates when it stops.
pub const INVALIDATED_CONDITIONS: [&str; 4] = [
    CONDITION_READY,
    CONDITION_HEALTHY,
    CONDITION_SUPPORT_MODE,
    CONDITION_MEETS_MIN_VOLUME_SIZE,
];

/// Marks health and operator-owned conditions of every dogu as unknown, so
/// nobody trusts values that no control loop is keeping current.
pub struct ShutdownHandler {
    dogus: Arc<dyn ResourceRepository<Dogu>>,
    retry: RetryPolicy,
}

impl ShutdownHandler {
    pub fn new(
        dogus: Arc<dyn ResourceRepository<Dogu>>,
        retry: RetryPolicy,
    ) -> Self {
        Self { dogus, retry }
    }

    #[instrument(skip_all)]
    pub async fn handle(&self) -> Result<(), ErrorList<HealthError>> {
        let dogus = self.dogus.list().await.map_err(|e| {
            ErrorList::from_iter([HealthError::ListDogus(e)])
        })?;
        info!(count = dogus.len(), "invalidating health of all dogus");

        let mut errs = ErrorList::new();
        for dogu in &dogus {
            let name = dogu.name_any();
            let now = Utc::now().to_rfc3339();
            let res = update_status_with_retry(
                &*self.dogus,
                &name,
                &self.retry,
                |d: &mut Dogu| invalidate(d, &now),
            )
            .await;
            if let Err(source) = res {
                error!(dogu = %name, error = %source, "failed to invalidate dogu health");
                errs.push(HealthError::InvalidateHealth { name, source });
            }
        }

        errs.into_result()
    }
}

fn invalidate(dogu: &mut Dogu, now: &str) {
    let status = dogu.status.get_or_insert_with(Default::default);
    status.health = HealthStatus::Unknown;
    for type_ in INVALIDATED_CONDITIONS {
        status.set_condition(
            Condition::new(
                type_,
                ConditionStatus::Unknown,
                REASON_STOPPING_OPERATOR,
                MESSAGE_STOPPING_OPERATOR,
            ),
            now,
        );
    }
}
