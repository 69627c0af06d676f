use std::sync::Arc;

use chrono::Utc;
use kube::ResourceExt;
use tracing::{debug, instrument};

use crate::crd::dogu::{Condition, Dogu};
use crate::errors::HealthError;
use crate::repository::ResourceRepository;

/// Sets named status conditions on a dogu.
///
/// The resource is always re-read before mutation so unrelated status
/// changes written since the caller's copy was fetched are not clobbered.
/// The write itself is a single attempt; a conflict is returned to the
/// caller.
#[derive(Clone)]
pub struct DoguConditionUpdater {
    dogus: Arc<dyn ResourceRepository<Dogu>>,
}

impl DoguConditionUpdater {
    pub fn new(dogus: Arc<dyn ResourceRepository<Dogu>>) -> Self {
        Self { dogus }
    }

    pub async fn update_condition(
        &self,
        dogu: &Dogu,
        condition: Condition,
    ) -> Result<(), HealthError> {
        self.update_conditions(dogu, vec![condition]).await
    }

    #[instrument(level = "debug", skip_all, fields(dogu = %dogu.name_any()))]
    pub async fn update_conditions(
        &self,
        dogu: &Dogu,
        conditions: Vec<Condition>,
    ) -> Result<(), HealthError> {
        let name = dogu.name_any();
        let mut fresh =
            self.dogus
                .get(&name)
                .await
                .map_err(|source| HealthError::GetDogu {
                    name: name.clone(),
                    source,
                })?;

        let now = Utc::now().to_rfc3339();
        let status = fresh.status.get_or_insert_with(Default::default);
        for condition in conditions {
            debug!(type_ = %condition.type_, status = ?condition.status, "setting condition");
            status.set_condition(condition, &now);
        }

        self.dogus
            .update_status(&fresh)
            .await
            .map_err(|source| HealthError::UpdateConditions { name, source })?;
        Ok(())
    }
}
