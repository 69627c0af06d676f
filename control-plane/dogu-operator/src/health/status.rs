use std::sync::Arc;

use kube::Resource;
use kube::runtime::events::EventType;
use tracing::{info, instrument, warn};

use crate::crd::dogu::{Dogu, HealthStatus};
use crate::errors::HealthError;
use crate::events::{
    ACTION_UPDATE_HEALTH, EventPublisher, REASON_ERR_HEALTH_STATUS_UPDATE,
    REASON_HEALTH_STATUS_UPDATE,
};
use crate::repository::{ResourceRepository, RetryPolicy, update_with_retry};

/// Persists a dogu's own availability as `status.health`.
#[derive(Clone)]
pub struct DoguHealthStatusUpdater {
    dogus: Arc<dyn ResourceRepository<Dogu>>,
    events: Arc<dyn EventPublisher>,
    retry: RetryPolicy,
}

impl DoguHealthStatusUpdater {
    pub fn new(
        dogus: Arc<dyn ResourceRepository<Dogu>>,
        events: Arc<dyn EventPublisher>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            dogus,
            events,
            retry,
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn update_status(
        &self,
        name: &str,
        available: bool,
    ) -> Result<(), HealthError> {
        let dogu =
            self.dogus
                .get(name)
                .await
                .map_err(|source| HealthError::GetDogu {
                    name: name.to_string(),
                    source,
                })?;
        let reference = dogu.object_ref(&());
        let health = HealthStatus::from_available(available);

        // The first attempt writes the copy read above; only conflict
        // retries read again.
        let dogus = &*self.dogus;
        let mut fetched = Some(dogu);
        let written = update_with_retry(
            &self.retry,
            move || {
                let cached = fetched.take();
                async move {
                    match cached {
                        Some(d) => Ok(d),
                        None => dogus.get(name).await,
                    }
                }
            },
            |d: &mut Dogu| {
                d.status.get_or_insert_with(Default::default).health = health
            },
            move |d: Dogu| async move { dogus.update_status(&d).await },
        )
        .await;

        match written {
            Ok(_) => {
                info!(dogu = %name, %health, "updated dogu health");
                self.events
                    .publish(
                        &reference,
                        EventType::Normal,
                        REASON_HEALTH_STATUS_UPDATE,
                        ACTION_UPDATE_HEALTH,
                        format!("successfully updated health status to {health}"),
                    )
                    .await;
                Ok(())
            }
            Err(source) => {
                warn!(dogu = %name, %health, error = %source, "failed to update dogu health");
                self.events
                    .publish(
                        &reference,
                        EventType::Warning,
                        REASON_ERR_HEALTH_STATUS_UPDATE,
                        ACTION_UPDATE_HEALTH,
                        format!("failed to update dogu health status to {health}: {source}"),
                    )
                    .await;
                Err(HealthError::UpdateHealth {
                    name: name.to_string(),
                    health,
                    source,
                })
            }
        }
    }
}
