use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::Client;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use tracing::debug;

pub const REASON_HEALTH_STATUS_UPDATE: &str = "HealthStatusUpdate";
pub const REASON_ERR_HEALTH_STATUS_UPDATE: &str = "ErrHealthStatusUpdate";
pub const ACTION_UPDATE_HEALTH: &str = "UpdateHealth";

/// Fire-and-forget sink for Kubernetes events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        reference: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: String,
    );
}

pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl KubeEventPublisher {
    pub fn new(client: Client, controller: &str, instance: Option<String>) -> Self {
        let reporter = Reporter {
            controller: controller.to_string(),
            instance,
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        reference: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: String,
    ) {
        if let Err(e) = self
            .recorder
            .publish(
                &Event {
                    type_,
                    reason: reason.into(),
                    note: Some(note),
                    action: action.into(),
                    secondary: None,
                },
                reference,
            )
            .await
        {
            debug!(error = %e, reason, "failed to publish event");
        }
    }
}
