use std::sync::Arc;

use k8s_openapi::api::apps::v1::Deployment;
use kube::Client;
use tracing::{error, info, warn};

use crate::config::OperatorConfig;
use crate::crd::dogu::Dogu;
use crate::events::KubeEventPublisher;
use crate::health::{
    DefaultAvailabilityChecker, DoguHealthStatusUpdater, ShutdownHandler,
    StartupHandler,
};
use crate::repository::{KubeRepository, ResourceRepository};

/// Handlers bound to the operator namespace.
pub struct LifecycleHandlers {
    pub startup: StartupHandler,
    pub shutdown: ShutdownHandler,
}

pub fn build_handlers(client: Client, cfg: &OperatorConfig) -> LifecycleHandlers {
    let retry = cfg.retry_policy();
    let dogus: Arc<dyn ResourceRepository<Dogu>> =
        Arc::new(KubeRepository::<Dogu>::namespaced(client.clone(), &cfg.namespace));
    let deployments: Arc<dyn ResourceRepository<Deployment>> = Arc::new(
        KubeRepository::<Deployment>::namespaced(client.clone(), &cfg.namespace),
    );
    let events = Arc::new(KubeEventPublisher::new(
        client,
        &cfg.reporter,
        cfg.pod_name.clone(),
    ));

    let status_updater =
        DoguHealthStatusUpdater::new(dogus.clone(), events, retry);
    LifecycleHandlers {
        startup: StartupHandler::new(
            dogus.clone(),
            deployments,
            Arc::new(DefaultAvailabilityChecker),
            status_updater,
        ),
        shutdown: ShutdownHandler::new(dogus, retry),
    }
}

/// Republish health on boot, then invalidate it once a termination signal
/// arrives. Per-dogu failures are logged; they never stop the operator.
pub async fn run(client: Client, cfg: OperatorConfig) -> anyhow::Result<()> {
    let handlers = build_handlers(client, &cfg);

    match handlers.startup.start().await {
        Ok(()) => info!("health of all dogus refreshed"),
        Err(errs) => warn!(
            failures = errs.len(),
            error = %errs,
            "startup health refresh incomplete"
        ),
    }

    shutdown_signal().await;
    info!("termination signal received; invalidating dogu health");

    if let Err(errs) = handlers.shutdown.handle().await {
        error!(failures = errs.len(), error = %errs, "failed to invalidate health of some dogus");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
