mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod tracing;

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use ::tracing::{info, warn};
use admission_core::{
    envelope::{CONTENT_TYPE_JSON, EnvelopeCodec},
    mutating::DefaultLimitsMutator,
    validating::ImageRegistryPolicy,
};
use anyhow::{Result, anyhow};
use axum::{
    Router,
    routing::{get, post},
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use tokio::signal;
use tower_http::trace::{self, TraceLayer};

use crate::api::{
    handlers::{mutate_handler, readiness_handler, validate_handler},
    state::ApiServerState,
};
use crate::config::Config;

const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

pub struct WebhookServer {
    router: Router,
    tls_config: Option<RustlsConfig>,
    addr: SocketAddr,
}

impl WebhookServer {
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let codec = EnvelopeCodec::new(CONTENT_TYPE_JSON, config.target_resource.clone())
            .ok_or_else(|| {
                anyhow!(
                    "resource {} does not embed a pod spec",
                    config.target_resource
                )
            })?;
        let image_registry_policy = ImageRegistryPolicy::new(&config.allowed_registry);
        info!(
            webhooks = %config.webhooks,
            resource = %codec.target(),
            allowed_registry = image_registry_policy.allowed_registry(),
            cpu_limit = config.default_cpu_limit.as_str(),
            memory_limit = config.default_memory_limit.as_str(),
            "webhook server configured"
        );

        let state = Arc::new(ApiServerState {
            codec,
            image_registry_policy,
            default_limits_mutator: DefaultLimitsMutator::new(
                &config.default_cpu_limit,
                &config.default_memory_limit,
            ),
        });

        let mut router = Router::new().route("/readiness", get(readiness_handler));
        if config.webhooks.validate() {
            router = router.route("/validate", post(validate_handler));
        }
        if config.webhooks.mutate() {
            router = router.route("/mutate", post(mutate_handler));
        }
        let router = router.with_state(state).layer(
            TraceLayer::new_for_http()
                .on_request(trace::DefaultOnRequest::new().level(::tracing::Level::DEBUG))
                .on_response(trace::DefaultOnResponse::new().level(::tracing::Level::DEBUG)),
        );

        let tls_config = match &config.tls_config {
            Some(tls_config) => Some(certs::load_tls_config(tls_config).await?),
            None => None,
        };

        Ok(Self {
            router,
            tls_config,
            addr: config.addr,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` completes, then stop accepting connections and
    /// give in-flight exchanges up to the grace period to finish.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown.await;
            info!("shutdown signal received, draining in-flight requests");
            drain.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
        });

        match self.tls_config {
            Some(tls_config) => {
                info!(address = %self.addr, tls = true, "started HTTPS server");
                axum_server::bind_rustls(self.addr, tls_config)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                info!(address = %self.addr, tls = false, "started HTTP server");
                axum_server::bind(self.addr)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
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

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sigterm_completes_the_shutdown_signal() {
        let shutdown = tokio::spawn(shutdown_signal());
        // let the task install its signal handlers
        tokio::time::sleep(Duration::from_millis(200)).await;

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), shutdown)
            .await
            .expect("SIGTERM should trigger the shutdown")
            .unwrap();
    }
}
