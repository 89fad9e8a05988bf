use std::net::SocketAddr;

use admission_core::{
    admission_request::GroupVersionResource,
    mutating::{DEFAULT_CPU_LIMIT, DEFAULT_MEMORY_LIMIT},
    validating::DEFAULT_ALLOWED_REGISTRY,
};
use admission_webhook::{
    WebhookServer,
    config::{Config, Webhooks},
};
use axum::Router;

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        tls_config: None,
        webhooks: Webhooks::All,
        target_resource: GroupVersionResource::pods(),
        allowed_registry: DEFAULT_ALLOWED_REGISTRY.to_owned(),
        default_cpu_limit: DEFAULT_CPU_LIMIT.to_owned(),
        default_memory_limit: DEFAULT_MEMORY_LIMIT.to_owned(),
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) async fn app(config: Config) -> Router {
    let server = WebhookServer::new_from_config(config).await.unwrap();

    server.router()
}
