//! Service entry-point: wires the webhook endpoint, health probes, and
//! the outbound adapters.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use identity_bridge::config::AppConfig;
use identity_bridge::domain::ProvisioningService;
use identity_bridge::inbound::http::health::HealthState;
use identity_bridge::inbound::http::signature::WebhookVerifier;
use identity_bridge::inbound::http::{self, HttpState};
use identity_bridge::outbound::persistence::{DocumentStore, MongoUserRepository, StoreConfig};
use identity_bridge::outbound::provider::ClerkClient;
use identity_bridge::Trace;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    let verifier =
        WebhookVerifier::new(&config.webhook_secret).map_err(std::io::Error::other)?;

    // The store performs no I/O here; the first webhook triggers the
    // connection attempt.
    let store = Arc::new(DocumentStore::new(StoreConfig::new(&config.mongodb_url)));
    let users = Arc::new(MongoUserRepository::new(store));
    let provider = Arc::new(
        ClerkClient::new(config.clerk_api_url.clone(), config.clerk_secret_key.clone())
            .map_err(std::io::Error::other)?,
    );
    let provisioning = Arc::new(ProvisioningService::new(users, provider));
    let state = HttpState::new(provisioning, Arc::new(verifier));

    let health_state = web::Data::new(HealthState::new());
    // Clone for the server factory so the readiness flip below still
    // reaches the shared state.
    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Trace)
            .app_data(web::Data::new(state.clone()))
            .app_data(server_health_state.clone())
            .configure(http::configure)
    })
    .bind(config.bind_addr)?;

    health_state.mark_ready();
    server.run().await
}
