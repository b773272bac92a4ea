//! HTTP inbound adapter: the webhook endpoint and operational probes.

pub mod error;
pub mod health;
pub mod signature;
pub mod state;
pub mod webhooks;

use actix_web::web;

pub use error::WebhookError;
pub use state::HttpState;

/// Register every HTTP route this service exposes.
///
/// Callers attach the shared [`HttpState`] and
/// [`health::HealthState`](health::HealthState) via `app_data` before
/// calling this.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(webhooks::clerk_webhook)
        .service(web::scope("/healthz").service(health::live).service(health::ready));
}
