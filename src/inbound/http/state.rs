//! Shared HTTP adapter state.
//!
//! Handlers receive this bundle via `actix_web::web::Data`, so they only
//! depend on the use-case and the verifier and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ProvisioningService;
use crate::inbound::http::signature::WebhookVerifier;

/// Dependency bundle for the webhook handler.
#[derive(Clone)]
pub struct HttpState {
    pub provisioning: Arc<ProvisioningService>,
    pub verifier: Arc<WebhookVerifier>,
}

impl HttpState {
    /// Bundle the webhook dependencies.
    pub fn new(provisioning: Arc<ProvisioningService>, verifier: Arc<WebhookVerifier>) -> Self {
        Self {
            provisioning,
            verifier,
        }
    }
}
