//! Reqwest-backed adapter for Clerk's user-management API.
//!
//! This adapter owns transport details only: endpoint construction,
//! authentication, timeout, and HTTP error mapping.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::json;

use crate::domain::ports::{IdentityProvider, IdentityProviderError};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of an error response body to carry into error messages.
const ERROR_BODY_LIMIT: usize = 256;

/// Client for the provider's REST API, holding the management secret.
pub struct ClerkClient {
    http: Client,
    base: Url,
    secret_key: String,
}

impl ClerkClient {
    /// Build a client with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be
    /// constructed.
    pub fn new(base: Url, secret_key: String) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base, secret_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be
    /// constructed.
    pub fn with_timeout(
        base: Url,
        secret_key: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base,
            secret_key,
        })
    }
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn attach_internal_id(
        &self,
        provider_id: &str,
        internal_id: &str,
    ) -> Result<(), IdentityProviderError> {
        let endpoint = metadata_endpoint(&self.base, provider_id)
            .map_err(|err| IdentityProviderError::transport(err.to_string()))?;

        let response = self
            .http
            .patch(endpoint)
            .bearer_auth(&self.secret_key)
            .json(&json!({
                "public_metadata": { "userId": internal_id }
            }))
            .send()
            .await
            .map_err(|err| IdentityProviderError::transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityProviderError::status(
                status.as_u16(),
                truncate(&body, ERROR_BODY_LIMIT),
            ));
        }
        Ok(())
    }
}

fn metadata_endpoint(base: &Url, provider_id: &str) -> Result<Url, url::ParseError> {
    base.join(&format!("v1/users/{provider_id}/metadata"))
}

fn truncate(body: &str, limit: usize) -> String {
    let mut out: String = body.chars().take(limit).collect();
    if body.chars().count() > limit {
        out.push_str("...");
    }
    out
}
