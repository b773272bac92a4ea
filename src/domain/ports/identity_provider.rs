//! Port abstraction for the identity provider's management API.

use async_trait::async_trait;

/// Failures raised by identity provider adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityProviderError {
    /// The request never produced an HTTP response.
    #[error("identity provider request failed: {message}")]
    Transport { message: String },

    /// The provider answered with a non-success status.
    #[error("identity provider returned status {status}: {message}")]
    Status { status: u16, message: String },
}

impl IdentityProviderError {
    /// Create a transport error with the given message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a status error for a non-success response.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

/// Outbound calls into the identity provider's user-management API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Attach the internal identifier to the provider's user record,
    /// keyed by the provider's own id, under the public-metadata
    /// namespace.
    async fn attach_internal_id(
        &self,
        provider_id: &str,
        internal_id: &str,
    ) -> Result<(), IdentityProviderError>;
}
