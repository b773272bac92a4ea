//! Mapping from webhook processing failures to HTTP responses.
//!
//! The webhook endpoint answers failures with a status code and a plain
//! text message; logging is the only richer diagnostic channel. Nothing
//! propagates past this boundary.

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::ProvisioningError;
use crate::inbound::http::signature::SignatureError;

/// Failures terminating a webhook request.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// One of the required signature headers is absent.
    #[error("missing {name} header")]
    MissingHeader { name: &'static str },

    /// The delivery failed signature verification.
    #[error("webhook verification failed")]
    Verification(#[from] SignatureError),

    /// The verified body is not a well-formed event envelope, or a
    /// required field is absent.
    #[error("invalid webhook payload: {message}")]
    InvalidPayload { message: String },

    /// A `user.created` event arrived without any email address.
    #[error("no email addresses")]
    MissingEmail,

    /// Provisioning failed after the event was accepted.
    #[error("failed to create user")]
    Provisioning(#[from] ProvisioningError),
}

impl WebhookError {
    /// Create an invalid-payload error with the given message.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }
}

impl ResponseError for WebhookError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingHeader { .. }
            | Self::Verification(_)
            | Self::InvalidPayload { .. }
            | Self::MissingEmail => StatusCode::BAD_REQUEST,
            Self::Provisioning(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }
}
