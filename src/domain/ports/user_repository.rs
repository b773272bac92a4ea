//! Port abstraction for user persistence adapters and their errors.

use async_trait::async_trait;

use crate::domain::{NewUser, User};

/// Persistence errors raised by user repository adapters.
///
/// The variants are deliberately distinguishable: the HTTP layer needs to
/// tell a duplicate delivery apart from a lost connection when selecting
/// a status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserPersistenceError {
    /// A record with this provider id already exists.
    #[error("user with provider id {provider_id} already exists")]
    Duplicate { provider_id: String },

    /// Repository connection could not be established.
    #[error("user store connection failed: {message}")]
    Connection { message: String },

    /// The record was rejected by store-level validation.
    #[error("user record failed validation: {message}")]
    Validation { message: String },

    /// Query or mutation failed during execution.
    #[error("user store query failed: {message}")]
    Query { message: String },
}

impl UserPersistenceError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Write-once store of internal user records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user record and return its stored representation with
    /// the generated internal identifier attached.
    async fn create(&self, user: &NewUser) -> Result<User, UserPersistenceError>;

    /// Fetch a stored record by the provider's identifier.
    async fn find_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<User>, UserPersistenceError>;
}
