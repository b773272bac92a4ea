//! Account-provisioning use-case.
//!
//! Orchestrates the two side effects of a `user.created` event: one
//! insert into the user store, then one metadata write-back to the
//! identity provider. Keeps the webhook handler transport-only.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::domain::ports::{
    IdentityProvider, IdentityProviderError, UserPersistenceError, UserRepository,
};
use crate::domain::{NewUser, User};

/// Retry policy for the metadata write-back.
///
/// There is no rollback of the stored user when the write-back fails;
/// after the final attempt the orphaned pair is logged for manual
/// reconciliation and the failure surfaces to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteBackPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay between attempts.
    pub delay: Duration,
}

impl Default for WriteBackPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(200),
        }
    }
}

/// Failures surfaced by [`ProvisioningService::provision`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisioningError {
    /// The user record could not be persisted.
    #[error(transparent)]
    Persistence(#[from] UserPersistenceError),

    /// The user was stored but the provider never accepted the internal
    /// identifier. The store and the provider are now out of sync for
    /// this record.
    #[error("metadata write-back failed for provider id {provider_id}: {source}")]
    MetadataWriteBack {
        provider_id: String,
        internal_id: String,
        source: IdentityProviderError,
    },
}

/// Use-case wiring the repository and provider ports together.
pub struct ProvisioningService {
    users: Arc<dyn UserRepository>,
    provider: Arc<dyn IdentityProvider>,
    write_back: WriteBackPolicy,
}

impl ProvisioningService {
    /// Build a service with the default write-back retry policy.
    pub fn new(users: Arc<dyn UserRepository>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self::with_write_back_policy(users, provider, WriteBackPolicy::default())
    }

    /// Build a service with an explicit write-back retry policy.
    pub fn with_write_back_policy(
        users: Arc<dyn UserRepository>,
        provider: Arc<dyn IdentityProvider>,
        write_back: WriteBackPolicy,
    ) -> Self {
        Self {
            users,
            provider,
            write_back,
        }
    }

    /// Persist a user record and write its internal identifier back to
    /// the identity provider.
    ///
    /// A duplicate insert is treated as a redelivery: the already-stored
    /// record is fetched and the flow continues, so redelivered events
    /// converge on the same response instead of failing noisily.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Persistence`] when the store rejects
    /// the record, and [`ProvisioningError::MetadataWriteBack`] when the
    /// provider call still fails after the configured retries.
    pub async fn provision(&self, input: NewUser) -> Result<User, ProvisioningError> {
        let user = match self.users.create(&input).await {
            Ok(user) => user,
            Err(UserPersistenceError::Duplicate { provider_id }) => {
                warn!(%provider_id, "user already stored; treating redelivery as success");
                self.users
                    .find_by_provider_id(&provider_id)
                    .await?
                    .ok_or_else(|| UserPersistenceError::Query {
                        message: format!(
                            "store reported provider id {provider_id} as duplicate but no record was found"
                        ),
                    })?
            }
            Err(err) => return Err(err.into()),
        };

        self.write_back_internal_id(&user).await?;
        Ok(user)
    }

    async fn write_back_internal_id(&self, user: &User) -> Result<(), ProvisioningError> {
        let mut attempt = 1;
        loop {
            match self
                .provider
                .attach_internal_id(&user.provider_id, &user.id)
                .await
            {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.write_back.attempts => {
                    warn!(
                        provider_id = %user.provider_id,
                        attempt,
                        error = %err,
                        "metadata write-back failed; retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.write_back.delay).await;
                }
                Err(err) => {
                    // The record stays in the store; operators reconcile
                    // from this log line.
                    error!(
                        provider_id = %user.provider_id,
                        internal_id = %user.id,
                        error = %err,
                        "metadata write-back exhausted; provider metadata is missing the internal id"
                    );
                    return Err(ProvisioningError::MetadataWriteBack {
                        provider_id: user.provider_id.clone(),
                        internal_id: user.id.clone(),
                        source: err,
                    });
                }
            }
        }
    }
}
