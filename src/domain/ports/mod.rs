//! Ports the provisioning use-case depends on.
//!
//! Outbound adapters implement these traits; tests substitute the
//! generated mocks.

mod identity_provider;
mod user_repository;

pub use identity_provider::{IdentityProvider, IdentityProviderError};
pub use user_repository::{UserPersistenceError, UserRepository};

#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
#[cfg(test)]
pub use user_repository::MockUserRepository;
