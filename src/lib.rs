//! Identity-sync bridge between an external identity provider and a
//! document store.
//!
//! The provider emits a signed webhook when a user account is created.
//! This service verifies the event, maps it into an internal user record,
//! persists it, and writes the generated internal identifier back into the
//! provider's user metadata.
//!
//! The crate is laid out hexagonally:
//! - [`domain`] holds the user records, the provisioning use-case, and the
//!   ports the use-case depends on.
//! - [`inbound`] adapts HTTP requests (the webhook endpoint and health
//!   probes) onto the domain.
//! - [`outbound`] implements the ports against MongoDB and the provider's
//!   REST API.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

pub use middleware::trace::Trace;
