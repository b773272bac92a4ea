//! Domain records, ports, and the provisioning use-case.
//!
//! Types here are transport and storage agnostic. Inbound adapters map
//! webhook payloads into [`NewUser`]; outbound adapters implement the
//! [`ports`] against concrete infrastructure.

pub mod ports;
pub mod provisioning;
pub mod user;

pub use provisioning::{ProvisioningError, ProvisioningService, WriteBackPolicy};
pub use user::{NewUser, User, DEFAULT_PHOTO_URL, DEFAULT_USERNAME};
