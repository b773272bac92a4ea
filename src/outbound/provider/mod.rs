//! Identity provider adapter for the metadata write-back.

mod clerk;

pub use clerk::ClerkClient;
