//! Outbound adapters implementing the domain ports against real
//! infrastructure.

pub mod persistence;
pub mod provider;
