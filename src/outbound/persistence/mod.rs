//! MongoDB persistence adapter for user records.

mod models;
mod mongo_user_repository;
mod store;

pub use mongo_user_repository::MongoUserRepository;
pub use store::{DocumentStore, StoreConfig, StoreError};
