//! Lazily established, process-wide MongoDB handle.
//!
//! The store is constructed without I/O; the first call to
//! [`DocumentStore::database`] establishes the connection, concurrent
//! callers during establishment await the same in-flight attempt, and
//! every later call returns the cached handle for the process lifetime.
//! There is no retry or backoff: a failed attempt propagates to the
//! caller, and the next caller starts a fresh attempt.
//!
//! The driver dispatches commands immediately rather than buffering them
//! while disconnected, so no explicit buffering switch exists here.

use std::time::Duration;

use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tokio::sync::OnceCell;

/// Fixed target namespace for persisted user records.
pub const DEFAULT_DATABASE: &str = "clerkauth";

/// Fixed timeout for establishing the initial connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while establishing the store connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The connection string or client options are invalid.
    #[error("invalid store configuration: {message}")]
    Configuration { message: String },

    /// The connection could not be established.
    #[error("failed to connect to the document store: {message}")]
    Connect { message: String },
}

impl StoreError {
    /// Create a configuration error with the given message.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error with the given message.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }
}

/// Configuration for the document store connection.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    url: String,
    database: String,
    connect_timeout: Duration,
}

impl StoreConfig {
    /// Create a configuration with the fixed defaults: namespace
    /// `clerkauth` and a 30 second connect timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: DEFAULT_DATABASE.to_owned(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the target namespace.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Override the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Get the connection string.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Lazily connected handle to the document store.
///
/// Construct one in `main` and share it via `Arc`; repositories borrow
/// the cached [`Database`] through [`DocumentStore::database`].
pub struct DocumentStore {
    config: StoreConfig,
    handle: OnceCell<Database>,
}

impl DocumentStore {
    /// Create a store handle without performing any I/O.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            handle: OnceCell::new(),
        }
    }

    /// Return the shared database handle, establishing the connection on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the connection string is invalid or
    /// the connection attempt fails; the failure propagates without
    /// retry.
    pub async fn database(&self) -> Result<&Database, StoreError> {
        self.handle
            .get_or_try_init(|| async {
                let mut options = ClientOptions::parse(&self.config.url)
                    .await
                    .map_err(|err| StoreError::configuration(err.to_string()))?;
                options.connect_timeout = Some(self.config.connect_timeout);
                options.server_selection_timeout = Some(self.config.connect_timeout);

                let client = Client::with_options(options)
                    .map_err(|err| StoreError::connect(err.to_string()))?;
                Ok(client.database(&self.config.database))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn config_defaults_are_fixed() {
        let config = StoreConfig::new("mongodb://localhost:27017");

        assert_eq!(config.url(), "mongodb://localhost:27017");
        assert_eq!(config.database, DEFAULT_DATABASE);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[rstest]
    fn config_overrides_apply() {
        let config = StoreConfig::new("mongodb://localhost:27017")
            .with_database("other")
            .with_connect_timeout(Duration::from_secs(5));

        assert_eq!(config.database, "other");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[rstest]
    fn error_display_carries_the_message() {
        assert!(StoreError::configuration("bad scheme")
            .to_string()
            .contains("bad scheme"));
        assert!(StoreError::connect("refused").to_string().contains("refused"));
    }

    #[rstest]
    #[actix_web::test]
    async fn invalid_connection_string_surfaces_a_configuration_error() {
        let store = DocumentStore::new(StoreConfig::new("not-a-mongodb-url"));
        let err = store.database().await.expect_err("parse must fail");
        assert!(matches!(err, StoreError::Configuration { .. }));
    }
}
