//! Environment-sourced application configuration.
//!
//! All deployment-varying settings arrive as environment variables; the
//! store namespace and connect timeout are fixed by design and live with
//! the persistence adapter instead.

use std::net::SocketAddr;

use url::Url;

/// Default base URL for the identity provider's REST API.
pub const DEFAULT_PROVIDER_API_URL: &str = "https://api.clerk.com";

/// Default socket address the HTTP server binds to.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Failures raised while reading configuration at startup.
///
/// A missing signing secret or store URL is a deployment error; the
/// process refuses to start rather than failing per request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is absent or empty.
    #[error("required environment variable {name} is not set")]
    Missing { name: &'static str },

    /// An environment variable is present but cannot be parsed.
    #[error("environment variable {name} is invalid: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Application settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Signing secret used to verify inbound webhooks (`WEBHOOK_SECRET`).
    pub webhook_secret: String,
    /// Connection string for the document store (`MONGODB_URL`).
    pub mongodb_url: String,
    /// API key for the identity provider's REST API (`CLERK_SECRET_KEY`).
    pub clerk_secret_key: String,
    /// Base URL of the identity provider's REST API (`CLERK_API_URL`).
    pub clerk_api_url: Url,
    /// Address the HTTP server binds to (`BIND_ADDR`).
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let webhook_secret = required("WEBHOOK_SECRET")?;
        let mongodb_url = required("MONGODB_URL")?;
        let clerk_secret_key = required("CLERK_SECRET_KEY")?;

        let clerk_api_url = optional("CLERK_API_URL")
            .unwrap_or_else(|| DEFAULT_PROVIDER_API_URL.to_owned());
        let clerk_api_url =
            Url::parse(&clerk_api_url).map_err(|err| ConfigError::Invalid {
                name: "CLERK_API_URL",
                message: err.to_string(),
            })?;

        let bind_addr = optional("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = bind_addr.parse().map_err(|err: std::net::AddrParseError| {
            ConfigError::Invalid {
                name: "BIND_ADDR",
                message: err.to_string(),
            }
        })?;

        Ok(Self {
            webhook_secret,
            mongodb_url,
            clerk_secret_key,
            clerk_api_url,
            bind_addr,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing { name })
}

/// Treat unset and empty variables the same way; an empty secret is as
/// undeployable as a missing one.
fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
