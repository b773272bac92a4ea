//! User records exchanged between the webhook, the use-case, and the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback applied when the provider supplies no username.
pub const DEFAULT_USERNAME: &str = "default_username";

/// Fallback applied when the provider supplies no profile photo URL.
pub const DEFAULT_PHOTO_URL: &str = "default_photo_url";

/// Fields of a user record before persistence.
///
/// ## Invariants
/// - `provider_id` is the provider's opaque unique identifier and the
///   correlation key into the store; it never changes once created.
/// - `email` is always present (events without one are rejected at the
///   webhook boundary before this type is built).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub provider_id: String,
    pub email: String,
    pub username: String,
    pub photo: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    /// Build a record from raw provider fields, applying the documented
    /// fallbacks.
    ///
    /// An empty string counts as absent, matching how the provider's own
    /// SDKs treat these fields.
    pub fn from_provider_fields(
        provider_id: String,
        email: String,
        username: Option<String>,
        image_url: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        Self {
            provider_id,
            email,
            username: non_empty(username).unwrap_or_else(|| DEFAULT_USERNAME.to_owned()),
            photo: non_empty(image_url).unwrap_or_else(|| DEFAULT_PHOTO_URL.to_owned()),
            first_name: non_empty(first_name).unwrap_or_default(),
            last_name: non_empty(last_name).unwrap_or_default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// A user record as stored, including its generated internal identifier.
///
/// Serialises with camelCase field names so HTTP responses mirror the
/// persisted document layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Internal identifier generated by the store on insertion.
    pub id: String,
    pub provider_id: String,
    pub email: String,
    pub username: String,
    pub photo: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}
