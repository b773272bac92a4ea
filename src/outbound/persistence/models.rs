//! BSON document shapes for the user collection.

use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::domain::{NewUser, User};

/// Persisted user document.
///
/// Field names stay camelCase on the wire; `_id` is absent on insert and
/// generated by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub provider_id: String,
    pub email: String,
    pub username: String,
    pub photo: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: bson::DateTime,
}

impl UserDocument {
    /// Build an insertable document from domain fields.
    pub fn from_new(user: &NewUser) -> Self {
        Self {
            id: None,
            provider_id: user.provider_id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            photo: user.photo.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: bson::DateTime::now(),
        }
    }

    /// Convert into the domain representation under the given `_id`.
    pub fn into_user(self, id: ObjectId) -> User {
        User {
            id: id.to_hex(),
            provider_id: self.provider_id,
            email: self.email,
            username: self.username,
            photo: self.photo,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: to_chrono(self.created_at),
        }
    }
}

/// BSON datetimes are millisecond precision and always within chrono's
/// representable range.
fn to_chrono(value: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> NewUser {
        NewUser::from_provider_fields(
            "u_1".into(),
            "a@b.com".into(),
            Some("ada".into()),
            None,
            Some("Ada".into()),
            Some("Lovelace".into()),
        )
    }

    #[rstest]
    fn insertable_document_has_no_id_field() {
        let document = UserDocument::from_new(&sample());
        let serialised = bson::to_document(&document).expect("document serialises");

        assert!(!serialised.contains_key("_id"));
        assert_eq!(
            serialised.get_str("providerId").expect("providerId present"),
            "u_1"
        );
        assert_eq!(
            serialised.get_str("firstName").expect("firstName present"),
            "Ada"
        );
    }

    #[rstest]
    fn round_trips_into_the_domain_user() {
        let document = UserDocument::from_new(&sample());
        let id = ObjectId::new();
        let user = document.clone().into_user(id);

        assert_eq!(user.id, id.to_hex());
        assert_eq!(user.provider_id, "u_1");
        assert_eq!(
            user.created_at.timestamp_millis(),
            document.created_at.timestamp_millis()
        );
    }
}
