//! Inbound webhook endpoint for identity provider events.
//!
//! ```text
//! POST /api/webhooks/clerk
//! svix-id: msg_...
//! svix-timestamp: 1700000000
//! svix-signature: v1,<base64>
//! ```
//!
//! One state machine per request: require the three signature headers,
//! verify the raw body, then dispatch on the declared event type. Only
//! `user.created` triggers side effects; every other type is acknowledged
//! so the provider does not redeliver.

use actix_web::{post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::NewUser;
use crate::inbound::http::{HttpState, WebhookError};

/// Unique message id header set by the provider.
pub const HEADER_ID: &str = "svix-id";
/// Delivery timestamp header, unix seconds.
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
/// Signature header carrying one or more `v1,<base64>` entries.
pub const HEADER_SIGNATURE: &str = "svix-signature";

const USER_CREATED: &str = "user.created";

/// Event envelope shared by all provider event types.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Identity fields of a `user.created` payload.
#[derive(Debug, Deserialize)]
struct UserCreatedData {
    id: String,
    #[serde(default)]
    email_addresses: Vec<EmailAddressDto>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailAddressDto {
    email_address: String,
}

/// Handle one inbound provider event.
#[post("/api/webhooks/clerk")]
pub async fn clerk_webhook(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<HttpState>,
) -> Result<HttpResponse, WebhookError> {
    let message_id = required_header(&req, HEADER_ID)?;
    let timestamp = required_header(&req, HEADER_TIMESTAMP)?;
    let signature = required_header(&req, HEADER_SIGNATURE)?;

    state
        .verifier
        .verify(message_id, timestamp, signature, &body, Utc::now())
        .map_err(|err| {
            warn!(%message_id, error = %err, "webhook rejected");
            err
        })?;

    let envelope: EventEnvelope = serde_json::from_slice(&body)
        .map_err(|err| WebhookError::invalid_payload(err.to_string()))?;

    if envelope.kind == USER_CREATED {
        return provision_user(&state, envelope.data).await;
    }

    info!(
        event_id = envelope.data.get("id").and_then(|id| id.as_str()),
        event_type = %envelope.kind,
        body = %String::from_utf8_lossy(&body),
        "ignoring webhook event"
    );
    Ok(HttpResponse::Ok().finish())
}

async fn provision_user(
    state: &HttpState,
    data: serde_json::Value,
) -> Result<HttpResponse, WebhookError> {
    let data: UserCreatedData = serde_json::from_value(data)
        .map_err(|err| WebhookError::invalid_payload(err.to_string()))?;

    let Some(first_email) = data.email_addresses.into_iter().next() else {
        warn!(provider_id = %data.id, "user.created event carries no email address");
        return Err(WebhookError::MissingEmail);
    };

    let input = NewUser::from_provider_fields(
        data.id,
        first_email.email_address,
        data.username,
        data.image_url,
        data.first_name,
        data.last_name,
    );

    info!(provider_id = %input.provider_id, email = %input.email, "creating user");
    let user = state.provisioning.provision(input).await.map_err(|err| {
        error!(error = %err, "user provisioning failed");
        err
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "New user created",
        "user": user,
    })))
}

/// Non-UTF-8 header values are treated as absent.
fn required_header<'a>(
    req: &'a HttpRequest,
    name: &'static str,
) -> Result<&'a str, WebhookError> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or(WebhookError::MissingHeader { name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        IdentityProviderError, MockIdentityProvider, MockUserRepository, UserPersistenceError,
    };
    use crate::domain::{
        ProvisioningService, User, WriteBackPolicy, DEFAULT_PHOTO_URL, DEFAULT_USERNAME,
    };
    use crate::inbound::http::signature::{sign, WebhookVerifier};
    use actix_web::dev::ServiceResponse;
    use actix_web::{http::StatusCode, test as actix_test, App};
    use mockall::predicate::eq;
    use mockall::Sequence;
    use rstest::rstest;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;

    const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

    const CREATED_PAYLOAD: &str = r#"{
        "type": "user.created",
        "data": {
            "id": "u_1",
            "email_addresses": [{"email_address": "a@b.com"}],
            "username": null,
            "image_url": null,
            "first_name": "A",
            "last_name": "B"
        }
    }"#;

    fn stored_user() -> User {
        User {
            id: "64f000000000000000000001".into(),
            provider_id: "u_1".into(),
            email: "a@b.com".into(),
            username: DEFAULT_USERNAME.into(),
            photo: DEFAULT_PHOTO_URL.into(),
            first_name: "A".into(),
            last_name: "B".into(),
            created_at: Utc::now(),
        }
    }

    fn state_with(users: MockUserRepository, provider: MockIdentityProvider) -> HttpState {
        let service = ProvisioningService::with_write_back_policy(
            Arc::new(users),
            Arc::new(provider),
            WriteBackPolicy {
                attempts: 1,
                delay: Duration::ZERO,
            },
        );
        HttpState::new(
            Arc::new(service),
            Arc::new(WebhookVerifier::new(SECRET).expect("test secret decodes")),
        )
    }

    fn idle_mocks() -> (MockUserRepository, MockIdentityProvider) {
        let mut users = MockUserRepository::new();
        users.expect_create().never();
        users.expect_find_by_provider_id().never();
        let mut provider = MockIdentityProvider::new();
        provider.expect_attach_internal_id().never();
        (users, provider)
    }

    fn signed_headers(body: &str) -> Vec<(&'static str, String)> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(SECRET, "msg_1", &timestamp, body.as_bytes());
        vec![
            (HEADER_ID, "msg_1".to_owned()),
            (HEADER_TIMESTAMP, timestamp),
            (HEADER_SIGNATURE, signature),
        ]
    }

    async fn deliver(state: HttpState, body: &str, headers: Vec<(&'static str, String)>) -> ServiceResponse {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(clerk_webhook),
        )
        .await;

        let mut request = actix_test::TestRequest::post().uri("/api/webhooks/clerk");
        for (name, value) in headers {
            request = request.insert_header((name, value));
        }
        actix_test::call_service(&app, request.set_payload(body.to_owned()).to_request()).await
    }

    #[rstest]
    #[case(HEADER_ID)]
    #[case(HEADER_TIMESTAMP)]
    #[case(HEADER_SIGNATURE)]
    #[actix_web::test]
    async fn missing_signature_header_is_rejected_without_persistence(
        #[case] dropped: &'static str,
    ) {
        let (users, provider) = idle_mocks();
        let headers = signed_headers(CREATED_PAYLOAD)
            .into_iter()
            .filter(|(name, _)| *name != dropped)
            .collect();

        let response = deliver(state_with(users, provider), CREATED_PAYLOAD, headers).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn bad_signature_is_rejected_without_persistence() {
        let (users, provider) = idle_mocks();
        let mut headers = signed_headers(CREATED_PAYLOAD);
        headers[2].1 = "v1,AAAAAAAA".to_owned();

        let response = deliver(state_with(users, provider), CREATED_PAYLOAD, headers).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn stale_timestamp_is_rejected_without_persistence() {
        let (users, provider) = idle_mocks();
        let timestamp = (Utc::now().timestamp() - 3600).to_string();
        let signature = sign(SECRET, "msg_1", &timestamp, CREATED_PAYLOAD.as_bytes());
        let headers = vec![
            (HEADER_ID, "msg_1".to_owned()),
            (HEADER_TIMESTAMP, timestamp),
            (HEADER_SIGNATURE, signature),
        ];

        let response = deliver(state_with(users, provider), CREATED_PAYLOAD, headers).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn created_event_maps_fields_and_responds_with_the_user() {
        let expected_input = NewUser {
            provider_id: "u_1".into(),
            email: "a@b.com".into(),
            username: DEFAULT_USERNAME.into(),
            photo: DEFAULT_PHOTO_URL.into(),
            first_name: "A".into(),
            last_name: "B".into(),
        };
        let user = stored_user();
        let mut sequence = Sequence::new();

        let mut users = MockUserRepository::new();
        let created = user.clone();
        users
            .expect_create()
            .with(eq(expected_input))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_| Ok(created.clone()));

        let mut provider = MockIdentityProvider::new();
        provider
            .expect_attach_internal_id()
            .with(eq("u_1"), eq("64f000000000000000000001"))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(()));

        let headers = signed_headers(CREATED_PAYLOAD);
        let response = deliver(state_with(users, provider), CREATED_PAYLOAD, headers).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("JSON body");
        assert_eq!(body["message"], "New user created");
        assert_eq!(body["user"]["providerId"], "u_1");
        assert_eq!(body["user"]["email"], "a@b.com");
        assert_eq!(body["user"]["username"], DEFAULT_USERNAME);
        assert_eq!(body["user"]["photo"], DEFAULT_PHOTO_URL);
        assert_eq!(body["user"]["firstName"], "A");
        assert_eq!(body["user"]["lastName"], "B");
    }

    #[rstest]
    #[case::empty_list(r#"{"type":"user.created","data":{"id":"u_1","email_addresses":[]}}"#)]
    #[case::absent_list(r#"{"type":"user.created","data":{"id":"u_1"}}"#)]
    #[actix_web::test]
    async fn created_event_without_email_is_rejected(#[case] payload: &str) {
        let (users, provider) = idle_mocks();
        let headers = signed_headers(payload);

        let response = deliver(state_with(users, provider), payload, headers).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = actix_test::read_body(response).await;
        assert_eq!(body, "no email addresses".as_bytes());
    }

    #[rstest]
    #[actix_web::test]
    async fn persistence_failure_maps_to_internal_error() {
        let mut users = MockUserRepository::new();
        users
            .expect_create()
            .times(1)
            .returning(|_| Err(UserPersistenceError::query("write concern error")));
        let mut provider = MockIdentityProvider::new();
        provider.expect_attach_internal_id().never();

        let headers = signed_headers(CREATED_PAYLOAD);
        let response = deliver(state_with(users, provider), CREATED_PAYLOAD, headers).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[rstest]
    #[actix_web::test]
    async fn write_back_failure_maps_to_internal_error() {
        let user = stored_user();
        let mut users = MockUserRepository::new();
        users
            .expect_create()
            .times(1)
            .returning(move |_| Ok(user.clone()));
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_attach_internal_id()
            .times(1)
            .returning(|_, _| Err(IdentityProviderError::status(503, "unavailable")));

        let headers = signed_headers(CREATED_PAYLOAD);
        let response = deliver(state_with(users, provider), CREATED_PAYLOAD, headers).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[rstest]
    #[actix_web::test]
    async fn foreign_event_type_is_acknowledged_with_an_empty_body() {
        let (users, provider) = idle_mocks();
        let payload = r#"{"type":"user.updated","data":{"id":"u_1"}}"#;
        let headers = signed_headers(payload);

        let response = deliver(state_with(users, provider), payload, headers).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = actix_test::read_body(response).await;
        assert!(body.is_empty());
    }

    #[rstest]
    #[actix_web::test]
    async fn verified_but_malformed_json_is_a_client_error() {
        let (users, provider) = idle_mocks();
        let payload = "not json at all";
        let headers = signed_headers(payload);

        let response = deliver(state_with(users, provider), payload, headers).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn created_event_missing_provider_id_is_a_client_error() {
        let (users, provider) = idle_mocks();
        let payload =
            r#"{"type":"user.created","data":{"email_addresses":[{"email_address":"a@b.com"}]}}"#;
        let headers = signed_headers(payload);

        let response = deliver(state_with(users, provider), payload, headers).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
