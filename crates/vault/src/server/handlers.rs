//! Axum request handlers for all service endpoints.
//!
//! Storage routes run behind [`require_bearer`](super::middleware::require_bearer),
//! so a [`Subject`] is always present in the request extensions. Values are
//! encrypted with the [`VaultSecret`] before they reach the store and
//! decrypted with it on the way out; a value that does not decrypt under the
//! presented secret is answered exactly like a missing one.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use common::protocol::{ErrorResponse, HealthResponse, KeyRef, KeyValue, UpdateRequest};
use common::ServiceError;
use tracing::debug;

use super::error::ApiError;
use super::extract::VaultSecret;
use super::state::AppState;
use crate::auth::Subject;
use crate::crypto::{decrypt_to_string, encrypt};
use crate::store::StoredRecord;

/// `GET /kv`: every value of the caller that opens with the presented secret.
///
/// Returns `204 No Content` when nothing opens.
pub async fn list(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    secret: VaultSecret,
) -> Result<Response, ApiError> {
    let records = state.store.list(subject.as_str()).await?;
    let total = records.len();

    let mut out = Vec::with_capacity(total);
    for record in records {
        if let Some(value) = open_value(&record, &secret)? {
            out.push(KeyValue {
                key: record.key,
                value,
            });
        }
    }
    debug!(total, readable = out.len(), "listed records");

    if out.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok((StatusCode::OK, Json(out)).into_response())
}

/// `GET /kv/{name}`: one value, or `204 No Content` if absent or unreadable.
pub async fn fetch(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(name): Path<String>,
    secret: VaultSecret,
) -> Result<Response, ApiError> {
    let Some(record) = state.store.get(subject.as_str(), &name).await? else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    match open_value(&record, &secret)? {
        Some(value) => Ok((StatusCode::OK, Json(KeyValue { key: record.key, value })).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// `POST /kv`: encrypt and store a new value.
pub async fn create(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    secret: VaultSecret,
    Json(req): Json<KeyValue>,
) -> Result<Response, ApiError> {
    if req.key.is_empty() {
        return Err(ServiceError::BadRequest("key must not be empty".into()).into());
    }
    if req.value.is_empty() {
        return Err(ServiceError::BadRequest("value must not be empty".into()).into());
    }

    let blob = encrypt(req.value.as_bytes(), secret.expose())?;
    state
        .store
        .insert(StoredRecord {
            owner: subject.as_str().to_owned(),
            key: req.key.clone(),
            value: blob,
        })
        .await?;
    debug!(key = %req.key, "record created");

    Ok((StatusCode::CREATED, Json(KeyRef { key: req.key })).into_response())
}

/// `PUT /kv/{name}`: rename the entry and/or replace its ciphertext.
pub async fn update(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(name): Path<String>,
    secret: VaultSecret,
    Json(req): Json<UpdateRequest>,
) -> Result<Response, ApiError> {
    let new_key = req.key.filter(|k| !k.is_empty());
    let new_value = req
        .value
        .filter(|v| !v.is_empty())
        .map(|v| encrypt(v.as_bytes(), secret.expose()))
        .transpose()?;

    let found = state
        .store
        .update(subject.as_str(), &name, new_key.clone(), new_value)
        .await?;
    if !found {
        return Err(ServiceError::NotFound(format!("no record named {name}")).into());
    }
    let key = new_key.unwrap_or(name);
    debug!(key = %key, "record updated");

    Ok((StatusCode::OK, Json(KeyRef { key })).into_response())
}

/// `DELETE /kv/{name}`: always `204 No Content`.
pub async fn remove(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    state.store.delete(subject.as_str(), &name).await?;
    debug!(key = %name, "record deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `GET /health`: liveness and readiness check.
///
/// Returns `200 OK` when the store answers, `503 Service Unavailable`
/// otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let store_ready = state.store.ping().await;

    let (status_code, status_str) = if store_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        store_ready,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

/// Decrypt a stored value. An empty plaintext counts as no value.
fn open_value(record: &StoredRecord, secret: &VaultSecret) -> Result<Option<String>, ApiError> {
    Ok(decrypt_to_string(&record.value, secret.expose())?.filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{HeaderName, Method, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::auth::testing::{bearer, claims, sign, signing_key, write_anchor};
    use crate::auth::{TokenVerifier, VerifierConfig};
    use crate::server::router;
    use crate::store::{KvStore, MockKvStore, SqliteStore, StoreError};

    const SECRET_HEADER: &str = "x-vault-key";
    const SECRET: &str = "d4621d373cad";

    struct Harness {
        _anchors: TempDir,
        store: Arc<SqliteStore>,
        app: Router,
    }

    fn state_with(anchors: &TempDir, store: Arc<dyn KvStore>) -> AppState {
        let verifier = TokenVerifier::new(VerifierConfig {
            trust_anchor_dir: anchors.path().to_owned(),
        });
        AppState::new(verifier, store, HeaderName::from_static(SECRET_HEADER))
    }

    fn anchors() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_anchor(dir.path(), "sta", &signing_key(1));
        dir
    }

    async fn harness() -> Harness {
        let anchors = anchors();
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let state = state_with(&anchors, store.clone());
        Harness {
            _anchors: anchors,
            store,
            app: router::build(state, Duration::from_secs(30)),
        }
    }

    fn token_for(sub: &str) -> String {
        bearer(&sign(&signing_key(1), "ES256", &claims("sta", sub)))
    }

    fn request(method: Method, uri: &str, sub: &str, secret: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", token_for(sub));
        if let Some(secret) = secret {
            builder = builder.header(SECRET_HEADER, secret);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Option<Value>) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&bytes).unwrap())
        };
        (status, body)
    }

    async fn create_record(app: &Router, sub: &str, secret: &str, key: &str, value: &str) -> StatusCode {
        let body = json!({"key": key, "value": value});
        send(app, request(Method::POST, "/kv", sub, Some(secret), Some(body))).await.0
    }

    #[tokio::test]
    async fn create_then_fetch_returns_exact_plaintext() {
        let h = harness().await;
        let value = "@</;%^?_-☻.♥";
        assert_eq!(create_record(&h.app, "alice", SECRET, "db", value).await, StatusCode::CREATED);

        let (status, body) = send(&h.app, request(Method::GET, "/kv/db", "alice", Some(SECRET), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap(), json!({"key": "db", "value": value}));
    }

    #[tokio::test]
    async fn create_does_not_echo_the_value() {
        let h = harness().await;
        let body = json!({"key": "db", "value": "hunter2"});
        let (status, body) = send(&h.app, request(Method::POST, "/kv", "alice", Some(SECRET), Some(body))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.unwrap(), json!({"key": "db"}));
    }

    #[tokio::test]
    async fn stored_value_is_ciphertext() {
        let h = harness().await;
        create_record(&h.app, "alice", SECRET, "db", "plain-value").await;
        let record = h.store.get("alice", "db").await.unwrap().unwrap();
        assert_ne!(record.value, b"plain-value");
        assert!(!record
            .value
            .windows("plain-value".len())
            .any(|w| w == b"plain-value"));
    }

    #[tokio::test]
    async fn wrong_secret_reads_as_no_content() {
        let h = harness().await;
        create_record(&h.app, "alice", SECRET, "db", "value").await;
        let (status, body) =
            send(&h.app, request(Method::GET, "/kv/db", "alice", Some("not-the-secret"), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn missing_record_reads_as_no_content() {
        let h = harness().await;
        let (status, _) = send(&h.app, request(Method::GET, "/kv/nope", "alice", Some(SECRET), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn list_returns_only_values_that_open_with_the_secret() {
        let h = harness().await;
        create_record(&h.app, "alice", SECRET, "a", "one").await;
        create_record(&h.app, "alice", "other-secret", "b", "two").await;

        let (status, body) = send(&h.app, request(Method::GET, "/kv", "alice", Some(SECRET), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap(), json!([{"key": "a", "value": "one"}]));

        let (status, _) = send(&h.app, request(Method::GET, "/kv", "alice", Some("third"), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn records_of_other_subjects_are_invisible() {
        let h = harness().await;
        create_record(&h.app, "alice", SECRET, "db", "value").await;
        let (status, _) = send(&h.app, request(Method::GET, "/kv/db", "bob", Some(SECRET), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&h.app, request(Method::GET, "/kv", "bob", Some(SECRET), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn missing_secret_header_is_bad_request() {
        let h = harness().await;
        let (status, body) = send(&h.app, request(Method::GET, "/kv", "alice", None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.unwrap()["code"], "bad_request");

        let (status, _) = send(&h.app, request(Method::GET, "/kv", "alice", Some(""), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_key_or_value_is_bad_request() {
        let h = harness().await;
        assert_eq!(create_record(&h.app, "alice", SECRET, "", "v").await, StatusCode::BAD_REQUEST);
        assert_eq!(create_record(&h.app, "alice", SECRET, "k", "").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_create_is_conflict() {
        let h = harness().await;
        assert_eq!(create_record(&h.app, "alice", SECRET, "db", "v1").await, StatusCode::CREATED);
        assert_eq!(create_record(&h.app, "alice", SECRET, "db", "v2").await, StatusCode::CONFLICT);
        // Same key under another subject is fine.
        assert_eq!(create_record(&h.app, "bob", SECRET, "db", "v3").await, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn update_renames_and_replaces_value() {
        let h = harness().await;
        create_record(&h.app, "alice", SECRET, "db", "old").await;

        let body = json!({"key": "database", "value": "new"});
        let (status, body) =
            send(&h.app, request(Method::PUT, "/kv/db", "alice", Some(SECRET), Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap(), json!({"key": "database"}));

        let (status, body) =
            send(&h.app, request(Method::GET, "/kv/database", "alice", Some(SECRET), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["value"], "new");
    }

    #[tokio::test]
    async fn update_with_another_secret_rekeys_the_value() {
        let h = harness().await;
        create_record(&h.app, "alice", SECRET, "db", "old").await;
        let body = json!({"value": "new"});
        send(&h.app, request(Method::PUT, "/kv/db", "alice", Some("rotated"), Some(body))).await;

        let (status, _) = send(&h.app, request(Method::GET, "/kv/db", "alice", Some(SECRET), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) =
            send(&h.app, request(Method::GET, "/kv/db", "alice", Some("rotated"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["value"], "new");
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let h = harness().await;
        let body = json!({"value": "new"});
        let (status, _) =
            send(&h.app, request(Method::PUT, "/kv/nope", "alice", Some(SECRET), Some(body))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let h = harness().await;
        create_record(&h.app, "alice", SECRET, "db", "value").await;
        let (status, _) = send(&h.app, request(Method::DELETE, "/kv/db", "alice", None, None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(h.store.get("alice", "db").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn requests_without_valid_token_are_forbidden() {
        let h = harness().await;

        let req = Request::builder().uri("/kv").body(Body::empty()).unwrap();
        let (status, body) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.unwrap(), json!({"code": "V0001", "message": "forbidden"}));

        let req = Request::builder()
            .uri("/kv")
            .header("authorization", "Token abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.unwrap()["code"], "V0002");

        let forged = sign(&signing_key(9), "ES256", &claims("sta", "alice"));
        let req = Request::builder()
            .uri("/kv")
            .header("authorization", bearer(&forged))
            .header(SECRET_HEADER, SECRET)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.unwrap()["code"], "V0004");
    }

    #[tokio::test]
    async fn unknown_issuer_is_forbidden_with_opaque_code() {
        let h = harness().await;
        let token = sign(&signing_key(1), "ES256", &claims("elsewhere", "alice"));
        let req = Request::builder()
            .uri("/kv")
            .header("authorization", bearer(&token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let body = body.unwrap();
        assert_eq!(body["code"], "V0010");
        assert!(!body.to_string().contains("elsewhere"));
    }

    #[tokio::test]
    async fn store_failure_is_internal_error_without_detail() {
        let anchors = anchors();
        let mut store = MockKvStore::new();
        store
            .expect_list()
            .returning(|_| Err(StoreError::Database(sqlx::Error::PoolTimedOut)));
        let app = router::build(state_with(&anchors, Arc::new(store)), Duration::from_secs(30));

        let (status, body) = send(&app, request(Method::GET, "/kv", "alice", Some(SECRET), None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.unwrap(), json!({"code": "internal_error", "message": "internal error"}));
    }

    #[tokio::test]
    async fn health_reports_store_state() {
        let h = harness().await;
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap(), json!({"status": "ok", "store_ready": true}));

        let anchors = anchors();
        let mut store = MockKvStore::new();
        store.expect_ping().returning(|| false);
        let app = router::build(state_with(&anchors, Arc::new(store)), Duration::from_secs(30));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.unwrap(), json!({"status": "degraded", "store_ready": false}));
    }
}
