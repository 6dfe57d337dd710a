// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Response;
use eventgenie_api::config::Config;
use eventgenie_api::db::Store;
use eventgenie_api::middleware::auth::create_jwt;
use eventgenie_api::models::{ArtistRecord, Identity};
use eventgenie_api::routes::create_router;
use eventgenie_api::services::{BlobStore, IdTokenVerifier, MediaHostClient};
use eventgenie_api::AppState;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const TEST_KID: &str = "test-signing-key";

const PRIVATE_KEY_PEM: &str = include_str!("../fixtures/test_signing_key.pem");
const PUBLIC_KEY_PEM: &str = include_str!("../fixtures/test_signing_key.pub.pem");

/// Nothing listens on the discard port, so media-host calls fail fast.
#[allow(dead_code)]
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a store connected to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_db() -> Store {
    Store::new("eventgenie-test")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by in-memory storage.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with_config(config)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_store(config, Store::new_in_memory())
}

#[allow(dead_code)]
pub fn create_test_app_with_store(config: Config, db: Store) -> (axum::Router, Arc<AppState>) {
    build_test_app(config, db, UNREACHABLE_URL)
}

/// Test app whose media-host client talks to `media_host_url`.
#[allow(dead_code)]
pub fn create_test_app_with_media_host(media_host_url: &str) -> (axum::Router, Arc<AppState>) {
    build_test_app(Config::test_default(), Store::new_in_memory(), media_host_url)
}

#[allow(dead_code)]
fn build_test_app(
    config: Config,
    db: Store,
    media_host_url: &str,
) -> (axum::Router, Arc<AppState>) {
    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM.as_bytes()).expect("test public key");
    let verifier = IdTokenVerifier::new_with_static_key(&config, TEST_KID, key)
        .expect("Failed to build verifier");

    let media_host = MediaHostClient::with_base_url(
        media_host_url,
        config.cloudinary_cloud_name.clone(),
        config.cloudinary_api_key.clone(),
        config.cloudinary_api_secret.clone(),
    );

    let state = Arc::new(AppState::new(
        config,
        db,
        BlobStore::new_in_memory(),
        media_host,
        Arc::new(verifier),
    ));

    (create_router(state.clone()), state)
}

#[allow(dead_code)]
fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Sign arbitrary ID-token claims with the test RSA key.
#[allow(dead_code)]
pub fn sign_id_token(claims: &serde_json::Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM.as_bytes()).expect("test private key");
    encode(&header, claims, &key).expect("Failed to sign ID token")
}

/// A valid ID token for the test project.
#[allow(dead_code)]
pub fn id_token(uid: &str, email: Option<&str>) -> String {
    let now = now_secs();
    let project = Config::test_default().firebase_project_id;
    sign_id_token(&serde_json::json!({
        "iss": format!("https://securetoken.google.com/{}", project),
        "aud": project,
        "sub": uid,
        "iat": now,
        "exp": now + 3600,
        "email": email,
        "email_verified": email.is_some(),
        "name": "Test Person",
        "picture": "https://example.com/avatar.png",
    }))
}

#[allow(dead_code)]
pub fn identity(uid: &str, email: Option<&str>) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: email.map(str::to_string),
        display_name: Some("Test Person".to_string()),
        photo_url: None,
    }
}

/// `Cookie` header value carrying a session for `identity`.
#[allow(dead_code)]
pub fn session_cookie(state: &AppState, identity: &Identity) -> String {
    let jwt = create_jwt(identity, &state.config.jwt_signing_key).expect("Failed to create JWT");
    format!("eventgenie_token={}", jwt)
}

/// Seed an artist record for `email` and return its key.
#[allow(dead_code)]
pub async fn seed_artist(state: &AppState, uid: &str, email: &str, stage_name: &str) -> String {
    let mut record = ArtistRecord::new_for(&identity(uid, Some(email)), email);
    record.details.stage_name = stage_name.to_string();
    let key = eventgenie_api::db::artist_key(email);
    state.db.set_artist(&key, &record).await.unwrap();
    key
}

#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub const BOUNDARY: &str = "eventgenie-test-boundary";

/// One multipart part: (field name, optional filename + content type, bytes).
#[allow(dead_code)]
pub struct Part<'a> {
    pub name: &'a str,
    pub file: Option<(&'a str, &'a str)>,
    pub data: &'a [u8],
}

/// Encode parts as a `multipart/form-data` body using [`BOUNDARY`].
#[allow(dead_code)]
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file {
            Some((filename, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        part.name, filename, content_type
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

#[allow(dead_code)]
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
