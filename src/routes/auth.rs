// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in session routes.
//!
//! The browser signs in with the identity provider, then exchanges the
//! provider's ID token here for an HttpOnly session cookie.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, identity_from_request, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::Role;
use crate::services::{IdTokenError, Session, SessionTracker};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/session", post(sign_in).get(current_session))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    id_token: String,
    /// Which record to bootstrap; omitted for a plain session refresh.
    #[serde(default)]
    role: Option<Role>,
}

/// Exchange an identity-provider ID token for a session cookie.
async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SignInRequest>,
) -> Result<(CookieJar, Json<Session>)> {
    let identity = state
        .id_token_verifier
        .verify(&body.id_token)
        .await
        .map_err(|e| {
            if let IdTokenError::Transient(msg) = &e {
                tracing::error!(error = %msg, "Identity provider unavailable");
            }
            AppError::IdentityProvider(e.to_string())
        })?;

    if let Some(role) = body.role {
        let outcome = state.identity_service.bootstrap(&identity, role).await?;
        tracing::info!(
            uid = %identity.uid,
            role = role.as_str(),
            outcome = ?outcome,
            "Sign-in bootstrap complete"
        );
    }

    let jwt = create_jwt(&identity, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let tracker = SessionTracker::new(state.db.clone());
    tracker.on_auth_state_changed(Some(identity)).await;

    let jar = jar.add(session_cookie(&state.config, jwt));
    Ok((jar, Json(tracker.current())))
}

/// Current session; signed out when there is no valid cookie.
async fn current_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Json<Session> {
    let identity = identity_from_request(&jar, &headers, &state.config.jwt_signing_key);

    let tracker = SessionTracker::new(state.db.clone());
    tracker.on_auth_state_changed(identity).await;
    Json(tracker.current())
}

async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(session_cookie(&state.config, String::new()));
    (jar, StatusCode::NO_CONTENT)
}

/// Removal must repeat the attributes the cookie was set with.
fn session_cookie(config: &Config, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!config.is_local_frontend())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}
