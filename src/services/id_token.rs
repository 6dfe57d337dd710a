// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity-provider ID token verification (Firebase Authentication).
//!
//! The browser completes the OAuth popup flow with the identity provider
//! and hands us the resulting ID token. We check its RS256 signature against
//! the provider's published keys and turn the claims into an [`Identity`].

use crate::config::Config;
use crate::models::Identity;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;
const MAX_UID_LEN: usize = 128;

/// Why an ID token was not accepted.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdTokenError {
    /// The token is malformed, expired, or not meant for this project.
    #[error("{0}")]
    Rejected(String),
    /// Signing keys could not be fetched; the token may be fine.
    #[error("identity provider unavailable: {0}")]
    Transient(String),
}

enum KeySource {
    Jwks { url: String },
    Static { kid: String, key: Arc<DecodingKey> },
}

struct KeyCache {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for identity-provider ID tokens.
pub struct IdTokenVerifier {
    http_client: reqwest::Client,
    project_id: String,
    source: KeySource,
    cache: RwLock<Option<KeyCache>>,
    refresh_lock: Mutex<()>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    iat: Option<u64>,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
}

impl IdTokenVerifier {
    /// Production verifier that fetches and caches the provider's JWKS.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::build(
            config,
            KeySource::Jwks {
                url: FIREBASE_JWKS_URL.to_string(),
            },
        )
    }

    /// Verifier with a single static RSA public key, for tests.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static key id must not be empty");
        }
        Self::build(
            config,
            KeySource::Static {
                kid,
                key: Arc::new(key),
            },
        )
    }

    fn build(config: &Config, source: KeySource) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building identity-provider HTTP client")?;

        Ok(Self {
            http_client,
            project_id: config.firebase_project_id.clone(),
            source,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Verify an ID token and extract the signed-in identity.
    ///
    /// An email the provider has not verified is dropped, since artist
    /// records are keyed by email.
    pub async fn verify(&self, token: &str) -> Result<Identity, IdTokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IdTokenError::Rejected("ID token is empty".to_string()));
        }

        let header = decode_header(token)
            .map_err(|e| IdTokenError::Rejected(format!("invalid token header: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdTokenError::Rejected(format!(
                "unexpected token alg: {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdTokenError::Rejected("missing token kid".to_string()))?;

        let key = self.key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[format!("{ISSUER_PREFIX}{}", self.project_id)]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<IdTokenClaims>(token, key.as_ref(), &validation)
            .map_err(|e| IdTokenError::Rejected(format!("token validation failed: {e}")))?
            .claims;

        if claims.sub.is_empty() || claims.sub.len() > MAX_UID_LEN {
            return Err(IdTokenError::Rejected("invalid sub claim".to_string()));
        }
        match claims.iat {
            Some(iat) if iat <= now_unix_secs() + CLOCK_SKEW_SECS => {}
            Some(_) => {
                return Err(IdTokenError::Rejected(
                    "iat claim is in the future".to_string(),
                ))
            }
            None => return Err(IdTokenError::Rejected("missing iat claim".to_string())),
        }

        let email = match claims.email_verified {
            Some(true) => claims.email,
            _ => {
                if claims.email.is_some() {
                    tracing::debug!(uid = %claims.sub, "Ignoring unverified email");
                }
                None
            }
        };

        Ok(Identity {
            uid: claims.sub,
            email,
            display_name: claims.name,
            photo_url: claims.picture,
        })
    }

    async fn key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, IdTokenError> {
        let url = match &self.source {
            KeySource::Static { kid: known, key } => {
                return if kid == known {
                    Ok(key.clone())
                } else {
                    Err(IdTokenError::Rejected(format!("unknown token kid: {kid}")))
                };
            }
            KeySource::Jwks { url } => url,
        };

        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }

        // Keys rotate; a miss on a warm cache forces one refetch.
        for force in [false, true] {
            self.refresh_keys(url, force).await?;
            if let Some(key) = self.cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(IdTokenError::Rejected(format!(
            "token kid not found in provider keys: {kid}"
        )))
    }

    async fn cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > Instant::now())
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_keys(&self, url: &str, force: bool) -> Result<(), IdTokenError> {
        let _guard = self.refresh_lock.lock().await;

        if !force
            && self
                .cache
                .read()
                .await
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
        {
            return Ok(());
        }

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| IdTokenError::Transient(format!("key request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(IdTokenError::Transient(format!(
                "key request returned status {}",
                response.status()
            )));
        }

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_cache_control_max_age)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| IdTokenError::Transient(format!("invalid key set JSON: {e}")))?;

        let keys_by_kid = usable_keys(jwks);
        if keys_by_kid.is_empty() {
            return Err(IdTokenError::Transient(
                "key set did not include any usable RSA keys".to_string(),
            ));
        }

        tracing::debug!(
            keys = keys_by_kid.len(),
            ttl_secs = ttl.as_secs(),
            "Identity-provider keys refreshed"
        );

        *self.cache.write().await = Some(KeyCache {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });
        Ok(())
    }
}

fn usable_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    jwks.keys
        .into_iter()
        .filter(|jwk| jwk.kty == "RSA" && !jwk.kid.trim().is_empty())
        .filter(|jwk| jwk.alg.as_deref().map_or(true, |alg| alg == "RS256"))
        .filter_map(|jwk| match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => Some((jwk.kid, Arc::new(key))),
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA key");
                None
            }
        })
        .collect()
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse().ok())
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
