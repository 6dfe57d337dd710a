// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Path-addressed binary storage for post media.
//!
//! Production uploads go to Firebase Storage through its REST endpoint,
//! authenticated with Google application default credentials. The returned
//! download token makes the object retrievable by URL.

use dashmap::DashMap;
use gcloud_sdk::{GoogleAuthTokenGenerator, TokenSourceType};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AppError;

const FIREBASE_STORAGE_BASE_URL: &str = "https://firebasestorage.googleapis.com/v0/b";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
enum Backend {
    Firebase {
        http: reqwest::Client,
        auth: Arc<GoogleAuthTokenGenerator>,
        base_url: String,
        bucket: String,
    },
    Memory(Arc<DashMap<String, StoredBlob>>),
}

/// Object kept by the in-memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct BlobStore {
    backend: Backend,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

impl BlobStore {
    /// Firebase Storage backend for `bucket`, using application default
    /// credentials.
    pub async fn firebase(bucket: &str) -> Result<Self, AppError> {
        Self::firebase_with_token_source(
            bucket,
            FIREBASE_STORAGE_BASE_URL,
            TokenSourceType::Default,
        )
        .await
    }

    /// Firebase Storage backend against a custom endpoint and credentials.
    pub async fn firebase_with_token_source(
        bucket: &str,
        base_url: &str,
        token_source: TokenSourceType,
    ) -> Result<Self, AppError> {
        let auth =
            GoogleAuthTokenGenerator::new(token_source, gcloud_sdk::GCP_DEFAULT_SCOPES.clone())
                .await
                .map_err(|e| {
                    AppError::BlobStore(format!("Failed to load storage credentials: {}", e))
                })?;

        let http = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .unwrap_or_default();

        tracing::info!(bucket, "Blob store initialized");

        Ok(Self {
            backend: Backend::Firebase {
                http,
                auth: Arc::new(auth),
                base_url: base_url.trim_end_matches('/').to_string(),
                bucket: bucket.to_string(),
            },
        })
    }

    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    /// Upload `bytes` to `path` and return a retrievable URL.
    pub async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        match &self.backend {
            Backend::Memory(objects) => {
                objects.insert(
                    path.to_string(),
                    StoredBlob {
                        content_type: content_type.to_string(),
                        bytes,
                    },
                );
                Ok(format!("memory://{}", path))
            }
            Backend::Firebase {
                http,
                auth,
                base_url,
                bucket,
            } => {
                let size = bytes.len();
                let url = format!("{}/{}/o", base_url, bucket);

                // Cached by the generator until shortly before expiry
                let token = auth.create_token().await.map_err(|e| {
                    AppError::BlobStore(format!("Failed to get access token: {}", e))
                })?;

                let response = http
                    .post(&url)
                    .bearer_auth(token.token.as_sensitive_str())
                    .query(&[("uploadType", "media"), ("name", path)])
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(bytes)
                    .send()
                    .await
                    .map_err(|e| AppError::BlobStore(format!("Upload request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::BlobStore(format!("HTTP {}: {}", status, body)));
                }

                let uploaded: UploadResponse = response
                    .json()
                    .await
                    .map_err(|e| AppError::BlobStore(format!("Invalid upload response: {}", e)))?;

                tracing::info!(path = %uploaded.name, size, "Blob uploaded");

                Ok(download_url(
                    base_url,
                    bucket,
                    &uploaded.name,
                    uploaded.download_tokens.as_deref(),
                ))
            }
        }
    }

    /// Fetch an object from the in-memory backend.
    pub fn get_in_memory(&self, path: &str) -> Option<StoredBlob> {
        match &self.backend {
            Backend::Memory(objects) => objects.get(path).map(|blob| blob.clone()),
            Backend::Firebase { .. } => None,
        }
    }
}

/// Build the public download URL for an uploaded object.
fn download_url(base_url: &str, bucket: &str, name: &str, token: Option<&str>) -> String {
    let mut url = format!(
        "{}/{}/o/{}?alt=media",
        base_url,
        bucket,
        urlencoding::encode(name)
    );
    // Multiple tokens may be comma-separated; any one grants access
    if let Some(token) = token.and_then(|t| t.split(',').next()) {
        url.push_str("&token=");
        url.push_str(&urlencoding::encode(token));
    }
    url
}
