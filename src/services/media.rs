// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Media hosting client (Cloudinary upload API).
//!
//! Handles:
//! - Re-encoding uploaded bytes as a `data:` URI
//! - Signed uploads (SHA-256 over the sorted parameters plus API secret)

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use chrono::Utc;
use std::time::Duration;

use crate::error::AppError;

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const UPLOAD_FOLDER: &str = "eventgenie/posts";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Where an uploaded asset ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedMedia {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    secure_url: String,
    public_id: String,
}

/// Media host API client.
#[derive(Clone)]
pub struct MediaHostClient {
    http: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl MediaHostClient {
    /// Create a new client with account credentials.
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Self {
        Self::with_base_url(CLOUDINARY_API_BASE, cloud_name, api_key, api_secret)
    }

    /// Create a client against a custom API base URL.
    pub fn with_base_url(
        base_url: &str,
        cloud_name: String,
        api_key: String,
        api_secret: String,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cloud_name,
            api_key,
            api_secret,
        }
    }

    /// Upload raw bytes, letting the host detect the resource type.
    pub async fn upload(&self, content_type: &str, bytes: &[u8]) -> Result<HostedMedia, AppError> {
        let file = data_uri(content_type, bytes);
        let timestamp = Utc::now().timestamp().to_string();

        let signature = sign(
            &[("folder", UPLOAD_FOLDER), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let url = format!("{}/{}/auto/upload", self.base_url, self.cloud_name);

        let response = self
            .http
            .post(&url)
            .form(&[
                ("file", file.as_str()),
                ("folder", UPLOAD_FOLDER),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.api_key.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .map_err(|e| AppError::MediaHost(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MediaHost(format!("HTTP {}: {}", status, body)));
        }

        let result: UploadResult = response
            .json()
            .await
            .map_err(|e| AppError::MediaHost(format!("Invalid upload response: {}", e)))?;

        tracing::info!(public_id = %result.public_id, size = bytes.len(), "Media uploaded");

        Ok(HostedMedia {
            url: result.secure_url,
            public_id: result.public_id,
        })
    }
}

/// Encode bytes as a base64 `data:` URI.
fn data_uri(content_type: &str, bytes: &[u8]) -> String {
    let content_type = if content_type.is_empty() {
        "application/octet-stream"
    } else {
        content_type
    };
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

/// Request signature: `k1=v1&k2=v2` (keys sorted) followed by the secret, SHA-256 hex.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut params = params.to_vec();
    params.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
