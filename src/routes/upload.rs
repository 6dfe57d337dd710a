// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public media upload route, forwarding files to the media host.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/upload", post(upload))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub public_id: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Every failure answers with a JSON `{error}` body, including requests
/// that are not `multipart/form-data` at all.
async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Upload body is not multipart");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed");
        }
    };
    let mut file = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed upload body");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed");
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        match field.bytes().await {
            Ok(bytes) if !bytes.is_empty() => {
                file = Some((content_type, bytes));
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed reading upload field");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed");
            }
        }
    }

    let Some((content_type, bytes)) = file else {
        return error_response(StatusCode::BAD_REQUEST, "No file provided");
    };

    match state.media_host.upload(&content_type, &bytes).await {
        Ok(hosted) => Json(UploadResponse {
            url: hosted.url,
            public_id: hosted.public_id,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, size = bytes.len(), "Upload failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed")
        }
    }
}
