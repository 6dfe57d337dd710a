// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Post creation route (multipart: `content`, optional `media`).

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::PostRecord;
use crate::services::{MediaUpload, Session};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/posts", post(create_post))
}

#[derive(Debug, Serialize)]
pub struct CreatedPost {
    pub id: String,
    #[serde(flatten)]
    pub post: PostRecord,
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedPost>)> {
    let key = session.artist_key()?;

    let mut content = String::new();
    let mut media = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("content") => {
                content = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid content field: {}", e)))?;
            }
            Some("media") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid media field: {}", e)))?;
                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    media = Some(MediaUpload {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown multipart field");
            }
        }
    }

    let (id, post) = state.post_service.create_post(&key, &content, media).await?;
    Ok((StatusCode::CREATED, Json(CreatedPost { id, post })))
}
