// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed routes: a one-shot snapshot and a live SSE stream.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Json, Router,
};
use futures_util::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;

use crate::error::Result;
use crate::models::FeedEntry;
use crate::services::Session;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/feed", get(get_feed))
        .route("/api/feed/stream", get(stream_feed))
}

/// Newest-first feed snapshot.
async fn get_feed(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<FeedEntry>>> {
    session.identity()?;
    Ok(Json(state.feed_service.assemble().await?))
}

/// Live feed: one `feed` event now and one per post change.
async fn stream_feed(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let uid = session.identity()?.uid.clone();
    tracing::debug!(uid = %uid, "Feed subscriber connected");

    let events = state.feed_service.subscribe().map(|result| {
        let event = match result {
            Ok(entries) => {
                let json = serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string());
                Event::default().event("feed").data(json)
            }
            Err(e) => {
                tracing::error!(error = %e, "Feed refresh failed");
                Event::default().event("error").data("Failed to load feed")
            }
        };
        Ok(event)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
