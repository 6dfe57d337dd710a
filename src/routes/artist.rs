// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Artist dashboard, profile and schedule routes.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::models::ArtistDetails;
use crate::services::{DashboardStats, Session};
use crate::time_utils::parse_date_key;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/artist/dashboard", get(get_dashboard))
        .route("/api/artist/profile", put(update_profile))
        .route(
            "/api/artist/schedule/{date}",
            put(block_date).delete(unblock_date),
        )
}

#[derive(Debug, Deserialize)]
pub struct BlockDateRequest {
    reason: String,
}

/// Busy days after a schedule change.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub busy_days: BTreeMap<String, String>,
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<DashboardStats>> {
    let key = session.artist_key()?;
    Ok(Json(state.artist_service.dashboard(&key).await?))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(details): Json<ArtistDetails>,
) -> Result<Json<ArtistDetails>> {
    let key = session.artist_key()?;
    let artist = state.artist_service.update_profile(&key, details).await?;
    Ok(Json(artist.details))
}

async fn block_date(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(date): Path<String>,
    Json(body): Json<BlockDateRequest>,
) -> Result<Json<ScheduleResponse>> {
    let key = session.artist_key()?;
    let date = parse_date(&date)?;
    let today = Utc::now().date_naive();

    let artist = state
        .artist_service
        .block_date(&key, date, &body.reason, today)
        .await?;
    Ok(Json(ScheduleResponse {
        busy_days: artist.busy_days,
    }))
}

async fn unblock_date(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(date): Path<String>,
) -> Result<Json<ScheduleResponse>> {
    let key = session.artist_key()?;
    let date = parse_date(&date)?;

    let artist = state.artist_service.unblock_date(&key, date).await?;
    Ok(Json(ScheduleResponse {
        busy_days: artist.busy_days,
    }))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    parse_date_key(raw)
        .ok_or_else(|| AppError::BadRequest(format!("Expected a YYYY-MM-DD date, got {}", raw)))
}
