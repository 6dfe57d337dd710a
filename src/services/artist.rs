// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Artist dashboard, profile and schedule operations.
//!
//! Every mutation reads the whole artist record, changes it in memory and
//! writes the whole record back. Concurrent edits from two sessions can
//! overwrite each other.

use chrono::NaiveDate;
use serde::Serialize;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::Store;
use crate::error::AppError;
use crate::models::{ArtistDetails, ArtistRecord};
use crate::time_utils::DATE_KEY_FORMAT;

const MAX_REASON_LEN: usize = 200;

/// Aggregates shown on the artist dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub email: String,
    pub photo_url: String,
    pub profile_views: u32,
    pub booking_count: u32,
    pub busy_days: u32,
    /// "Approved" or "Pending"
    pub approval_status: String,
    pub details: ArtistDetails,
}

impl From<&ArtistRecord> for DashboardStats {
    fn from(artist: &ArtistRecord) -> Self {
        Self {
            email: artist.email.clone(),
            photo_url: artist.photo_url.clone(),
            profile_views: artist.profile_views,
            booking_count: artist.booking_count,
            busy_days: artist.busy_days.len() as u32,
            approval_status: if artist.approval_status {
                "Approved".to_string()
            } else {
                "Pending".to_string()
            },
            details: artist.details.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ArtistService {
    db: Store,
}

impl ArtistService {
    pub fn new(db: Store) -> Self {
        Self { db }
    }

    /// Load an artist record, or `NotFound`.
    pub async fn get(&self, key: &str) -> Result<ArtistRecord, AppError> {
        self.db
            .get_artist(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No artist data found for {}", key)))
    }

    pub async fn dashboard(&self, key: &str) -> Result<DashboardStats, AppError> {
        let artist = self.get(key).await?;
        Ok(DashboardStats::from(&artist))
    }

    /// Replace the profile details.
    pub async fn update_profile(
        &self,
        key: &str,
        details: ArtistDetails,
    ) -> Result<ArtistRecord, AppError> {
        details.validate()?;

        let mut artist = self.get(key).await?;
        artist.details = details;
        self.db.set_artist(key, &artist).await?;

        tracing::info!(artist = %key, "Artist profile updated");
        Ok(artist)
    }

    /// Block a calendar date with a reason.
    ///
    /// `today` bounds the earliest date that may be blocked.
    pub async fn block_date(
        &self,
        key: &str,
        date: NaiveDate,
        reason: &str,
        today: NaiveDate,
    ) -> Result<ArtistRecord, AppError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::BadRequest(
                "A reason is required to block a date".to_string(),
            ));
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(AppError::BadRequest(format!(
                "Reason must be at most {} characters",
                MAX_REASON_LEN
            )));
        }
        if date < today {
            return Err(AppError::BadRequest(
                "Cannot block a date in the past".to_string(),
            ));
        }

        let date_key = date.format(DATE_KEY_FORMAT).to_string();
        let mut artist = self.get(key).await?;
        artist.busy_days.insert(date_key.clone(), reason.to_string());
        self.db.set_artist(key, &artist).await?;

        tracing::info!(artist = %key, date = %date_key, "Date blocked");
        Ok(artist)
    }

    /// Remove a blocked date.
    pub async fn unblock_date(&self, key: &str, date: NaiveDate) -> Result<ArtistRecord, AppError> {
        let date_key = date.format(DATE_KEY_FORMAT).to_string();
        let mut artist = self.get(key).await?;

        if artist.busy_days.remove(&date_key).is_none() {
            return Err(AppError::NotFound(format!("{} is not blocked", date_key)));
        }
        self.db.set_artist(key, &artist).await?;

        tracing::info!(artist = %key, date = %date_key, "Date unblocked");
        Ok(artist)
    }
}
