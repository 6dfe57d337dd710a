// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Artist profile model for storage and API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Identity;

/// Artist record stored at `Artists/{sanitized email}`.
///
/// Every mutation rewrites the whole record. Two sessions editing the same
/// artist concurrently resolve as last writer wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistRecord {
    /// Whether the profile is approved for listing
    pub approval_status: bool,
    /// Completed bookings
    #[serde(default)]
    pub booking_count: u32,
    /// Blocked calendar dates ("YYYY-MM-DD") mapped to a free-text reason
    #[serde(default)]
    pub busy_days: BTreeMap<String, String>,
    /// Public profile details
    #[serde(default)]
    pub details: ArtistDetails,
    /// Email the record is keyed by
    pub email: String,
    /// Profile photo from the identity provider
    #[serde(default)]
    pub photo_url: String,
    /// Number of profile views
    #[serde(default)]
    pub profile_views: u32,
    /// Reserved post index; written empty
    #[serde(default)]
    pub posts: BTreeMap<String, String>,
}

impl ArtistRecord {
    /// Default record created on an artist's first sign-in.
    pub fn new_for(identity: &Identity, email: &str) -> Self {
        Self {
            approval_status: true,
            booking_count: 0,
            busy_days: BTreeMap::new(),
            details: ArtistDetails {
                stage_name: identity.display_name.clone().unwrap_or_default(),
                ..ArtistDetails::default()
            },
            email: email.to_string(),
            photo_url: identity.photo_url.clone().unwrap_or_default(),
            profile_views: 0,
            posts: BTreeMap::new(),
        }
    }
}

/// Editable profile details nested under `details`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ArtistDetails {
    #[serde(default)]
    #[validate(length(min = 1, max = 80))]
    pub stage_name: String,
    #[serde(default)]
    #[validate(length(max = 80))]
    pub art_form: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde(default)]
    #[validate(nested)]
    pub pricing: Pricing,
    #[serde(default)]
    #[validate(nested)]
    pub social_links: SocialLinks,
    /// Listed in search results
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    #[validate(url)]
    pub profile_image: Option<String>,
}

/// Fixed-duration performance prices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub one_hour: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub two_hours: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub three_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinks {
    #[validate(url)]
    pub instagram: Option<String>,
    #[validate(url)]
    pub youtube: Option<String>,
    #[validate(url)]
    pub spotify: Option<String>,
}
