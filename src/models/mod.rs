// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod artist;
pub mod identity;
pub mod post;
pub mod user;

pub use artist::{ArtistDetails, ArtistRecord, Pricing, SocialLinks};
pub use identity::{Identity, Role};
pub use post::{AuthorSummary, FeedEntry, MediaKind, PostRecord};
pub use user::UserRecord;
