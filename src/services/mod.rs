// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod artist;
pub mod blob;
pub mod feed;
pub mod id_token;
pub mod identity;
pub mod media;
pub mod posts;
pub mod session;

pub use artist::{ArtistService, DashboardStats};
pub use blob::BlobStore;
pub use feed::FeedService;
pub use id_token::{IdTokenError, IdTokenVerifier};
pub use identity::{BootstrapOutcome, IdentityService};
pub use media::{HostedMedia, MediaHostClient};
pub use posts::{MediaUpload, PostService};
pub use session::{Session, SessionTracker};
