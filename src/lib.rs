// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! EventGenie: artist and event booking marketplace API
//!
//! This crate provides the backend for the EventGenie web application:
//! sign-in bootstrap for users and artists, the artist dashboard and
//! schedule, the social feed, and media uploads.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{
    ArtistService, BlobStore, FeedService, IdTokenVerifier, IdentityService, MediaHostClient,
    PostService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Store,
    pub id_token_verifier: Arc<IdTokenVerifier>,
    pub media_host: MediaHostClient,
    pub identity_service: IdentityService,
    pub feed_service: FeedService,
    pub artist_service: ArtistService,
    pub post_service: PostService,
}

impl AppState {
    /// Wire the services around a store, blob store and external clients.
    pub fn new(
        config: Config,
        db: Store,
        blobs: BlobStore,
        media_host: MediaHostClient,
        id_token_verifier: Arc<IdTokenVerifier>,
    ) -> Self {
        Self {
            identity_service: IdentityService::new(db.clone()),
            feed_service: FeedService::new(db.clone()),
            artist_service: ArtistService::new(db.clone()),
            post_service: PostService::new(db.clone(), blobs),
            config,
            db,
            id_token_verifier,
            media_host,
        }
    }
}
