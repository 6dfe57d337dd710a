// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! EventGenie API Server
//!
//! Serves sign-in, artist dashboard, feed and upload endpoints for the
//! EventGenie booking marketplace.

use eventgenie_api::{
    config::{Config, StoreBackend},
    db::Store,
    services::{BlobStore, IdTokenVerifier, MediaHostClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.store_backend,
        "Starting EventGenie API"
    );

    let (db, blobs) = match config.store_backend {
        StoreBackend::Firestore => {
            let db = Store::new(&config.firebase_project_id).await?;
            let blobs = BlobStore::firebase(&config.firebase_storage_bucket).await?;
            (db, blobs)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            (Store::new_in_memory(), BlobStore::new_in_memory())
        }
    };

    let media_host = MediaHostClient::new(
        config.cloudinary_cloud_name.clone(),
        config.cloudinary_api_key.clone(),
        config.cloudinary_api_secret.clone(),
    );

    let id_token_verifier = Arc::new(IdTokenVerifier::new(&config)?);
    tracing::info!(
        project = %config.firebase_project_id,
        "Identity token verifier initialized"
    );

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        db,
        blobs,
        media_host,
        id_token_verifier,
    ));

    // Build router
    let app = eventgenie_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("eventgenie_api=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();

    Ok(())
}
