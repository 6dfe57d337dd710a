// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key-tree store client with typed operations.
//!
//! Provides high-level operations for:
//! - Users (`users/{uid}`)
//! - Artists (`Artists/{sanitized email}`)
//! - Posts (`posts/{created_at_millis}`), with live change notifications
//!
//! Every write is a whole-record `set`. There are no transactions, so two
//! writers racing on the same record resolve as last writer wins.
//!
//! On Firestore, post notifications come from a listener on the `posts`
//! collection, so writes made by other instances reach local subscribers too.

use crate::db::collections;
use crate::db::memory::MemoryTree;
use crate::error::AppError;
use crate::models::{ArtistRecord, PostRecord, UserRecord};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

const POST_EVENTS_CAPACITY: usize = 64;

const POSTS_LISTEN_TARGET: firestore::FirestoreListenerTarget =
    firestore::FirestoreListenerTarget::new(1);

type PostListener =
    firestore::FirestoreListener<firestore::FirestoreDb, firestore::FirestoreMemListenStateStorage>;

/// Notification that the post collection changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostsChanged {
    /// Key of the post that was written
    pub key: String,
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryTree>),
    Offline,
}

/// Store client shared by all services.
#[derive(Clone)]
pub struct Store {
    backend: Backend,
    post_events: broadcast::Sender<PostsChanged>,
    /// Present when post notifications come from the backend itself.
    post_listener: Option<Arc<PostListener>>,
}

impl Store {
    /// Connect to Firestore.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Self::with_backend(Backend::Firestore(client))
            .listen_posts()
            .await
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore emulator");

        Self::with_backend(Backend::Firestore(client))
            .listen_posts()
            .await
    }

    /// Create a store backed by a process-local tree.
    pub fn new_in_memory() -> Self {
        Self::with_backend(Backend::Memory(Arc::new(MemoryTree::new())))
    }

    /// Create an offline store for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self::with_backend(Backend::Offline)
    }

    fn with_backend(backend: Backend) -> Self {
        let (post_events, _) = broadcast::channel(POST_EVENTS_CAPACITY);
        Self {
            backend,
            post_events,
            post_listener: None,
        }
    }

    /// Forward every change on the Firestore `posts` collection to
    /// `post_events`.
    async fn listen_posts(mut self) -> Result<Self, AppError> {
        let client = match &self.backend {
            Backend::Firestore(client) => client.clone(),
            _ => return Ok(self),
        };

        let mut listener = client
            .create_listener(firestore::FirestoreMemListenStateStorage::new())
            .await
            .map_err(|e| AppError::Database(format!("Failed to create post listener: {}", e)))?;

        client
            .fluent()
            .select()
            .from(collections::POSTS)
            .listen()
            .add_target(POSTS_LISTEN_TARGET, &mut listener)
            .map_err(|e| AppError::Database(format!("Failed to listen on posts: {}", e)))?;

        let post_events = self.post_events.clone();
        listener
            .start(move |event| {
                let post_events = post_events.clone();
                async move {
                    if let Some(key) = changed_post_key(&event) {
                        // No receivers is fine
                        let _ = post_events.send(PostsChanged { key });
                    }
                    Ok(())
                }
            })
            .await
            .map_err(|e| AppError::Database(format!("Failed to start post listener: {}", e)))?;

        tracing::info!("Listening for post changes");

        self.post_listener = Some(Arc::new(listener));
        Ok(self)
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by identity uid.
    pub async fn get_user(&self, uid: &str) -> Result<Option<UserRecord>, AppError> {
        self.get_doc(collections::USERS, uid).await
    }

    /// Overwrite a user record.
    pub async fn set_user(&self, user: &UserRecord) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.uid, user).await
    }

    // ─── Artist Operations ───────────────────────────────────────

    /// Get an artist by sanitized key.
    pub async fn get_artist(&self, key: &str) -> Result<Option<ArtistRecord>, AppError> {
        self.get_doc(collections::ARTISTS, key).await
    }

    /// Check whether an artist record exists without decoding it.
    pub async fn artist_exists(&self, key: &str) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Memory(tree) => Ok(tree.contains(collections::ARTISTS, key)),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::ARTISTS)
                .one(key)
                .await
                .map(|doc| doc.is_some())
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Offline => Err(offline()),
        }
    }

    /// Overwrite an artist record.
    pub async fn set_artist(&self, key: &str, artist: &ArtistRecord) -> Result<(), AppError> {
        self.set_doc(collections::ARTISTS, key, artist).await
    }

    // ─── Post Operations ─────────────────────────────────────────

    /// List every post, ascending by `createdAt`.
    ///
    /// Posts that fail to decode are skipped and logged.
    pub async fn list_posts(&self) -> Result<Vec<(String, PostRecord)>, AppError> {
        let mut posts: Vec<(String, PostRecord)> = match &self.backend {
            Backend::Memory(tree) => tree
                .list(collections::POSTS)
                .into_iter()
                .filter_map(|(id, value)| match serde_json::from_value(value) {
                    Ok(post) => Some((id, post)),
                    Err(e) => {
                        tracing::warn!(post_id = %id, error = %e, "Skipping malformed post");
                        None
                    }
                })
                .collect(),
            Backend::Firestore(client) => {
                let docs = client
                    .fluent()
                    .select()
                    .from(collections::POSTS)
                    .order_by([(
                        "createdAt",
                        firestore::FirestoreQueryDirection::Ascending,
                    )])
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                docs.iter()
                    .filter_map(|doc| {
                        let id = document_id(&doc.name).to_string();
                        match firestore::FirestoreDb::deserialize_doc_to::<PostRecord>(doc) {
                            Ok(post) => Some((id, post)),
                            Err(e) => {
                                tracing::warn!(post_id = %id, error = %e, "Skipping malformed post");
                                None
                            }
                        }
                    })
                    .collect()
            }
            Backend::Offline => return Err(offline()),
        };

        posts.sort_by(|(a_id, a), (b_id, b)| {
            a.created_at.cmp(&b.created_at).then_with(|| a_id.cmp(b_id))
        });
        Ok(posts)
    }

    /// Write a post and notify post-collection subscribers.
    pub async fn set_post(&self, key: &str, post: &PostRecord) -> Result<(), AppError> {
        self.set_doc(collections::POSTS, key, post).await?;

        // The listener reports this write along with everyone else's
        if self.post_listener.is_none() {
            // No receivers is fine
            let _ = self.post_events.send(PostsChanged {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Subscribe to post-collection changes.
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe_posts(&self) -> broadcast::Receiver<PostsChanged> {
        self.post_events.subscribe()
    }

    // ─── Helper Methods ──────────────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Memory(tree) => tree
                .get(collection, id)
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| {
                    AppError::Database(format!("Malformed record {}/{}: {}", collection, id, e))
                }),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collection)
                .obj::<T>()
                .one(id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Offline => Err(offline()),
        }
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, value: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        match &self.backend {
            Backend::Memory(tree) => {
                let json = serde_json::to_value(value)
                    .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
                tree.set(collection, id, json);
                Ok(())
            }
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .object(value)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }
}

/// Key of the post touched by a listen event, if any.
fn changed_post_key(event: &firestore::FirestoreListenEvent) -> Option<String> {
    use firestore::FirestoreListenEvent as Event;

    let name = match event {
        Event::DocumentChange(change) => &change.document.as_ref()?.name,
        Event::DocumentDelete(delete) => &delete.document,
        Event::DocumentRemove(remove) => &remove.document,
        _ => return None,
    };
    Some(document_id(name).to_string())
}

/// Last path segment of a full document name.
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn offline() -> AppError {
    AppError::Database("Database not connected (offline mode)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Identity, Role};

    fn post(artist_id: &str, created_at: &str) -> PostRecord {
        PostRecord {
            artist_id: artist_id.to_string(),
            content: format!("post at {created_at}"),
            media_url: None,
            media_type: None,
            created_at: created_at.to_string(),
            likes: 0,
            comments: 0,
        }
    }

    #[tokio::test]
    async fn test_user_round_trip_in_memory() {
        let store = Store::new_in_memory();
        let identity = Identity {
            uid: "u1".to_string(),
            email: None,
            display_name: Some("Fan".to_string()),
            photo_url: None,
        };
        let user = UserRecord::from_identity(&identity, "2025-01-01T00:00:00.000Z".to_string());

        assert!(store.get_user("u1").await.unwrap().is_none());
        store.set_user(&user).await.unwrap();

        let fetched = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(fetched.role, Role::User);
        assert_eq!(fetched.display_name.as_deref(), Some("Fan"));
    }

    #[tokio::test]
    async fn test_list_posts_orders_by_created_at() {
        let store = Store::new_in_memory();
        store.set_post("b", &post("X", "2025-01-03T00:00:00.000Z")).await.unwrap();
        store.set_post("a", &post("X", "2025-01-05T00:00:00.000Z")).await.unwrap();
        store.set_post("c", &post("X", "2025-01-01T00:00:00.000Z")).await.unwrap();

        let ids: Vec<String> = store
            .list_posts()
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_set_post_notifies_subscribers() {
        let store = Store::new_in_memory();
        let mut rx = store.subscribe_posts();

        store.set_post("1", &post("X", "2025-01-01T00:00:00.000Z")).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.key, "1");
    }

    #[tokio::test]
    async fn test_clones_share_notifications() {
        let store = Store::new_in_memory();
        let mut rx = store.subscribe_posts();

        store
            .clone()
            .set_post("9", &post("X", "2025-01-01T00:00:00.000Z"))
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().key, "9");
    }

    #[test]
    fn test_document_id_from_full_name() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/posts/1736000000123"),
            "1736000000123"
        );
        assert_eq!(document_id("bare"), "bare");
    }

    #[tokio::test]
    async fn test_offline_store_errors() {
        let store = Store::new_mock();
        assert!(matches!(
            store.get_artist("k").await,
            Err(AppError::Database(_))
        ));
        assert!(matches!(
            store.artist_exists("k").await,
            Err(AppError::Database(_))
        ));
        assert!(store.list_posts().await.is_err());
    }
}
