// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session context: who is signed in and whether they are an artist.

use serde::Serialize;
use tokio::sync::watch;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::{artist_key, Store};
use crate::error::AppError;
use crate::models::Identity;

/// Snapshot of the session state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub identity: Option<Identity>,
    pub is_artist: bool,
    pub loading: bool,
}

impl Session {
    /// State before the first auth-state notification.
    pub fn initial() -> Self {
        Self {
            identity: None,
            is_artist: false,
            loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            identity: None,
            is_artist: false,
            loading: false,
        }
    }

    /// The signed-in identity, or `Unauthorized`.
    pub fn identity(&self) -> Result<&Identity, AppError> {
        self.identity.as_ref().ok_or(AppError::Unauthorized)
    }

    /// The caller's artist key, or `Forbidden` for non-artists.
    pub fn artist_key(&self) -> Result<String, AppError> {
        let identity = self.identity()?;
        match (&identity.email, self.is_artist) {
            (Some(email), true) => Ok(artist_key(email)),
            _ => Err(AppError::Forbidden(
                "Only artists can perform this action".to_string(),
            )),
        }
    }
}

/// Tracks one identity's session and derives the artist flag.
///
/// Owned by whoever holds the sign-in (a request, a connection); dropping
/// the tracker ends the session.
pub struct SessionTracker {
    db: Store,
    state: watch::Sender<Session>,
}

impl SessionTracker {
    pub fn new(db: Store) -> Self {
        let (state, _) = watch::channel(Session::initial());
        Self { db, state }
    }

    /// Current session snapshot.
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Observe session changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// React to a sign-in (`Some`) or sign-out (`None`).
    pub async fn on_auth_state_changed(&self, identity: Option<Identity>) {
        match identity {
            None => {
                self.state.send_replace(Session::signed_out());
            }
            Some(identity) => self.check_status(identity).await,
        }
    }

    /// Re-probe the artist flag for the signed-in identity.
    pub async fn refresh(&self) {
        let Some(identity) = self.state.borrow().identity.clone() else {
            return;
        };

        self.state.send_modify(|session| session.loading = true);
        self.check_status(identity).await;
    }

    async fn check_status(&self, identity: Identity) {
        let is_artist = match identity.email.as_deref() {
            None => false,
            Some(email) => {
                let key = artist_key(email);
                match self.db.artist_exists(&key).await {
                    Ok(exists) => exists,
                    Err(e) => {
                        // Fail open to the lower-privilege state
                        tracing::error!(uid = %identity.uid, error = %e, "Failed to probe artist record");
                        false
                    }
                }
            }
        };

        self.state.send_replace(Session {
            identity: Some(identity),
            is_artist,
            loading: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArtistRecord;

    fn identity(email: Option<&str>) -> Identity {
        Identity {
            uid: "uid-7".to_string(),
            email: email.map(str::to_string),
            display_name: None,
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_initial_state_is_loading() {
        let tracker = SessionTracker::new(Store::new_in_memory());
        assert_eq!(tracker.current(), Session::initial());
    }

    #[tokio::test]
    async fn test_sign_in_without_artist_record() {
        let tracker = SessionTracker::new(Store::new_in_memory());
        tracker
            .on_auth_state_changed(Some(identity(Some("fan@x.com"))))
            .await;

        let session = tracker.current();
        assert!(!session.is_artist);
        assert!(!session.loading);
        assert_eq!(session.identity, Some(identity(Some("fan@x.com"))));
        assert!(matches!(session.artist_key(), Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_sign_in_with_artist_record() {
        let db = Store::new_in_memory();
        let artist = identity(Some("a.b@c.com"));
        db.set_artist("a_bATc_com", &ArtistRecord::new_for(&artist, "a.b@c.com"))
            .await
            .unwrap();

        let tracker = SessionTracker::new(db);
        tracker.on_auth_state_changed(Some(artist)).await;

        let session = tracker.current();
        assert!(session.is_artist);
        assert_eq!(session.artist_key().unwrap(), "a_bATc_com");
    }

    #[tokio::test]
    async fn test_read_failure_fails_open() {
        let tracker = SessionTracker::new(Store::new_mock());
        tracker
            .on_auth_state_changed(Some(identity(Some("a@b.com"))))
            .await;

        let session = tracker.current();
        assert!(!session.is_artist);
        assert!(!session.loading);
        assert!(session.identity.is_some());
    }

    #[tokio::test]
    async fn test_sign_out_resets_state() {
        let db = Store::new_in_memory();
        let artist = identity(Some("a@b.com"));
        db.set_artist("aATb_com", &ArtistRecord::new_for(&artist, "a@b.com"))
            .await
            .unwrap();

        let tracker = SessionTracker::new(db);
        tracker.on_auth_state_changed(Some(artist)).await;
        assert!(tracker.current().is_artist);

        tracker.on_auth_state_changed(None).await;
        assert_eq!(tracker.current(), Session::signed_out());
        assert!(matches!(
            tracker.current().identity(),
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_refresh_picks_up_new_artist_record() {
        let db = Store::new_in_memory();
        let artist = identity(Some("new@artist.com"));
        let tracker = SessionTracker::new(db.clone());
        let mut rx = tracker.subscribe();

        tracker.on_auth_state_changed(Some(artist.clone())).await;
        assert!(!tracker.current().is_artist);

        db.set_artist(
            "newATartist_com",
            &ArtistRecord::new_for(&artist, "new@artist.com"),
        )
        .await
        .unwrap();
        tracker.refresh().await;

        assert!(tracker.current().is_artist);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_artist);
    }

    #[tokio::test]
    async fn test_refresh_when_signed_out_is_noop() {
        let tracker = SessionTracker::new(Store::new_in_memory());
        tracker.on_auth_state_changed(None).await;
        tracker.refresh().await;
        assert_eq!(tracker.current(), Session::signed_out());
    }
}
