// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! First-sign-in bootstrap for users and artists.

use chrono::{DateTime, Utc};

use crate::db::{artist_key, Store};
use crate::error::AppError;
use crate::models::{ArtistRecord, Identity, Role, UserRecord};
use crate::time_utils::format_utc_rfc3339;

/// What a bootstrap call did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A default artist record was written at this key.
    ArtistCreated { key: String },
    /// An artist record already existed; nothing was written.
    ArtistExists { key: String },
    /// The user record was overwritten.
    UserRecorded,
}

/// Creates the store record that backs a signed-in identity.
#[derive(Clone)]
pub struct IdentityService {
    db: Store,
}

impl IdentityService {
    pub fn new(db: Store) -> Self {
        Self { db }
    }

    /// Bootstrap the record for `identity` under the requested role.
    pub async fn bootstrap(
        &self,
        identity: &Identity,
        role: Role,
    ) -> Result<BootstrapOutcome, AppError> {
        self.bootstrap_at(identity, role, Utc::now()).await
    }

    /// Bootstrap with an explicit sign-in time.
    ///
    /// The artist path is guarded by an existence check so a returning
    /// artist's edited profile is never replaced. The user path always
    /// rewrites the record, refreshing `lastLogin` and profile fields.
    pub async fn bootstrap_at(
        &self,
        identity: &Identity,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<BootstrapOutcome, AppError> {
        match role {
            Role::Artist => {
                let email = identity.email.as_deref().ok_or_else(|| {
                    AppError::BadRequest("Artist sign-in requires an email address".to_string())
                })?;
                let key = artist_key(email);

                if self.db.artist_exists(&key).await? {
                    tracing::debug!(uid = %identity.uid, key = %key, "Artist record already exists");
                    return Ok(BootstrapOutcome::ArtistExists { key });
                }

                let record = ArtistRecord::new_for(identity, email);
                self.db.set_artist(&key, &record).await?;

                tracing::info!(uid = %identity.uid, key = %key, "Created artist record");
                Ok(BootstrapOutcome::ArtistCreated { key })
            }
            Role::User => {
                let record = UserRecord::from_identity(identity, format_utc_rfc3339(now));
                self.db.set_user(&record).await?;

                tracing::info!(uid = %identity.uid, "Recorded user sign-in");
                Ok(BootstrapOutcome::UserRecorded)
            }
        }
    }
}
