//! User model for storage.

use serde::{Deserialize, Serialize};

use crate::models::{Identity, Role};

/// User profile stored at `users/{uid}`.
///
/// Rewritten on every user sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Identity provider uid (also used as document ID)
    pub uid: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Display name from the identity provider
    pub display_name: Option<String>,
    /// Profile picture URL
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    /// Last sign-in timestamp (RFC 3339)
    pub last_login: String,
    /// Role tag ("user")
    pub role: Role,
}

impl UserRecord {
    /// Build the record written for a user sign-in.
    pub fn from_identity(identity: &Identity, last_login: String) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            photo_url: identity.photo_url.clone(),
            last_login,
            role: Role::User,
        }
    }
}
