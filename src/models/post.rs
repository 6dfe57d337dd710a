//! Post model and the assembled feed entry.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Derive the kind from a MIME type's top-level type (`image/png` → Image).
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.split('/').next()?.trim().to_ascii_lowercase().as_str() {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }
}

/// Post stored at `posts/{created_at_millis}`. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    /// Sanitized key of the authoring artist
    pub artist_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaKind>,
    /// Creation time (RFC 3339, UTC, millisecond precision)
    pub created_at: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub comments: u32,
}

/// Author display data merged into each feed entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub stage_name: String,
    pub photo_url: String,
    pub art_form: String,
}

/// A post enriched with its author, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub id: String,
    pub artist_id: String,
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaKind>,
    pub created_at: String,
    pub likes: u32,
    pub comments: u32,
    pub artist_data: AuthorSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime("video/mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_mime("Audio/mpeg"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_mime("application/pdf"), None);
        assert_eq!(MediaKind::from_mime(""), None);
    }

    #[test]
    fn test_post_without_media_omits_fields() {
        let post = PostRecord {
            artist_id: "xATy_com".to_string(),
            content: "hello".to_string(),
            media_url: None,
            media_type: None,
            created_at: "2025-01-01T00:00:00.000Z".to_string(),
            likes: 0,
            comments: 0,
        };

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["artistId"], "xATy_com");
        assert!(json.get("mediaUrl").is_none());
        assert!(json.get("mediaType").is_none());
    }
}
