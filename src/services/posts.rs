// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Post creation for artists, with optional media.

use chrono::{DateTime, Utc};

use crate::db::Store;
use crate::error::AppError;
use crate::models::{MediaKind, PostRecord};
use crate::services::blob::BlobStore;
use crate::time_utils::{format_utc_rfc3339, post_key};

const MAX_CONTENT_LEN: usize = 5000;

/// Media attached to a new post.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct PostService {
    db: Store,
    blobs: BlobStore,
}

impl PostService {
    pub fn new(db: Store, blobs: BlobStore) -> Self {
        Self { db, blobs }
    }

    /// Create a post authored by the artist at `artist_key`.
    pub async fn create_post(
        &self,
        artist_key: &str,
        content: &str,
        media: Option<MediaUpload>,
    ) -> Result<(String, PostRecord), AppError> {
        self.create_post_at(artist_key, content, media, Utc::now())
            .await
    }

    /// Create a post with an explicit creation time.
    ///
    /// The media (if any) is stored first; the post is written only after
    /// the upload succeeds.
    pub async fn create_post_at(
        &self,
        artist_key: &str,
        content: &str,
        media: Option<MediaUpload>,
        now: DateTime<Utc>,
    ) -> Result<(String, PostRecord), AppError> {
        let content = content.trim();
        if content.is_empty() && media.is_none() {
            return Err(AppError::BadRequest(
                "A post needs text or media".to_string(),
            ));
        }
        if content.chars().count() > MAX_CONTENT_LEN {
            return Err(AppError::BadRequest(format!(
                "Post text must be at most {} characters",
                MAX_CONTENT_LEN
            )));
        }

        let key = post_key(now);

        let (media_url, media_type) = match media {
            Some(upload) => {
                let kind = MediaKind::from_mime(&upload.content_type).ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "Unsupported media type: {}",
                        upload.content_type
                    ))
                })?;
                let path = media_path(artist_key, &key, &upload.filename);
                let url = self
                    .blobs
                    .upload(&path, &upload.content_type, upload.bytes)
                    .await?;
                (Some(url), Some(kind))
            }
            None => (None, None),
        };

        let post = PostRecord {
            artist_id: artist_key.to_string(),
            content: content.to_string(),
            media_url,
            media_type,
            created_at: format_utc_rfc3339(now),
            likes: 0,
            comments: 0,
        };

        self.db.set_post(&key, &post).await?;

        tracing::info!(
            artist = %artist_key,
            post_id = %key,
            media = ?post.media_type,
            "Post created"
        );
        Ok((key, post))
    }
}

/// Blob path: `posts/{artist key}/{timestamp}-{filename}`.
fn media_path(artist_key: &str, timestamp: &str, filename: &str) -> String {
    let filename: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let filename = if filename.is_empty() {
        "upload".to_string()
    } else {
        filename
    };
    format!("posts/{}/{}-{}", artist_key, timestamp, filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_736_000_000_123).unwrap()
    }

    #[test]
    fn test_media_path() {
        assert_eq!(
            media_path("aATb_com", "1700", "song.mp3"),
            "posts/aATb_com/1700-song.mp3"
        );
        assert_eq!(
            media_path("k", "1", "../etc/passwd"),
            "posts/k/1-.._etc_passwd"
        );
        assert_eq!(media_path("k", "1", ""), "posts/k/1-upload");
    }

    #[tokio::test]
    async fn test_text_post() {
        let db = Store::new_in_memory();
        let service = PostService::new(db.clone(), BlobStore::new_in_memory());

        let (key, post) = service
            .create_post_at("aATb_com", " Live tonight! ", None, now())
            .await
            .unwrap();

        assert_eq!(key, "1736000000123");
        assert_eq!(post.content, "Live tonight!");
        assert_eq!(post.created_at, "2025-01-04T14:13:20.123Z");
        assert_eq!(post.likes, 0);

        let posts = db.list_posts().await.unwrap();
        assert_eq!(posts, vec![(key, post)]);
    }

    #[tokio::test]
    async fn test_media_post_uploads_first() {
        let db = Store::new_in_memory();
        let blobs = BlobStore::new_in_memory();
        let service = PostService::new(db.clone(), blobs.clone());

        let upload = MediaUpload {
            filename: "clip.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            bytes: vec![9; 16],
        };
        let (_, post) = service
            .create_post_at("aATb_com", "", Some(upload), now())
            .await
            .unwrap();

        let path = "posts/aATb_com/1736000000123-clip.mp4";
        assert_eq!(post.media_type, Some(MediaKind::Video));
        assert_eq!(post.media_url.as_deref(), Some("memory://posts/aATb_com/1736000000123-clip.mp4"));
        assert_eq!(blobs.get_in_memory(path).unwrap().bytes.len(), 16);
    }

    #[tokio::test]
    async fn test_empty_post_rejected() {
        let service = PostService::new(Store::new_in_memory(), BlobStore::new_in_memory());
        assert!(matches!(
            service.create_post("k", "   ", None).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_unsupported_media_writes_nothing() {
        let db = Store::new_in_memory();
        let service = PostService::new(db.clone(), BlobStore::new_in_memory());

        let upload = MediaUpload {
            filename: "doc.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![1],
        };
        let result = service.create_post("k", "see attached", Some(upload)).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(db.list_posts().await.unwrap().is_empty());
    }
}
