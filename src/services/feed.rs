// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feed assembly: every post joined with its author's profile.
//!
//! The join happens client-side: list all posts, then read each author
//! record. That is one store read per post, so the cost grows linearly with
//! the post collection and is rerun in full on every change.

use futures_util::{stream, Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::db::{PostsChanged, Store};
use crate::error::AppError;
use crate::models::{ArtistRecord, AuthorSummary, FeedEntry, PostRecord};

const MAX_CONCURRENT_AUTHOR_READS: usize = 50;

const DEFAULT_STAGE_NAME: &str = "Unknown Artist";
const DEFAULT_PHOTO_URL: &str = "/default-avatar.png";
const DEFAULT_ART_FORM: &str = "Artist";

/// Builds the newest-first feed.
#[derive(Clone)]
pub struct FeedService {
    db: Store,
}

impl FeedService {
    pub fn new(db: Store) -> Self {
        Self { db }
    }

    /// Assemble the feed once.
    ///
    /// Posts whose author record is missing, or whose author read fails, are
    /// dropped and logged rather than failing the whole feed.
    pub async fn assemble(&self) -> Result<Vec<FeedEntry>, AppError> {
        let posts = self.db.list_posts().await?;
        let post_count = posts.len();

        let mut entries: Vec<FeedEntry> = stream::iter(posts)
            .map(|(id, post)| async move {
                match self.db.get_artist(&post.artist_id).await {
                    Ok(Some(artist)) => Some(join(id, post, &artist)),
                    Ok(None) => {
                        tracing::warn!(
                            post_id = %id,
                            artist_id = %post.artist_id,
                            "No artist record for post, dropping it"
                        );
                        None
                    }
                    Err(e) => {
                        tracing::error!(
                            post_id = %id,
                            artist_id = %post.artist_id,
                            error = %e,
                            "Failed to read artist for post, dropping it"
                        );
                        None
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_AUTHOR_READS)
            .filter_map(|entry| async move { entry })
            .collect()
            .await;

        // Author reads complete out of order; restore store order, then flip.
        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        entries.reverse();

        tracing::debug!(
            posts = post_count,
            entries = entries.len(),
            "Feed assembled"
        );
        Ok(entries)
    }

    /// Live feed: yields the assembled feed now and after every post change.
    ///
    /// Dropping the stream drops the underlying subscription.
    pub fn subscribe(&self) -> impl Stream<Item = Result<Vec<FeedEntry>, AppError>> + Send {
        let rx = self.db.subscribe_posts();
        let state = Subscription {
            feed: self.clone(),
            rx,
            primed: false,
        };

        stream::unfold(state, |mut state| async move {
            if state.primed {
                loop {
                    match state.rx.recv().await {
                        Ok(PostsChanged { key }) => {
                            tracing::debug!(post_id = %key, "Post collection changed");
                            break;
                        }
                        // Missed notifications still mean "something changed"
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "Feed subscriber lagged");
                            break;
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
            state.primed = true;

            let result = state.feed.assemble().await;
            Some((result, state))
        })
    }
}

struct Subscription {
    feed: FeedService,
    rx: broadcast::Receiver<PostsChanged>,
    primed: bool,
}

fn join(id: String, post: PostRecord, artist: &ArtistRecord) -> FeedEntry {
    let artist_data = AuthorSummary {
        stage_name: non_empty_or(&artist.details.stage_name, DEFAULT_STAGE_NAME),
        photo_url: non_empty_or(&artist.photo_url, DEFAULT_PHOTO_URL),
        art_form: non_empty_or(&artist.details.art_form, DEFAULT_ART_FORM),
    };

    FeedEntry {
        id,
        artist_id: post.artist_id,
        content: post.content,
        media_url: post.media_url,
        media_type: post.media_type,
        created_at: post.created_at,
        likes: post.likes,
        comments: post.comments,
        artist_data,
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
