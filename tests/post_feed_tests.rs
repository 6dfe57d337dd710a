// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Post creation and feed tests.
//!
//! Posts are created through the multipart route; the feed is read back
//! both as a snapshot and through the SSE stream.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use eventgenie_api::models::PostRecord;
use futures_util::StreamExt;
use std::time::Duration;
use tower::ServiceExt;

mod common;
use common::Part;

fn post_request(cookie: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/posts")
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, common::multipart_content_type())
        .body(Body::from(common::multipart_body(parts)))
        .unwrap()
}

fn get_request(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post(artist_id: &str, content: &str, created_at: &str) -> PostRecord {
    PostRecord {
        artist_id: artist_id.to_string(),
        content: content.to_string(),
        media_url: None,
        media_type: None,
        created_at: created_at.to_string(),
        likes: 0,
        comments: 0,
    }
}

#[tokio::test]
async fn test_create_text_post() {
    let (app, state) = common::create_test_app();
    let key = common::seed_artist(&state, "a1", "band@example.com", "The Band").await;
    let cookie = common::session_cookie(&state, &common::identity("a1", Some("band@example.com")));

    let response = app
        .oneshot(post_request(
            &cookie,
            &[Part {
                name: "content",
                file: None,
                data: b"Playing the pier on Friday",
            }],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::json_body(response).await;
    assert_eq!(body["artistId"], key);
    assert_eq!(body["content"], "Playing the pier on Friday");
    assert_eq!(body["likes"], 0);
    assert!(body.get("mediaUrl").is_none());

    let posts = state.db.list_posts().await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, body["id"].as_str().unwrap());
}

#[tokio::test]
async fn test_create_media_post() {
    let (app, state) = common::create_test_app();
    common::seed_artist(&state, "a1", "band@example.com", "The Band").await;
    let cookie = common::session_cookie(&state, &common::identity("a1", Some("band@example.com")));

    let response = app
        .oneshot(post_request(
            &cookie,
            &[
                Part {
                    name: "content",
                    file: None,
                    data: b"New single",
                },
                Part {
                    name: "media",
                    file: Some(("single.mp3", "audio/mpeg")),
                    data: b"ID3fakeaudio",
                },
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::json_body(response).await;
    assert_eq!(body["mediaType"], "audio");
    let url = body["mediaUrl"].as_str().unwrap();
    assert!(url.starts_with("memory://posts/bandATexample_com/"));
    assert!(url.ends_with("-single.mp3"));
}

#[tokio::test]
async fn test_post_rejections() {
    let (app, state) = common::create_test_app();
    common::seed_artist(&state, "a1", "band@example.com", "The Band").await;
    let artist = common::session_cookie(&state, &common::identity("a1", Some("band@example.com")));
    let fan = common::session_cookie(&state, &common::identity("f1", Some("fan@example.com")));

    let empty = [Part {
        name: "content",
        file: None,
        data: b"  ",
    }];
    let response = app.clone().oneshot(post_request(&artist, &empty)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let pdf = [Part {
        name: "media",
        file: Some(("rider.pdf", "application/pdf")),
        data: b"%PDF",
    }];
    let response = app.clone().oneshot(post_request(&artist, &pdf)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let text = [Part {
        name: "content",
        file: None,
        data: b"I am not an artist",
    }];
    let response = app.oneshot(post_request(&fan, &text)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert!(state.db.list_posts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_feed_newest_first_with_author_data() {
    let (app, state) = common::create_test_app();
    let band = common::seed_artist(&state, "a1", "band@example.com", "The Band").await;
    let solo = common::seed_artist(&state, "a2", "solo@example.com", "").await;

    state
        .db
        .set_post("1", &post(&band, "first", "2025-01-01T10:00:00.000Z"))
        .await
        .unwrap();
    state
        .db
        .set_post("2", &post(&solo, "second", "2025-01-02T10:00:00.000Z"))
        .await
        .unwrap();
    state
        .db
        .set_post("3", &post("ghostATexample_com", "orphan", "2025-01-03T10:00:00.000Z"))
        .await
        .unwrap();

    let cookie = common::session_cookie(&state, &common::identity("fan", None));
    let response = app.oneshot(get_request("/api/feed", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::json_body(response).await;
    let feed = body.as_array().unwrap();
    assert_eq!(feed.len(), 2, "orphaned post is dropped");

    assert_eq!(feed[0]["id"], "2");
    assert_eq!(feed[0]["artistData"]["stageName"], "Unknown Artist");
    assert_eq!(feed[0]["artistData"]["photoUrl"], "/default-avatar.png");
    assert_eq!(feed[0]["artistData"]["artForm"], "Artist");

    assert_eq!(feed[1]["id"], "1");
    assert_eq!(feed[1]["artistData"]["stageName"], "The Band");
}

#[tokio::test]
async fn test_feed_stream_pushes_updates() {
    let (app, state) = common::create_test_app();
    let band = common::seed_artist(&state, "a1", "band@example.com", "The Band").await;
    let cookie = common::session_cookie(&state, &common::identity("fan", None));

    let response = app
        .oneshot(get_request("/api/feed/stream", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    let mut body = response.into_body().into_data_stream();

    let first = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("initial feed event")
        .unwrap()
        .unwrap();
    let first = String::from_utf8(first.to_vec()).unwrap();
    assert!(first.contains("event: feed"));
    assert!(first.contains("data: []"));

    state
        .db
        .set_post("10", &post(&band, "hello", "2025-02-01T00:00:00.000Z"))
        .await
        .unwrap();

    let next = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("feed event after post")
        .unwrap()
        .unwrap();
    let next = String::from_utf8(next.to_vec()).unwrap();
    assert!(next.contains("event: feed"));
    assert!(next.contains("\"content\":\"hello\""));
}
