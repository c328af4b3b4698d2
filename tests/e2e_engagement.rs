//! E2E tests for comments, likes and the aggregated blog views

mod common;

use common::TestServer;
use serde_json::json;

#[tokio::test]
async fn test_comments() {
    let server = TestServer::new().await;
    let alice = server.signup("alice").await;
    let bob = server.signup("bob").await;
    let id = server.create_blog(&alice, "Hello", "World").await;

    let (status, body) = server
        .post(
            &format!("/api/blogs/{id}/comments"),
            Some(&bob),
            json!({"content": "Nice post"}),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(body["comment"]["blog_id"], id);
    server
        .post(
            &format!("/api/blogs/{id}/comments"),
            Some(&alice),
            json!({"content": "Thanks"}),
        )
        .await;

    let (status, body) = server
        .get(&format!("/api/blogs/{id}/comments"), Some(&bob))
        .await;
    assert_eq!(status, 200);
    let contents: Vec<&str> = body["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["Nice post", "Thanks"]);

    let (status, _) = server
        .post(
            "/api/blogs/9999/comments",
            Some(&bob),
            json!({"content": "lost"}),
        )
        .await;
    assert_eq!(status, 404);

    let (status, _) = server
        .post(
            &format!("/api/blogs/{id}/comments"),
            Some(&bob),
            json!({"content": ""}),
        )
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_double_like_is_rejected() {
    let server = TestServer::new().await;
    let alice = server.signup("alice").await;
    let id = server.create_blog(&alice, "Hello", "World").await;
    let path = format!("/api/blogs/{id}/likes");

    let (status, body) = server.post(&path, Some(&alice), json!({})).await;
    assert_eq!(status, 201);
    assert_eq!(body["like"]["blog_id"], id);

    let (status, body) = server.post(&path, Some(&alice), json!({})).await;
    assert_eq!(status, 409);
    assert_eq!(body["msg"], "Already liked");

    let (status, body) = server.get(&path, Some(&alice)).await;
    assert_eq!(status, 200);
    assert_eq!(body["likes"], 1);

    let (status, _) = server
        .post("/api/blogs/9999/likes", Some(&alice), json!({}))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_blogs_with_meta() {
    let server = TestServer::new().await;
    let alice = server.signup("alice").await;
    let bob = server.signup("bob").await;

    let rust = server.create_blog(&alice, "Rust", "borrow checker").await;
    server.create_blog(&alice, "Cooking", "pasta").await;
    server.create_blog(&bob, "Bob on rust", "lifetimes").await;

    server
        .post(&format!("/api/blogs/{rust}/likes"), Some(&bob), json!({}))
        .await;
    server
        .post(
            &format!("/api/blogs/{rust}/comments"),
            Some(&bob),
            json!({"content": "+1"}),
        )
        .await;

    let (status, body) = server
        .get("/api/blogs-with-meta?search=rust", Some(&alice))
        .await;
    assert_eq!(status, 200);
    let blogs = body["blogs"].as_array().unwrap();
    assert_eq!(blogs.len(), 1);
    assert_eq!(blogs[0]["likes"], 1);
    assert_eq!(blogs[0]["comments"][0]["content"], "+1");

    let (status, _) = server.get("/api/blogs-with-meta", None).await;
    assert_eq!(status, 401);

    // Public view spans every user and matches the post body too
    let (status, body) = server.get("/api/all-blogs-with-meta?search=pasta", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["blogs"].as_array().unwrap().len(), 1);

    let (_, body) = server.get("/api/all-blogs-with-meta?search=rust", None).await;
    assert_eq!(body["blogs"].as_array().unwrap().len(), 2);

    let (_, body) = server.get("/api/all-blogs-with-meta", None).await;
    assert_eq!(body["blogs"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_popular_blogs_top_five() {
    let server = TestServer::new().await;
    let mut tokens = Vec::new();
    for name in ["u1", "u2", "u3", "u4"] {
        tokens.push(server.signup(name).await);
    }

    let mut ids = Vec::new();
    for n in 0..7 {
        ids.push(
            server
                .create_blog(&tokens[0], &format!("Blog {n}"), "body")
                .await,
        );
    }

    // ids[3] gets 4 likes, ids[5] gets 3, ids[0..=2] and ids[6] get 1 each
    let likes = [
        (ids[3], 4),
        (ids[5], 3),
        (ids[0], 1),
        (ids[1], 1),
        (ids[2], 1),
        (ids[6], 1),
    ];
    for (id, count) in likes {
        for token in &tokens[..count] {
            server
                .post(&format!("/api/blogs/{id}/likes"), Some(token), json!({}))
                .await;
        }
    }

    let (status, body) = server.get("/api/popular-blogs", None).await;
    assert_eq!(status, 200);
    let ranked: Vec<(i64, i64)> = body["blogs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| (b["id"].as_i64().unwrap(), b["likes"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        ranked,
        vec![
            (ids[3], 4),
            (ids[5], 3),
            (ids[0], 1),
            (ids[1], 1),
            (ids[2], 1)
        ]
    );
}
