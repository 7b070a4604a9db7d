//! Drives the HTTP surface end to end against an in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{DateTime, TimeDelta};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use papo_core::{ManualClock, Session, sweep_once};
use papo_db::MemoryStore;
use papo_server::{AppStateInner, app};

struct TestApp {
    router: Router,
    session: Session,
    clock: Arc<ManualClock>,
}

fn test_app() -> TestApp {
    let clock = Arc::new(ManualClock::new(DateTime::from_timestamp(0, 0).unwrap()));
    let session = Session::new(Arc::new(MemoryStore::new()), clock.clone());
    let router = app(Arc::new(AppStateInner {
        session: session.clone(),
    }));
    TestApp { router, session, clock }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header("User", user.as_bytes());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(user) = user {
        builder = builder.header("User", user.as_bytes());
    }
    builder.body(Body::empty()).unwrap()
}

async fn join(router: &Router, name: &str) -> StatusCode {
    send(router, post_json("/participants", None, json!({ "name": name }))).await.0
}

#[tokio::test]
async fn join_conflict_and_roster() {
    let t = test_app();
    assert_eq!(join(&t.router, "Ann").await, StatusCode::CREATED);
    assert_eq!(join(&t.router, "Ann").await, StatusCode::CONFLICT);
    assert_eq!(join(&t.router, "").await, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&t.router, get("/participants", None)).await;
    assert_eq!(status, StatusCode::OK);
    let roster = body.as_array().unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0]["name"], "Ann");
}

#[tokio::test]
async fn joined_notice_is_visible() {
    let t = test_app();
    join(&t.router, "Ann").await;

    let (status, body) = send(&t.router, get("/messages", Some("Ann"))).await;
    assert_eq!(status, StatusCode::OK);
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["from"], "Ann");
    assert_eq!(messages[0]["to"], "Todos");
    assert_eq!(messages[0]["text"], "joined");
    assert_eq!(messages[0]["kind"], "status");
}

#[tokio::test]
async fn posting_requires_membership() {
    let t = test_app();
    let msg = json!({ "to": "Bob", "text": "hi", "type": "chat" });

    let (status, _) = send(&t.router, post_json("/messages", Some("Ann"), msg.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&t.router, post_json("/messages", None, msg.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    join(&t.router, "Ann").await;
    let (status, body) = send(&t.router, post_json("/messages", Some("Ann"), msg)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().unwrap() > 0);

    let status_msg = json!({ "to": "Todos", "text": "left", "type": "status" });
    let (status, _) = send(&t.router, post_json("/messages", Some("Ann"), status_msg)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn message_listing_filters_and_limits() {
    let t = test_app();
    for name in ["Ann", "Bob", "Cid"] {
        join(&t.router, name).await;
    }
    let posts = [
        ("Ann", json!({ "to": "Bob", "text": "for bob", "type": "private_chat" })),
        ("Bob", json!({ "to": "Cid", "text": "for cid", "type": "private_chat" })),
        ("Cid", json!({ "to": "Todos", "text": "for all", "type": "chat" })),
    ];
    for (from, body) in posts {
        let (status, _) = send(&t.router, post_json("/messages", Some(from), body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&t.router, get("/messages", Some("Ann"))).await;
    let texts: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["for all", "for bob", "joined", "joined", "joined"]);

    let (status, body) = send(&t.router, get("/messages?limit=2", Some("Ann"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    for bad in ["/messages?limit=0", "/messages?limit=-4", "/messages?limit=many"] {
        let (status, _) = send(&t.router, get(bad, Some("Ann"))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", bad);
    }

    let (status, _) = send(&t.router, get("/messages", None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = send(&t.router, get("/messages", Some("Zed"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn heartbeat_and_eviction() {
    let t = test_app();
    join(&t.router, "Ann").await;

    let (status, _) = send(&t.router, post_json("/status", Some("Bob"), json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&t.router, post_json("/status", None, json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    t.clock.advance(TimeDelta::seconds(9));
    let (status, _) = send(&t.router, post_json("/status", Some("Ann"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    t.clock.advance(TimeDelta::seconds(9));
    let report = sweep_once(t.session.registry(), TimeDelta::seconds(10)).await;
    assert!(report.evicted.is_empty());

    t.clock.advance(TimeDelta::seconds(2));
    let report = sweep_once(t.session.registry(), TimeDelta::seconds(10)).await;
    assert_eq!(report.evicted, vec!["Ann".to_string()]);

    let (_, body) = send(&t.router, get("/participants", None)).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send(&t.router, post_json("/status", Some("Ann"), json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Rejoining works and the departure notice is in the log
    assert_eq!(join(&t.router, "Ann").await, StatusCode::CREATED);
    let (_, body) = send(&t.router, get("/messages?limit=2", Some("Ann"))).await;
    let texts: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["joined", "left"]);
}

#[tokio::test]
async fn non_ascii_names_can_use_the_user_header() {
    let t = test_app();
    assert_eq!(join(&t.router, "João").await, StatusCode::CREATED);

    let (status, _) = send(&t.router, post_json("/status", Some("João"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let msg = json!({ "to": "Todos", "text": "olá", "type": "chat" });
    let (status, _) = send(&t.router, post_json("/messages", Some("João"), msg)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&t.router, get("/messages", Some("João"))).await;
    assert_eq!(status, StatusCode::OK);
    let latest = &body.as_array().unwrap()[0];
    assert_eq!(latest["from"], "João");
    assert_eq!(latest["text"], "olá");
}
