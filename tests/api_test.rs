use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::NaiveDate;
use repertoire::config::Config;
use repertoire::http::{HttpState, make_router};
use repertoire::photos::{FsPhotoStorage, PhotoStorage};
use repertoire::repertoire::duration::Duration;
use repertoire::repertoire::models::{ItemDraft, Kind, Rating};
use repertoire::store::ItemStore;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

const TOKEN: &str = "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b";

struct TestApp {
    _dir: TempDir,
    store: ItemStore,
    photos: Arc<FsPhotoStorage>,
    router: Router,
}

fn app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let store = ItemStore::open(dir.path());
    let photos = Arc::new(FsPhotoStorage::new(dir.path().join("media")));

    let mut config = Config::default();
    config.api.token = Some(TOKEN.to_string());

    let state = HttpState::new(store.clone(), photos.clone());
    let router = make_router(state, &config);

    TestApp {
        _dir: dir,
        store,
        photos,
        router,
    }
}

fn draft(name: &str, kind: Kind, review: &str) -> ItemDraft {
    ItemDraft {
        name: name.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        rating: Rating::new(5).unwrap(),
        review: review.to_string(),
        kind,
        duration: Some(Duration::from_seconds(7200)),
        season: None,
        photo: None,
    }
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Token {}", TOKEN));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_requires_token() {
    let app = app();

    let resp = app
        .router
        .clone()
        .oneshot(Request::get("/api/items").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Token");

    let wrong = Request::get("/api/items")
        .header(header::AUTHORIZATION, "Token nope")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid token.");
}

#[tokio::test]
async fn test_unconfigured_token_rejects_api() {
    let dir = TempDir::new().unwrap();
    let state = HttpState::new(
        ItemStore::open(dir.path()),
        Arc::new(FsPhotoStorage::new(dir.path().join("media"))),
    );
    let router = make_router(state, &Config::default());

    let (status, _) = send(&router, request("GET", "/api/items", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_with_search_and_kind() {
    let app = app();
    app.store
        .create(draft("Dark", Kind::Series, "German time travel"))
        .unwrap();
    app.store
        .create(draft("Alien", Kind::Movie, "Dark and tense"))
        .unwrap();
    app.store.create(draft("Heat", Kind::Movie, "Long")).unwrap();

    let (status, body) = send(&app.router, request("GET", "/api/items", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[0]["id"], 1);
    assert_eq!(body[0]["duration"], 7200);
    assert_eq!(body[0]["photo_url"], Value::Null);

    let (_, body) = send(&app.router, request("GET", "/api/items?search=dark", None)).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Dark", "Alien"]);

    let (_, body) = send(
        &app.router,
        request("GET", "/api/items?search=dark&kind=MOVIE", None),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Alien");
}

#[tokio::test]
async fn test_get_unknown_item() {
    let app = app();

    let (status, body) = send(&app.router, request("GET", "/api/items/42", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Not found.");
}

#[tokio::test]
async fn test_patch_normalizes_duration() {
    let app = app();
    app.store.create(draft("Heat", Kind::Movie, "Long")).unwrap();

    let (status, body) = send(
        &app.router,
        request("PATCH", "/api/items/1", Some(json!({"duration": "2:50:12"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duration"], 2 * 3600 + 50 * 60);
    assert_eq!(body["name"], "Heat");

    let stored = app.store.get(1).unwrap().unwrap();
    assert_eq!(stored.duration, Some(Duration::from_seconds(10_200)));

    let (_, body) = send(
        &app.router,
        request("PATCH", "/api/items/1", Some(json!({"duration": 5401}))),
    )
    .await;
    assert_eq!(body["duration"], 5400);
}

#[tokio::test]
async fn test_patch_invalid_duration_is_rejected() {
    let app = app();
    app.store.create(draft("Heat", Kind::Movie, "Long")).unwrap();

    let (status, body) = send(
        &app.router,
        request("PATCH", "/api/items/1", Some(json!({"duration": "1:5"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["duration"][0],
        "Invalid duration format '1:5'. Use HH:MM or HH:MM:SS."
    );

    let stored = app.store.get(1).unwrap().unwrap();
    assert_eq!(stored.duration, Some(Duration::from_seconds(7200)));
}

#[tokio::test]
async fn test_patch_null_clears_and_absent_keeps() {
    let app = app();
    let mut seeded = draft("Dark", Kind::Series, "Time travel");
    seeded.season = Some(3);
    app.store.create(seeded).unwrap();

    let (status, body) = send(
        &app.router,
        request("PATCH", "/api/items/1", Some(json!({"rating": 3}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 3);
    assert_eq!(body["duration"], 7200);
    assert_eq!(body["season"], 3);

    let (_, body) = send(
        &app.router,
        request(
            "PATCH",
            "/api/items/1",
            Some(json!({"duration": null, "season": null})),
        ),
    )
    .await;
    assert_eq!(body["duration"], Value::Null);
    assert_eq!(body["season"], Value::Null);
}

#[tokio::test]
async fn test_patch_field_validation() {
    let app = app();
    app.store.create(draft("Heat", Kind::Movie, "Long")).unwrap();

    let (status, body) = send(
        &app.router,
        request(
            "PATCH",
            "/api/items/1",
            Some(json!({"name": "x".repeat(101), "rating": 6, "season": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["rating"].is_array());

    let (status, body) = send(
        &app.router,
        request(
            "PATCH",
            "/api/items/1",
            Some(json!({"name": "x".repeat(101), "season": 0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["name"].is_array());
    assert!(body["season"].is_array());
}

#[tokio::test]
async fn test_put_requires_all_fields() {
    let app = app();
    app.store.create(draft("Heat", Kind::Movie, "Long")).unwrap();

    let (status, body) = send(
        &app.router,
        request("PUT", "/api/items/1", Some(json!({"name": "Heat (1995)"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["date"][0], "This field is required.");
    assert_eq!(body["rating"][0], "This field is required.");
    assert_eq!(body["review"][0], "This field is required.");

    let (status, body) = send(
        &app.router,
        request(
            "PUT",
            "/api/items/1",
            Some(json!({
                "name": "Heat (1995)",
                "date": "2024-07-04",
                "rating": 4,
                "review": "Still long.",
                "kind": "MOVIE",
                "duration": "2:50"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Heat (1995)");
    assert_eq!(body["date"], "2024-07-04");
    assert_eq!(body["duration"], 10_200);
}

#[tokio::test]
async fn test_malformed_json() {
    let app = app();
    app.store.create(draft("Heat", Kind::Movie, "Long")).unwrap();

    let req = Request::builder()
        .method("PATCH")
        .uri("/api/items/1")
        .header(header::AUTHORIZATION, format!("Token {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_update_unknown_item() {
    let app = app();

    let (status, _) = send(
        &app.router,
        request("PATCH", "/api/items/9", Some(json!({"rating": 2}))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_removes_item_and_photo() {
    let app = app();
    let photo = app.photos.save("poster.png", b"\x89PNG").unwrap();
    let mut seeded = draft("Alien", Kind::Movie, "Tense");
    seeded.photo = Some(photo.clone());
    app.store.create(seeded).unwrap();

    let (status, body) = send(&app.router, request("GET", "/api/items/1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["photo_url"], "/photos/poster.png");

    let (status, _) = send(&app.router, request("DELETE", "/api/items/1", None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(app.store.get(1).unwrap().is_none());
    assert!(app.photos.open(&photo).unwrap().is_none());

    let (status, _) = send(&app.router, request("DELETE", "/api/items/1", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_patches_keep_both_edits() {
    let app = app();

    for round in 1..=10u64 {
        let created = app
            .store
            .create(draft("Heat", Kind::Movie, "Long"))
            .unwrap();
        assert_eq!(created.id, round);
        let uri = format!("/api/items/{}", created.id);

        let (name, review) = tokio::join!(
            send(&app.router, request("PATCH", &uri, Some(json!({"name": "A"})))),
            send(&app.router, request("PATCH", &uri, Some(json!({"review": "B"})))),
        );
        assert_eq!(name.0, StatusCode::OK);
        assert_eq!(review.0, StatusCode::OK);

        let stored = app.store.get(created.id).unwrap().unwrap();
        assert_eq!((stored.name.as_str(), stored.review.as_str()), ("A", "B"));
    }
}

#[tokio::test]
async fn test_long_duration_from_seconds() {
    let app = app();
    app.store.create(draft("Shoah", Kind::Movie, "Long")).unwrap();

    let (status, body) = send(
        &app.router,
        request("PATCH", "/api/items/1", Some(json!({"duration": 360_059}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duration"], 360_000);

    let (status, body) = send(
        &app.router,
        request("PATCH", "/api/items/1", Some(json!({"rating": 2}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duration"], 360_000);
}
