#![allow(dead_code)]

use axum::body::Body;
use http_body_util::BodyExt;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use sunstone::store::NoteStore;

pub const ALLOWED_ORIGIN: &str = "http://localhost:5173";

pub struct TestApp {
    pub router: Router,
    pub store: NoteStore,
    pub db: SqlitePool,
}

pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create in-memory SQLite pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = test_pool().await;
        let store = NoteStore::new(pool.clone());
        let router = sunstone::build_app(store.clone(), &[ALLOWED_ORIGIN.to_string()]);

        Self {
            router,
            store,
            db: pool,
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a JSON request with the given method.
    pub async fn send_json(&self, method: &str, uri: &str, body: Value) -> Response {
        let req = Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(req).await
    }

    pub async fn patch(&self, uri: &str) -> Response {
        let req = Request::builder()
            .uri(uri)
            .method("PATCH")
            .body(Body::empty())
            .unwrap();
        self.request(req).await
    }

    pub async fn delete(&self, uri: &str) -> Response {
        let req = Request::builder()
            .uri(uri)
            .method("DELETE")
            .body(Body::empty())
            .unwrap();
        self.request(req).await
    }

    /// Create a note through the API and return its JSON.
    pub async fn create_note(&self, body: Value) -> Value {
        let resp = self.send_json("POST", "/notes", body).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await
    }
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_string(resp).await).unwrap()
}

pub fn ids(notes: &Value) -> Vec<String> {
    notes
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap().to_string())
        .collect()
}

/// A stored row written directly, bypassing the API.
pub struct SeedNote<'a> {
    pub title: &'a str,
    pub tags: &'a [&'a str],
    pub mood: &'a str,
    pub archived: bool,
    pub pinned: bool,
    pub updated_at: &'a str,
}

impl Default for SeedNote<'_> {
    fn default() -> Self {
        Self {
            title: "Seeded",
            tags: &[],
            mood: "neutro",
            archived: false,
            pinned: false,
            updated_at: "2024-01-01T00:00:00.000000Z",
        }
    }
}

/// Insert a row directly and return its id.
pub async fn seed_note(db: &SqlitePool, seed: SeedNote<'_>) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    let tags = serde_json::to_string(seed.tags).unwrap();
    sqlx::query(
        "INSERT INTO notes (id, title, content, tags, archived, pinned, mood, progress, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(seed.title)
    .bind(format!("<p>{} body</p>", seed.title))
    .bind(&tags)
    .bind(seed.archived)
    .bind(seed.pinned)
    .bind(seed.mood)
    .bind(0)
    .bind(seed.updated_at)
    .bind(seed.updated_at)
    .execute(db)
    .await
    .expect("Failed to seed note");
    id
}
