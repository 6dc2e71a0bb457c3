mod common;

use axum::http::{Request, StatusCode};
use axum::body::Body;
use common::{body_json, ids, seed_note, SeedNote, TestApp, ALLOWED_ORIGIN};
use serde_json::json;

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new().await;
    let resp = app.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "ok": true }));
}

#[tokio::test]
async fn create_derives_title_and_applies_defaults() {
    let app = TestApp::new().await;
    let note = app.create_note(json!({ "content": "<p>Hello</p>" })).await;

    assert_eq!(note["title"], "Hello");
    assert_eq!(note["progress"], 0);
    assert_eq!(note["mood"], "neutro");
    assert_eq!(note["archived"], false);
    assert_eq!(note["pinned"], false);
    assert_eq!(note["tags"], json!([]));
    assert_eq!(note["createdAt"], note["updatedAt"]);
    assert!(uuid::Uuid::parse_str(note["id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn create_with_empty_visual_content_is_rejected() {
    let app = TestApp::new().await;
    let resp = app
        .send_json("POST", "/notes", json!({ "title": "", "content": "<p><br></p>" }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "content must not be empty");

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notes")
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn create_with_malformed_body_is_bad_request() {
    let app = TestApp::new().await;
    let req = Request::builder()
        .uri("/notes")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.request(req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());

    let resp = app
        .send_json("POST", "/notes", json!({ "content": "<p>x</p>", "progress": 30 }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_accepts_legacy_mood_and_extra_fields() {
    let app = TestApp::new().await;
    let note = app
        .create_note(json!({
            "title": "Trip",
            "content": "<p>Pack bags</p>",
            "tags": ["travel"],
            "mood": "excited",
            "progress": 25,
            "attachments": [{ "type": "link", "url": "https://example.com" }]
        }))
        .await;
    assert_eq!(note["title"], "Trip");
    assert_eq!(note["mood"], "animado");
    assert_eq!(note["progress"], 25);
    assert_eq!(note["attachments"][0]["type"], "link");
}

#[tokio::test]
async fn get_round_trips_created_note() {
    let app = TestApp::new().await;
    let created = app
        .create_note(json!({ "content": "<p>Round trip</p>", "tags": ["a", "b"], "mood": "feliz" }))
        .await;

    let resp = app.get(&format!("/notes/{}", created["id"].as_str().unwrap())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, created);
}

#[tokio::test]
async fn get_distinguishes_missing_from_malformed_ids() {
    let app = TestApp::new().await;

    let resp = app.get(&format!("/notes/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_json(resp).await["message"].is_string());

    let resp = app.get("/notes/not-an-id").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["message"].is_string());
}

#[tokio::test]
async fn list_orders_pinned_first_then_recent() {
    let app = TestApp::new().await;
    let old = seed_note(&app.db, SeedNote { updated_at: "2024-01-01T00:00:00.000000Z", ..Default::default() }).await;
    let new = seed_note(&app.db, SeedNote { updated_at: "2024-03-01T00:00:00.000000Z", ..Default::default() }).await;
    let pinned = seed_note(
        &app.db,
        SeedNote { pinned: true, updated_at: "2023-01-01T00:00:00.000000Z", ..Default::default() },
    )
    .await;

    let resp = app.get("/notes").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ids(&body_json(resp).await), vec![pinned, new, old]);
}

#[tokio::test]
async fn list_filters_by_archived_flag() {
    let app = TestApp::new().await;
    let active = seed_note(&app.db, SeedNote::default()).await;
    let archived = seed_note(&app.db, SeedNote { archived: true, ..Default::default() }).await;

    let all = body_json(app.get("/notes").await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let only_archived = body_json(app.get("/notes?archived=true").await).await;
    assert_eq!(ids(&only_archived), vec![archived.clone()]);

    let resp = app.patch(&format!("/notes/{active}/archive")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["archived"], true);

    let resp = app.patch(&format!("/notes/{archived}/archive")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let active_now = body_json(app.get("/notes?archived=false").await).await;
    assert_eq!(ids(&active_now), vec![archived]);
}

#[tokio::test]
async fn list_free_text_matches_title_or_content() {
    let app = TestApp::new().await;
    let groceries = app
        .create_note(json!({ "title": "Groceries", "content": "<p>milk, eggs</p>" }))
        .await;
    let work = app
        .create_note(json!({ "title": "Work", "content": "<p>Buy MILK for office</p>" }))
        .await;
    app.create_note(json!({ "title": "Ideas", "content": "<p>nothing here</p>" }))
        .await;

    let found = body_json(app.get("/notes?q=Milk").await).await;
    let mut found = ids(&found);
    found.sort();
    let mut expected = vec![
        groceries["id"].as_str().unwrap().to_string(),
        work["id"].as_str().unwrap().to_string(),
    ];
    expected.sort();
    assert_eq!(found, expected);

    let found = body_json(app.get("/notes?q=grocer").await).await;
    assert_eq!(ids(&found), vec![groceries["id"].as_str().unwrap().to_string()]);
}

#[tokio::test]
async fn list_tags_filter_requires_every_tag() {
    let app = TestApp::new().await;
    let both = seed_note(&app.db, SeedNote { tags: &["a", "b", "c"], ..Default::default() }).await;
    seed_note(&app.db, SeedNote { tags: &["a"], ..Default::default() }).await;
    seed_note(&app.db, SeedNote { tags: &[], ..Default::default() }).await;

    let found = body_json(app.get("/notes?tags=a,%20b").await).await;
    assert_eq!(ids(&found), vec![both]);

    let everything = body_json(app.get("/notes?tags=,").await).await;
    assert_eq!(everything.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn list_mood_filter_includes_legacy_records() {
    let app = TestApp::new().await;
    let current = seed_note(
        &app.db,
        SeedNote { mood: "feliz", updated_at: "2024-02-01T00:00:00.000000Z", ..Default::default() },
    )
    .await;
    let legacy = seed_note(&app.db, SeedNote { mood: "happy", ..Default::default() }).await;
    seed_note(&app.db, SeedNote { mood: "triste", ..Default::default() }).await;

    let found = body_json(app.get("/notes?mood=feliz").await).await;
    assert_eq!(ids(&found), vec![current, legacy]);
    // Legacy spelling is normalized on the way out.
    assert_eq!(found[1]["mood"], "feliz");
}

#[tokio::test]
async fn update_merges_patch_and_refreshes_timestamp() {
    let app = TestApp::new().await;
    let created = app
        .create_note(json!({ "title": "Draft", "content": "<p>First</p>", "tags": ["x"] }))
        .await;
    let id = created["id"].as_str().unwrap();

    let resp = app
        .send_json(
            "PUT",
            &format!("/notes/{id}"),
            json!({ "title": "Final", "updatedAt": "1999-01-01T00:00:00Z", "createdAt": "1999-01-01T00:00:00Z" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;

    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["content"], "<p>First</p>");
    assert_eq!(updated["tags"], json!(["x"]));
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert!(updated["updatedAt"].as_str().unwrap() > created["updatedAt"].as_str().unwrap());
}

#[tokio::test]
async fn update_rejects_empty_content_and_unknown_notes() {
    let app = TestApp::new().await;
    let created = app.create_note(json!({ "content": "<p>Keep me</p>" })).await;
    let id = created["id"].as_str().unwrap();

    let resp = app
        .send_json("PUT", &format!("/notes/{id}"), json!({ "content": "<p>&nbsp;</p>" }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());

    let resp = app
        .send_json("PUT", &format!("/notes/{}", uuid::Uuid::new_v4()), json!({ "title": "x" }))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_json(resp).await["error"].is_string());
}

#[tokio::test]
async fn toggle_pin_twice_restores_value() {
    let app = TestApp::new().await;
    let created = app.create_note(json!({ "content": "<p>Pin me</p>" })).await;
    let id = created["id"].as_str().unwrap();

    let first = body_json(app.patch(&format!("/notes/{id}/pin")).await).await;
    assert_eq!(first["pinned"], true);
    let second = body_json(app.patch(&format!("/notes/{id}/pin")).await).await;
    assert_eq!(second["pinned"], false);

    let t0 = created["updatedAt"].as_str().unwrap();
    let t1 = first["updatedAt"].as_str().unwrap();
    let t2 = second["updatedAt"].as_str().unwrap();
    assert!(t0 < t1 && t1 < t2);

    let resp = app.patch(&format!("/notes/{}/pin", uuid::Uuid::new_v4())).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn progress_only_accepts_allowed_values() {
    let app = TestApp::new().await;
    let created = app.create_note(json!({ "content": "<p>Task</p>" })).await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/notes/{id}/progress");

    let resp = app.send_json("PATCH", &uri, json!({ "progress": 30 })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["message"].is_string());

    let resp = app.send_json("PATCH", &uri, json!({ "progress": 50 })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["progress"], 50);

    let stored = body_json(app.get(&format!("/notes/{id}")).await).await;
    assert_eq!(stored["progress"], 50);

    let resp = app
        .send_json("PATCH", &format!("/notes/{}/progress", uuid::Uuid::new_v4()), json!({ "progress": 25 }))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_is_permanent() {
    let app = TestApp::new().await;
    let created = app.create_note(json!({ "content": "<p>Bye</p>" })).await;
    let id = created["id"].as_str().unwrap();

    let resp = app.delete(&format!("/notes/{id}")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.get(&format!("/notes/{id}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.delete(&format!("/notes/{id}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.delete("/notes/12345").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn foreign_origins_are_rejected() {
    let app = TestApp::new().await;

    let req = Request::builder()
        .uri("/health")
        .header("origin", "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let resp = app.request(req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = Request::builder()
        .uri("/health")
        .header("origin", ALLOWED_ORIGIN)
        .body(Body::empty())
        .unwrap();
    let resp = app.request(req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        ALLOWED_ORIGIN
    );
}
