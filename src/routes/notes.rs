use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, MessageError};
use crate::models::{NewNote, Note, NotePatch};
use crate::query::NoteQuery;
use crate::routes::{AppJson, MessageJson};
use crate::AppState;

#[derive(Deserialize)]
struct ProgressBody {
    progress: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/{id}", get(get_note).put(update_note).delete(delete_note))
        .route("/notes/{id}/pin", patch(toggle_pin))
        .route("/notes/{id}/archive", patch(toggle_archive))
        .route("/notes/{id}/progress", patch(set_progress))
}

async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<NoteQuery>,
) -> Result<Json<Vec<Note>>, AppError> {
    let filter = query.to_filter();
    Ok(Json(state.store.list(&filter).await?))
}

async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>, MessageError> {
    Ok(Json(state.store.get_by_id(&id).await?))
}

async fn create_note(
    State(state): State<AppState>,
    AppJson(fields): AppJson<NewNote>,
) -> Result<impl IntoResponse, AppError> {
    let note = state.store.create(fields).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<NotePatch>,
) -> Result<Json<Note>, AppError> {
    Ok(Json(state.store.update(&id, patch).await?))
}

async fn toggle_pin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>, AppError> {
    Ok(Json(state.store.toggle_pin(&id).await?))
}

async fn toggle_archive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>, AppError> {
    Ok(Json(state.store.toggle_archive(&id).await?))
}

async fn set_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    MessageJson(body): MessageJson<ProgressBody>,
) -> Result<Json<Note>, MessageError> {
    Ok(Json(state.store.set_progress(&id, body.progress).await?))
}

async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
