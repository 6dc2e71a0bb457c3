use axum::{extract::State, routing::get, Json, Router};

use crate::error::AppError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/tags", get(list_tags))
}

async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.store.list_distinct_tags().await?))
}
