pub mod notes;
pub mod tags;

use axum::extract::FromRequest;

use crate::error::{AppError, MessageError};

/// JSON body extractor whose rejections render as 400 `{"error"}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// JSON body extractor whose rejections render as 400 `{"message"}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(MessageError))]
pub struct MessageJson<T>(pub T);
