use axum::extract::FromRequest;

use crate::error::AppError;

pub mod accounts;
pub mod health;
pub mod news;
pub mod saved;

/// `Json` body extractor whose rejections use the API error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
