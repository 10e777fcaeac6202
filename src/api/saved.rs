use axum::{extract::State, http::StatusCode, Extension, Json};

use super::ApiJson;

use crate::{
    app::AppState,
    auth::CurrentUser,
    error::AppResult,
    model::{SaveArticlePayload, SavedArticleOut},
    service,
};

pub async fn save_article(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<SaveArticlePayload>,
) -> AppResult<(StatusCode, Json<SavedArticleOut>)> {
    let saved = service::saved::save(state.store.as_ref(), user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn list_saved(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<SavedArticleOut>>> {
    let articles = service::saved::list(state.store.as_ref(), user.id).await?;
    Ok(Json(articles))
}
