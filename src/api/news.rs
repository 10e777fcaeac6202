use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    app::AppState,
    error::{AppError, AppResult},
    model::{NewsItemOut, SearchQuery},
};

pub async fn latest(State(state): State<AppState>) -> AppResult<Json<Vec<NewsItemOut>>> {
    let items = state.news.latest().await?;
    Ok(Json(items))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<NewsItemOut>>> {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("search query 'q' is required".into()))?;

    let items = state.news.search(q).await?;
    Ok(Json(items))
}
