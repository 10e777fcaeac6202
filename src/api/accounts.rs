use axum::{extract::State, http::StatusCode, Json};

use super::ApiJson;

use crate::{
    app::AppState,
    error::{AppError, AppResult},
    model::{
        RefreshPayload, RefreshResponse, RegisterPayload, RegisterResponse, TokenPayload,
        TokenResponse,
    },
    service,
};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterPayload>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let user = service::users::register(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenPayload>,
) -> AppResult<Json<TokenResponse>> {
    let tokens = service::users::login(state.store.as_ref(), &state.sessions, payload).await?;
    Ok(Json(tokens))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshPayload>,
) -> AppResult<Json<RefreshResponse>> {
    let access = state
        .sessions
        .refresh(&payload.refresh)
        .await
        .ok_or_else(|| AppError::Unauthorized("token is invalid or expired".into()))?;

    Ok(Json(RefreshResponse {
        access,
        expires_in: state.sessions.access_ttl_secs(),
    }))
}
