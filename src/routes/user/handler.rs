use axum::{
    Extension,
    extract::{Json, State},
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    cache::CachedUser,
    error::AppResult,
    services::{
        token,
        user::{self, LoginRequest, RegisterRequest},
    },
    utils::success_to_api_response,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let user = user::register(&state, req).await?;
    tracing::info!("Registered user {}", user.id);

    let (jar, resp) = token::send_token(&state, jar, user).await?;
    Ok((jar, success_to_api_response(resp)))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let user = user::login(&state, req).await?;
    tracing::info!("User {} logged in", user.id);

    let (jar, resp) = token::send_token(&state, jar, user).await?;
    Ok((jar, success_to_api_response(resp)))
}

#[axum::debug_handler]
pub async fn refresh_token(State(state): State<AppState>, jar: CookieJar) -> AppResult<impl IntoResponse> {
    let (jar, resp) = token::refresh(&state, jar).await?;
    Ok((jar, success_to_api_response(resp)))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CachedUser>,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let jar = token::logout(&state, jar, user.id).await?;
    Ok((jar, success_to_api_response("已退出登录")))
}

pub async fn me(Extension(user): Extension<CachedUser>) -> impl IntoResponse {
    success_to_api_response(user)
}
