use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    cache::CachedUser,
    error::AppResult,
    services::{
        changes::ChapterPatch,
        chapter::{self, CreateChapterRequest, UpdateVideoRequest},
    },
    utils::success_to_api_response,
};

#[axum::debug_handler]
pub async fn create_chapter(
    State(state): State<AppState>,
    Extension(user): Extension<CachedUser>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<CreateChapterRequest>,
) -> AppResult<impl IntoResponse> {
    let detail = chapter::create_chapter(&state, &user, course_id, req).await?;
    Ok((StatusCode::CREATED, success_to_api_response(detail)))
}

#[axum::debug_handler]
pub async fn update_chapter(
    State(state): State<AppState>,
    Extension(user): Extension<CachedUser>,
    Path((course_id, chapter_id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<ChapterPatch>,
) -> AppResult<impl IntoResponse> {
    let chapter = chapter::update_chapter(&state, &user, course_id, chapter_id, patch).await?;
    Ok(success_to_api_response(chapter))
}

#[axum::debug_handler]
pub async fn update_video(
    State(state): State<AppState>,
    Extension(user): Extension<CachedUser>,
    Path((course_id, chapter_id, video_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(req): Json<UpdateVideoRequest>,
) -> AppResult<impl IntoResponse> {
    let video = chapter::update_video(&state, &user, course_id, chapter_id, video_id, req).await?;
    Ok(success_to_api_response(video))
}
