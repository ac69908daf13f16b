use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    cache::CachedUser,
    error::AppResult,
    middleware::Viewer,
    services::{
        course::{self, CreateCourseRequest, UpdateCourseRequest},
        course_read::{self, CourseSummary},
    },
    utils::success_to_api_response,
};

#[axum::debug_handler]
pub async fn list_courses(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let courses: Vec<CourseSummary> = course::list_courses(&state)
        .await?
        .into_iter()
        .map(CourseSummary::from)
        .collect();

    Ok(success_to_api_response(courses))
}

#[axum::debug_handler]
pub async fn get_course(
    State(state): State<AppState>,
    Extension(Viewer(viewer)): Extension<Viewer>,
    Path(course_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let view = course_read::get_course_view(&state, course_id, viewer.as_ref()).await?;
    Ok(success_to_api_response(view))
}

#[axum::debug_handler]
pub async fn create_course(
    State(state): State<AppState>,
    Extension(user): Extension<CachedUser>,
    Json(req): Json<CreateCourseRequest>,
) -> AppResult<impl IntoResponse> {
    let detail = course::create_course(&state, &user, req).await?;
    Ok((StatusCode::CREATED, success_to_api_response(detail)))
}

#[axum::debug_handler]
pub async fn update_course(
    State(state): State<AppState>,
    Extension(user): Extension<CachedUser>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<UpdateCourseRequest>,
) -> AppResult<impl IntoResponse> {
    let detail = course::update_course(&state, &user, course_id, req).await?;
    Ok(success_to_api_response(detail))
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub is_published: bool,
}

#[axum::debug_handler]
pub async fn publish_course(
    State(state): State<AppState>,
    Extension(user): Extension<CachedUser>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<PublishRequest>,
) -> AppResult<impl IntoResponse> {
    let detail = course::publish_course(&state, &user, course_id, req.is_published).await?;
    Ok(success_to_api_response(detail))
}
