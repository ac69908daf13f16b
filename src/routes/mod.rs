pub mod chapter;
pub mod course;
pub mod user;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
};

use crate::{
    AppState,
    middleware::{auth_middleware, optional_auth},
};

/// 组装全部 API 路由，挂载在 `api_base_uri` 下
pub fn create_router(state: AppState) -> Router {
    // 公开路由
    let public_routes = Router::new()
        .route("/users/register", post(user::register))
        .route("/users/login", post(user::login))
        .route("/users/refresh-token", post(user::refresh_token))
        .route("/courses", get(course::list_courses));

    // 登录可选，影响课程内容的可见范围
    let viewer_routes = Router::new()
        .route("/courses/{course_id}", get(course::get_course))
        .route_layer(from_fn_with_state(state.clone(), optional_auth));

    // 需要认证的路由
    let protected_routes = Router::new()
        .route("/users/logout", post(user::logout))
        .route("/users/me", get(user::me))
        .route("/courses", post(course::create_course))
        .route("/courses/{course_id}", put(course::update_course))
        .route("/courses/{course_id}/publish", put(course::publish_course))
        .route("/courses/{course_id}/chapters", post(chapter::create_chapter))
        .route(
            "/courses/{course_id}/chapters/{chapter_id}",
            patch(chapter::update_chapter),
        )
        .route(
            "/courses/{course_id}/chapters/{chapter_id}/videos/{video_id}",
            patch(chapter::update_video),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .merge(public_routes)
        .merge(viewer_routes)
        .merge(protected_routes);

    Router::new()
        .nest(&state.config.api_base_uri, api)
        .with_state(state)
}
