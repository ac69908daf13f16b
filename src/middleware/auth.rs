use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    cache::{CachedUser, UserCacheOperations},
    error::{AppError, AppResult},
    services::token::{ACCESS_COOKIE, TokenKind, verify_token},
};

/// 可选认证的结果，未登录时为 `None`
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<CachedUser>);

/// 优先读取 `access_token` Cookie，其次读取 Bearer 请求头
fn access_token(req: &Request<Body>) -> Option<String> {
    let jar = CookieJar::from_headers(req.headers());
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

async fn authenticate(state: &AppState, token: &str) -> AppResult<CachedUser> {
    let claims = verify_token(token, TokenKind::Access, &state.config)?;

    // 用户镜像被删除说明已注销
    UserCacheOperations::get_cached_user(&state.redis, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("请登录后访问".into()))
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = access_token(&req).ok_or_else(|| AppError::Unauthorized("请登录后访问".into()))?;
    let user = authenticate(&state, &token).await?;

    tracing::debug!("Authenticated user {}", user.id);
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// 令牌缺失或无效时按匿名用户处理
pub async fn optional_auth(State(state): State<AppState>, mut req: Request<Body>, next: Next) -> Response {
    let viewer = match access_token(&req) {
        Some(token) => match authenticate(&state, &token).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!("Ignoring invalid access token: {}", e);
                None
            }
        },
        None => None,
    };

    req.extensions_mut().insert(Viewer(viewer));
    next.run(req).await
}
