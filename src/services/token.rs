use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::cache::{CachedUser, UserCacheOperations};
use crate::config::Config;
use crate::database::models::user::UserRole;
use crate::error::{AppError, AppResult};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// 令牌类型，两种令牌使用不同的密钥和有效期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // 用户ID
    pub role: UserRole,  // 用户角色
    pub kind: TokenKind, // 令牌类型
    pub iat: i64,        // 签发时间
    pub exp: i64,        // 过期时间
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// 登录、注册、刷新令牌的响应体
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub user: CachedUser,
    pub access_token: String,
}

fn secret_for(kind: TokenKind, config: &Config) -> &[u8] {
    match kind {
        TokenKind::Access => config.access_token_secret.as_bytes(),
        TokenKind::Refresh => config.refresh_token_secret.as_bytes(),
    }
}

fn lifetime_secs(kind: TokenKind, config: &Config) -> u64 {
    match kind {
        TokenKind::Access => config.access_token_expiration().as_secs(),
        TokenKind::Refresh => config.refresh_token_expiration().as_secs(),
    }
}

pub fn sign_token(
    user_id: Uuid,
    role: UserRole,
    kind: TokenKind,
    config: &Config,
) -> AppResult<IssuedToken> {
    let now = Utc::now();
    let expires_at = i64::try_from(lifetime_secs(kind, config))
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| AppError::Internal("令牌有效期超出范围".into()))?;

    let claims = Claims {
        sub: user_id,
        role,
        kind,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret_for(kind, config)),
    )?;

    Ok(IssuedToken { token, expires_at })
}

pub fn issue_token_pair(
    user_id: Uuid,
    role: UserRole,
    config: &Config,
) -> AppResult<TokenPair> {
    Ok(TokenPair {
        access: sign_token(user_id, role, TokenKind::Access, config)?,
        refresh: sign_token(user_id, role, TokenKind::Refresh, config)?,
    })
}

/// 校验令牌签名、有效期以及令牌类型
pub fn verify_token(token: &str, kind: TokenKind, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret_for(kind, config)),
        &Validation::default(),
    )?;

    if token_data.claims.kind != kind {
        return Err(AppError::Unauthorized("令牌类型不匹配".into()));
    }

    Ok(token_data.claims)
}

fn token_cookie(name: &'static str, token: &IssuedToken, kind: TokenKind, config: &Config) -> Cookie<'static> {
    let secs = i64::try_from(lifetime_secs(kind, config)).unwrap_or(i64::MAX);

    let mut cookie = Cookie::build((name, token.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.is_production())
        .max_age(time::Duration::seconds(secs))
        .build();
    // 与令牌自身的过期时间保持一致
    if let Ok(expires) = time::OffsetDateTime::from_unix_timestamp(token.expires_at.timestamp()) {
        cookie.set_expires(expires);
    }
    cookie
}

/// 构造 `access_token` 与 `refresh_token` 两个 Cookie
pub fn token_cookies(pair: &TokenPair, config: &Config) -> [Cookie<'static>; 2] {
    [
        token_cookie(ACCESS_COOKIE, &pair.access, TokenKind::Access, config),
        token_cookie(REFRESH_COOKIE, &pair.refresh, TokenKind::Refresh, config),
    ]
}

/// 签发令牌、写入 Cookie，并把用户镜像到 `user:<id>`
pub async fn send_token(
    state: &AppState,
    jar: CookieJar,
    user: CachedUser,
) -> AppResult<(CookieJar, TokenResponse)> {
    let pair = issue_token_pair(user.id, user.role, &state.config)?;

    UserCacheOperations::cache_user(
        &state.redis,
        &user,
        state.config.refresh_token_expiration().as_secs(),
    )
    .await?;

    let [access, refresh] = token_cookies(&pair, &state.config);
    let jar = jar.add(access).add(refresh);

    tracing::debug!("Issued token pair for user {}", user.id);
    Ok((
        jar,
        TokenResponse {
            user,
            access_token: pair.access.token,
        },
    ))
}

/// 使用刷新令牌换取新的令牌对
pub async fn refresh(state: &AppState, jar: CookieJar) -> AppResult<(CookieJar, TokenResponse)> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::BadRequest("请登录后访问".into()))?;

    let claims = verify_token(&token, TokenKind::Refresh, &state.config)
        .map_err(|_| AppError::BadRequest("无法刷新令牌".into()))?;

    // 缓存中没有用户说明会话已结束
    let user = UserCacheOperations::get_cached_user(&state.redis, claims.sub)
        .await?
        .ok_or_else(|| AppError::BadRequest("请登录后访问".into()))?;

    send_token(state, jar, user).await
}

/// 注销：删除用户镜像并使两个 Cookie 失效
pub async fn logout(state: &AppState, jar: CookieJar, user_id: Uuid) -> AppResult<CookieJar> {
    UserCacheOperations::remove_user(&state.redis, user_id).await?;

    let jar = jar
        .remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"));

    tracing::info!("User {} logged out", user_id);
    Ok(jar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_cookies_follow_configured_lifetimes() {
        let config = test_config();
        let pair = issue_token_pair(Uuid::new_v4(), UserRole::User, &config).unwrap();

        let [access, refresh] = token_cookies(&pair, &config);

        assert_eq!(access.name(), ACCESS_COOKIE);
        assert_eq!(refresh.name(), REFRESH_COOKIE);
        assert_eq!(
            access.max_age(),
            Some(time::Duration::seconds(config.access_token_expire_secs as i64))
        );
        assert_eq!(
            refresh.max_age(),
            Some(time::Duration::seconds(config.refresh_token_expire_secs as i64))
        );
        assert_ne!(access.max_age(), refresh.max_age());

        let access_expires = access.expires_datetime().unwrap();
        let refresh_expires = refresh.expires_datetime().unwrap();
        assert!(refresh_expires > access_expires);

        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Lax));
        assert_eq!(access.secure(), Some(false));
    }

    #[test]
    fn test_secure_flag_in_production() {
        let mut config = test_config();
        config.app_env = "production".into();
        let pair = issue_token_pair(Uuid::new_v4(), UserRole::Admin, &config).unwrap();

        let [access, refresh] = token_cookies(&pair, &config);

        assert_eq!(access.secure(), Some(true));
        assert_eq!(refresh.secure(), Some(true));
    }

    #[test]
    fn test_token_expiry_matches_config() {
        let config = test_config();
        let before = Utc::now().timestamp();
        let pair = issue_token_pair(Uuid::new_v4(), UserRole::User, &config).unwrap();

        let access_lifetime = pair.access.expires_at.timestamp() - before;
        let refresh_lifetime = pair.refresh.expires_at.timestamp() - before;

        assert!((access_lifetime - config.access_token_expire_secs as i64).abs() <= 1);
        assert!((refresh_lifetime - config.refresh_token_expire_secs as i64).abs() <= 1);
    }

    #[test]
    fn test_verify_round_trip() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let pair = issue_token_pair(user_id, UserRole::Instructor, &config).unwrap();

        let claims = verify_token(&pair.access.token, TokenKind::Access, &config).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Instructor);

        let claims = verify_token(&pair.refresh.token, TokenKind::Refresh, &config).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let config = test_config();
        let pair = issue_token_pair(Uuid::new_v4(), UserRole::User, &config).unwrap();

        // 不同密钥签名，签名校验即失败
        assert!(verify_token(&pair.refresh.token, TokenKind::Access, &config).is_err());
    }

    #[test]
    fn test_same_secret_still_checks_kind() {
        let mut config = test_config();
        config.refresh_token_secret = config.access_token_secret.clone();
        let pair = issue_token_pair(Uuid::new_v4(), UserRole::User, &config).unwrap();

        let err = verify_token(&pair.refresh.token, TokenKind::Access, &config).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_oversized_lifetime_is_an_error() {
        let mut config = test_config();
        config.refresh_token_expire_secs = u64::MAX;

        let err = issue_token_pair(Uuid::new_v4(), UserRole::User, &config).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));

        config.refresh_token_expire_secs = i64::MAX as u64;
        assert!(sign_token(Uuid::new_v4(), UserRole::User, TokenKind::Refresh, &config).is_err());
        assert!(sign_token(Uuid::new_v4(), UserRole::User, TokenKind::Access, &config).is_ok());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let config = test_config();
        let pair = issue_token_pair(Uuid::new_v4(), UserRole::User, &config).unwrap();
        let tampered = format!("{}x", pair.access.token);

        assert!(matches!(
            verify_token(&tampered, TokenKind::Access, &config),
            Err(AppError::Token(_))
        ));
    }
}
