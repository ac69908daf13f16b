use serde::Deserialize;

use crate::AppState;
use crate::cache::CachedUser;
use crate::database::models::user::{UserEntity, UserRole};
use crate::database::repositories::UserRepository;
use crate::error::{AppError, AppResult};
use crate::utils::{hash_password, verify_password};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// 只允许注册为普通用户或讲师
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn validate_registration(req: &RegisterRequest) -> AppResult<()> {
    let name_len = req.name.trim().chars().count();
    if !(2..=50).contains(&name_len) {
        return Err(AppError::BadRequest("用户名长度必须在2到50个字符之间".into()));
    }

    let email = req.email.trim();
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_email {
        return Err(AppError::BadRequest("邮箱格式无效".into()));
    }

    if req.password.len() < 6 || req.password.len() > 64 {
        return Err(AppError::BadRequest("密码长度必须在6到64个字符之间".into()));
    }

    if req.role == Some(UserRole::Admin) {
        return Err(AppError::Forbidden("不能注册管理员账号".into()));
    }

    Ok(())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// 构造会话用户，附带已购买的课程
pub async fn session_user(state: &AppState, user: &UserEntity) -> AppResult<CachedUser> {
    let courses = UserRepository::purchased_course_ids(&state.pool, user.id).await?;
    Ok(CachedUser::from_entity(user, courses))
}

pub async fn register(state: &AppState, req: RegisterRequest) -> AppResult<CachedUser> {
    validate_registration(&req)?;

    let email = req.email.trim().to_lowercase();
    if UserRepository::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict("邮箱已被注册".into()));
    }

    let password_hash =
        hash_password(&req.password).map_err(|e| AppError::Internal(format!("密码哈希失败: {}", e)))?;

    let user = UserRepository::create(
        &state.pool,
        req.name.trim(),
        &email,
        &password_hash,
        req.role.unwrap_or(UserRole::User),
    )
    .await
    .map_err(|e| {
        // 并发注册时由唯一约束兜底
        if is_unique_violation(&e) {
            AppError::Conflict("邮箱已被注册".into())
        } else {
            AppError::Database(e)
        }
    })?;

    Ok(CachedUser::from_entity(&user, Vec::new()))
}

pub async fn login(state: &AppState, req: LoginRequest) -> AppResult<CachedUser> {
    let invalid = || AppError::BadRequest("邮箱或密码错误".into());

    let user = UserRepository::find_by_email(&state.pool, req.email.trim())
        .await?
        .ok_or_else(invalid)?;

    let matches = verify_password(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("密码校验失败: {}", e)))?;
    if !matches {
        tracing::debug!("Password mismatch for user {}", user.id);
        return Err(invalid());
    }

    session_user(state, &user).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: None,
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(validate_registration(&request("Ada", "ada@example.com", "hunter22")).is_ok());
    }

    #[test]
    fn test_invalid_registration() {
        assert!(validate_registration(&request("A", "ada@example.com", "hunter22")).is_err());
        assert!(validate_registration(&request("Ada", "ada.example.com", "hunter22")).is_err());
        assert!(validate_registration(&request("Ada", "@example.com", "hunter22")).is_err());
        assert!(validate_registration(&request("Ada", "ada@example.com", "123")).is_err());
    }

    #[test]
    fn test_admin_self_registration_forbidden() {
        let mut req = request("Ada", "ada@example.com", "hunter22");
        req.role = Some(UserRole::Admin);
        assert!(matches!(validate_registration(&req), Err(AppError::Forbidden(_))));

        req.role = Some(UserRole::Instructor);
        assert!(validate_registration(&req).is_ok());
    }
}
