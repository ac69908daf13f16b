use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::user::{UserEntity, UserRole};

const USER_COLUMNS: &str = "id, name, email, avatar_url, role, password_hash, created_at";

/// 用户存储库实现
pub struct UserRepository;

impl UserRepository {
    /// 创建用户，密码需提前哈希
    pub async fn create(
        pool: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<UserEntity, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );

        let result = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .bind(role.as_str())
            .fetch_one(pool)
            .await;

        match result {
            Ok(user) => {
                tracing::info!("Created user: {}", user.id);
                Ok(user)
            }
            Err(e) => {
                tracing::error!("Failed to create user {}: {:?}", email, e);
                Err(e)
            }
        }
    }

    /// 根据邮箱查找用户
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// 用户已购买的课程
    pub async fn purchased_course_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT course_id FROM enrollments WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
