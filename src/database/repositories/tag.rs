use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::tag::TagEntity;

/// 课程标签存储库
pub struct TagRepository;

impl TagRepository {
    pub async fn list_by_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<TagEntity>, sqlx::Error> {
        sqlx::query_as::<_, TagEntity>(
            "SELECT id, course_id, value FROM course_tags WHERE course_id = $1 ORDER BY value",
        )
        .bind(course_id)
        .fetch_all(pool)
        .await
    }

    /// 插入标签，已存在时返回现有记录
    pub async fn insert(pool: &PgPool, course_id: Uuid, value: &str) -> Result<TagEntity, sqlx::Error> {
        sqlx::query_as::<_, TagEntity>(
            r#"
            INSERT INTO course_tags (id, course_id, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (course_id, value) DO UPDATE SET value = EXCLUDED.value
            RETURNING id, course_id, value
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(value)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, tag_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM course_tags WHERE id = $1")
            .bind(tag_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
