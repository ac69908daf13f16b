use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::chapter::{ChapterEntity, ChapterStatus};

const CHAPTER_COLUMNS: &str = "id, course_id, title, description, position, status";

/// 章节的部分更新，只包含发生变化的字段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub position: Option<i32>,
    pub status: Option<ChapterStatus>,
}

impl ChapterChanges {
    pub fn is_empty(&self) -> bool {
        *self == ChapterChanges::default()
    }
}

/// 章节存储库
pub struct ChapterRepository;

impl ChapterRepository {
    pub async fn create(
        pool: &PgPool,
        course_id: Uuid,
        title: &str,
        description: &str,
        position: i32,
        status: ChapterStatus,
    ) -> Result<ChapterEntity, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO chapters (id, course_id, title, description, position, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CHAPTER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ChapterEntity>(&sql)
            .bind(Uuid::new_v4())
            .bind(course_id)
            .bind(title)
            .bind(description)
            .bind(position)
            .bind(status.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        course_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<Option<ChapterEntity>, sqlx::Error> {
        let sql = format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = $1 AND course_id = $2");
        sqlx::query_as::<_, ChapterEntity>(&sql)
            .bind(chapter_id)
            .bind(course_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<ChapterEntity>, sqlx::Error> {
        let sql = format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE course_id = $1 ORDER BY position, id"
        );
        sqlx::query_as::<_, ChapterEntity>(&sql)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }

    /// 下一个章节序号
    pub async fn next_position(pool: &PgPool, course_id: Uuid) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM chapters WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        chapter_id: Uuid,
        changes: &ChapterChanges,
    ) -> Result<ChapterEntity, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE chapters SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                position = COALESCE($4, position),
                status = COALESCE($5, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CHAPTER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ChapterEntity>(&sql)
            .bind(chapter_id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(changes.position)
            .bind(changes.status.map(|s| s.as_str()))
            .fetch_one(pool)
            .await
    }
}
