use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::course::{CourseEntity, CourseVisibility};

const COURSE_COLUMNS: &str = "id, instructor_id, title, description, price, level, image_url, \
     prerequisites, benefits, visibility, is_published, created_at, updated_at";

/// 新建课程所需字段
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub instructor_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub level: String,
    pub image_url: Option<String>,
    pub prerequisites: Vec<String>,
    pub benefits: Vec<String>,
    pub visibility: CourseVisibility,
}

/// 课程的部分更新，`None` 表示保持原值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub level: Option<String>,
    pub image_url: Option<String>,
    pub prerequisites: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub visibility: Option<CourseVisibility>,
    pub is_published: Option<bool>,
}

impl CourseChanges {
    pub fn is_empty(&self) -> bool {
        *self == CourseChanges::default()
    }
}

/// 课程存储库
pub struct CourseRepository;

impl CourseRepository {
    pub async fn create(pool: &PgPool, course: &NewCourse) -> Result<CourseEntity, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO courses (
                id, instructor_id, title, description, price, level, image_url,
                prerequisites, benefits, visibility, is_published
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, false)
            RETURNING {COURSE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, CourseEntity>(&sql)
            .bind(Uuid::new_v4())
            .bind(course.instructor_id)
            .bind(&course.title)
            .bind(&course.description)
            .bind(course.price)
            .bind(&course.level)
            .bind(&course.image_url)
            .bind(&course.prerequisites)
            .bind(&course.benefits)
            .bind(course.visibility.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, course_id: Uuid) -> Result<Option<CourseEntity>, sqlx::Error> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, CourseEntity>(&sql)
            .bind(course_id)
            .fetch_optional(pool)
            .await
    }

    /// 已发布的公开课程
    pub async fn list_listed(pool: &PgPool) -> Result<Vec<CourseEntity>, sqlx::Error> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses \
             WHERE is_published AND visibility = 'public' \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, CourseEntity>(&sql).fetch_all(pool).await
    }

    /// 部分更新，未提供的字段保持不变
    pub async fn update(
        pool: &PgPool,
        course_id: Uuid,
        changes: &CourseChanges,
    ) -> Result<CourseEntity, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE courses SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                level = COALESCE($5, level),
                image_url = COALESCE($6, image_url),
                prerequisites = COALESCE($7, prerequisites),
                benefits = COALESCE($8, benefits),
                visibility = COALESCE($9, visibility),
                is_published = COALESCE($10, is_published),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COURSE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, CourseEntity>(&sql)
            .bind(course_id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(changes.price)
            .bind(&changes.level)
            .bind(&changes.image_url)
            .bind(&changes.prerequisites)
            .bind(&changes.benefits)
            .bind(changes.visibility.map(|v| v.as_str()))
            .bind(changes.is_published)
            .fetch_one(pool)
            .await
    }

    /// 用户是否购买了课程
    pub async fn has_enrollment(pool: &PgPool, user_id: Uuid, course_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(pool)
        .await
    }
}
