use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::video::{VideoAccess, VideoEntity};

const VIDEO_COLUMNS: &str = "id, chapter_id, title, url, public_id, duration, access, position";

/// 新上传视频的记录
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub chapter_id: Uuid,
    pub title: String,
    pub url: String,
    pub public_id: String,
    pub duration: Option<f64>,
    pub access: VideoAccess,
    pub position: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub url: Option<String>,
    pub public_id: Option<String>,
    pub duration: Option<f64>,
    pub access: Option<VideoAccess>,
}

/// 视频存储库
pub struct VideoRepository;

impl VideoRepository {
    pub async fn insert(pool: &PgPool, video: &NewVideo) -> Result<VideoEntity, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO videos (id, chapter_id, title, url, public_id, duration, access, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {VIDEO_COLUMNS}
            "#
        );

        sqlx::query_as::<_, VideoEntity>(&sql)
            .bind(Uuid::new_v4())
            .bind(video.chapter_id)
            .bind(&video.title)
            .bind(&video.url)
            .bind(&video.public_id)
            .bind(video.duration)
            .bind(video.access.as_str())
            .bind(video.position)
            .fetch_one(pool)
            .await
    }

    pub async fn list_by_chapter(pool: &PgPool, chapter_id: Uuid) -> Result<Vec<VideoEntity>, sqlx::Error> {
        let sql = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE chapter_id = $1 ORDER BY position, id"
        );
        sqlx::query_as::<_, VideoEntity>(&sql)
            .bind(chapter_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        video_id: Uuid,
        changes: &VideoChanges,
    ) -> Result<VideoEntity, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE videos SET
                title = COALESCE($2, title),
                url = COALESCE($3, url),
                public_id = COALESCE($4, public_id),
                duration = COALESCE($5, duration),
                access = COALESCE($6, access)
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        );

        sqlx::query_as::<_, VideoEntity>(&sql)
            .bind(video_id)
            .bind(&changes.title)
            .bind(&changes.url)
            .bind(&changes.public_id)
            .bind(changes.duration)
            .bind(changes.access.map(|a| a.as_str()))
            .fetch_one(pool)
            .await
    }
}
