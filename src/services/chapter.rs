use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::cache::{CachedUser, ChapterCacheOperations, VideoCacheOperations};
use crate::database::models::chapter::{ChapterEntity, ChapterStatus};
use crate::database::models::video::{VideoAccess, VideoEntity};
use crate::database::repositories::{ChapterRepository, NewVideo, VideoChanges, VideoRepository};
use crate::error::{AppError, AppResult};
use crate::media::{ResourceType, UploadItem};
use crate::services::changes::{
    ChapterPatch, chapter_change_fields, detect_chapter_changes, detect_video_changes,
};
use crate::services::course::{ensure_can_edit, load_course};

#[derive(Debug, Clone, Deserialize)]
pub struct NewVideoRequest {
    pub title: String,
    /// data URI 或远程地址
    pub source: String,
    #[serde(default)]
    pub access: VideoAccess,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateChapterRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub position: Option<i32>,
    #[serde(default)]
    pub status: ChapterStatus,
    #[serde(default)]
    pub videos: Vec<NewVideoRequest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub access: Option<VideoAccess>,
    /// 替换视频文件
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterDetail {
    #[serde(flatten)]
    pub chapter: ChapterEntity,
    pub videos: Vec<VideoEntity>,
}

/// 章节与视频标题最大长度（字符），与表的列宽一致
const MAX_TITLE_LEN: usize = 200;

fn chapter_folder(course_id: Uuid, chapter_id: Uuid) -> String {
    format!("courses/{}/chapters/{}", course_id, chapter_id)
}

fn validate_title(title: &str, what: &str) -> AppResult<()> {
    let len = title.trim().chars().count();
    if len == 0 || len > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(format!(
            "{}标题长度必须在1到{}个字符之间",
            what, MAX_TITLE_LEN
        )));
    }
    Ok(())
}

/// 视频标题不能为空且在同一章节内唯一（上传结果按标题收集）
fn validate_videos(videos: &[NewVideoRequest]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for video in videos {
        validate_title(&video.title, "视频")?;
        let title = video.title.trim();
        if !seen.insert(title) {
            return Err(AppError::BadRequest(format!("视频标题重复: {}", title)));
        }
        if video.source.trim().is_empty() {
            return Err(AppError::BadRequest(format!("视频 {} 缺少文件", title)));
        }
    }
    Ok(())
}

/// 读取章节：优先缓存，未命中时查询数据库并回填
pub async fn load_chapter(state: &AppState, course_id: Uuid, chapter_id: Uuid) -> AppResult<ChapterEntity> {
    match ChapterCacheOperations::get_chapter(&state.redis, course_id, chapter_id).await {
        Ok(Some(chapter)) => return Ok(chapter),
        Ok(None) => {}
        Err(e) => tracing::warn!("Failed to read chapter {} from cache: {}", chapter_id, e),
    }

    let chapter = ChapterRepository::find(&state.pool, course_id, chapter_id)
        .await?
        .ok_or_else(|| AppError::not_found("章节"))?;

    if let Err(e) = ChapterCacheOperations::cache_chapter(&state.redis, &chapter).await {
        tracing::warn!("Failed to cache chapter {}: {}", chapter_id, e);
    }
    Ok(chapter)
}

/// 读取章节视频：优先缓存，未命中时查询数据库并回填
pub async fn load_videos(state: &AppState, chapter_id: Uuid) -> AppResult<Vec<VideoEntity>> {
    Ok(fetch_videos(state, chapter_id).await?.0)
}

/// 同 `load_videos`，并返回缓存哈希是否与数据库一致
async fn fetch_videos(state: &AppState, chapter_id: Uuid) -> AppResult<(Vec<VideoEntity>, bool)> {
    match VideoCacheOperations::get_videos(&state.redis, chapter_id).await {
        Ok(Some(videos)) => return Ok((videos, true)),
        Ok(None) => {}
        Err(e) => tracing::warn!("Failed to read videos of chapter {} from cache: {}", chapter_id, e),
    }

    let videos = VideoRepository::list_by_chapter(&state.pool, chapter_id).await?;
    let mirrored = match VideoCacheOperations::cache_videos(&state.redis, chapter_id, &videos).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to cache videos of chapter {}: {}", chapter_id, e);
            false
        }
    };
    Ok((videos, mirrored))
}

/// 回写单个视频
///
/// 哈希不完整时只写一条会让读取方看到残缺的列表，此时删除整个哈希。
pub async fn mirror_video(state: &AppState, video: &VideoEntity, hash_complete: bool) {
    let result = if hash_complete {
        VideoCacheOperations::cache_video(&state.redis, video).await
    } else {
        VideoCacheOperations::evict(&state.redis, video.chapter_id).await
    };

    if let Err(e) = result {
        tracing::warn!("Failed to mirror video {}: {}", video.id, e);
    }
}

pub async fn create_chapter(
    state: &AppState,
    actor: &CachedUser,
    course_id: Uuid,
    req: CreateChapterRequest,
) -> AppResult<ChapterDetail> {
    let course = load_course(state, course_id).await?;
    ensure_can_edit(actor, &course)?;

    validate_title(&req.title, "章节")?;
    validate_videos(&req.videos)?;

    let position = match req.position {
        Some(position) => position,
        None => ChapterRepository::next_position(&state.pool, course_id).await?,
    };

    let chapter = ChapterRepository::create(
        &state.pool,
        course_id,
        req.title.trim(),
        &req.description,
        position,
        req.status,
    )
    .await?;

    let items = req
        .videos
        .iter()
        .map(|v| UploadItem {
            title: v.title.trim().to_string(),
            source: v.source.clone(),
        })
        .collect();
    let mut uploaded = state
        .media
        .upload_videos(
            items,
            &chapter_folder(course_id, chapter.id),
            state.config.upload_concurrency,
        )
        .await?;

    // 按提交顺序写入视频记录
    let mut videos = Vec::with_capacity(req.videos.len());
    for (index, video) in req.videos.into_iter().enumerate() {
        let title = video.title.trim().to_string();
        let asset = uploaded
            .remove(&title)
            .ok_or_else(|| AppError::Internal(format!("视频 {} 上传结果缺失", title)))?;

        let record = VideoRepository::insert(
            &state.pool,
            &NewVideo {
                chapter_id: chapter.id,
                title,
                url: asset.secure_url,
                public_id: asset.public_id,
                duration: asset.duration,
                access: video.access,
                position: index as i32 + 1,
            },
        )
        .await?;
        videos.push(record);
    }

    if let Err(e) = ChapterCacheOperations::cache_chapter(&state.redis, &chapter).await {
        tracing::warn!("Failed to cache chapter {}: {}", chapter.id, e);
    }
    if let Err(e) = VideoCacheOperations::cache_videos(&state.redis, chapter.id, &videos).await {
        tracing::warn!("Failed to cache videos of chapter {}: {}", chapter.id, e);
    }

    tracing::info!(
        "User {} created chapter {} with {} videos in course {}",
        actor.id,
        chapter.id,
        videos.len(),
        course_id
    );
    Ok(ChapterDetail { chapter, videos })
}

/// 部分更新章节，只写入哈希发生变化的字段
pub async fn update_chapter(
    state: &AppState,
    actor: &CachedUser,
    course_id: Uuid,
    chapter_id: Uuid,
    patch: ChapterPatch,
) -> AppResult<ChapterEntity> {
    let course = load_course(state, course_id).await?;
    ensure_can_edit(actor, &course)?;

    if let Some(title) = &patch.title {
        validate_title(title, "章节")?;
    }

    let existing = load_chapter(state, course_id, chapter_id).await?;
    let changes = detect_chapter_changes(&existing, patch);

    if changes.is_empty() {
        tracing::debug!("Chapter {} unchanged, skip write", chapter_id);
        return Ok(existing);
    }

    let chapter = ChapterRepository::update(&state.pool, chapter_id, &changes).await?;

    let fields = chapter_change_fields(&changes);
    if let Err(e) = ChapterCacheOperations::cache_fields(&state.redis, course_id, chapter_id, &fields).await {
        tracing::warn!("Failed to cache chapter {}: {}", chapter_id, e);
    }

    tracing::info!("User {} updated {} fields of chapter {}", actor.id, fields.len(), chapter_id);
    Ok(chapter)
}

/// 更新视频标题、访问权限或替换视频文件
pub async fn update_video(
    state: &AppState,
    actor: &CachedUser,
    course_id: Uuid,
    chapter_id: Uuid,
    video_id: Uuid,
    req: UpdateVideoRequest,
) -> AppResult<VideoEntity> {
    let course = load_course(state, course_id).await?;
    ensure_can_edit(actor, &course)?;
    load_chapter(state, course_id, chapter_id).await?;
    if let Some(title) = &req.title {
        validate_title(title, "视频")?;
    }

    let (videos, hash_complete) = fetch_videos(state, chapter_id).await?;
    let existing = videos
        .into_iter()
        .find(|v| v.id == video_id)
        .ok_or_else(|| AppError::not_found("视频"))?;

    let mut changes = detect_video_changes(&existing, req.title, req.access);

    if let Some(source) = req.source.as_deref() {
        let uploaded = state
            .media
            .replace_by_id(
                Some(&existing.public_id),
                source,
                &chapter_folder(course_id, chapter_id),
                ResourceType::Video,
            )
            .await?;
        changes.url = Some(uploaded.secure_url);
        changes.public_id = Some(uploaded.public_id);
        changes.duration = uploaded.duration;
    }

    if changes == VideoChanges::default() {
        return Ok(existing);
    }

    let video = VideoRepository::update(&state.pool, video_id, &changes).await?;
    mirror_video(state, &video, hash_complete).await;

    tracing::info!("User {} updated video {}", actor.id, video_id);
    Ok(video)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(title: &str) -> NewVideoRequest {
        NewVideoRequest {
            title: title.into(),
            source: "https://files.example.com/a.mp4".into(),
            access: VideoAccess::Paid,
        }
    }

    #[test]
    fn test_duplicate_titles_rejected() {
        let result = validate_videos(&[video("Intro"), video(" Intro ")]);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_blank_title_or_source_rejected() {
        assert!(validate_videos(&[video("  ")]).is_err());

        let mut missing = video("Intro");
        missing.source = String::new();
        assert!(validate_videos(&[missing]).is_err());
    }

    #[test]
    fn test_titles_respect_column_width() {
        assert!(validate_title(&"章".repeat(MAX_TITLE_LEN), "章节").is_ok());
        assert!(matches!(
            validate_title(&"章".repeat(MAX_TITLE_LEN + 1), "章节"),
            Err(AppError::BadRequest(_))
        ));

        let long = video(&"v".repeat(MAX_TITLE_LEN + 1));
        assert!(matches!(validate_videos(&[long]), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_valid_videos_accepted() {
        assert!(validate_videos(&[video("Intro"), video("Setup")]).is_ok());
        assert!(validate_videos(&[]).is_ok());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateChapterRequest = serde_json::from_str(
            r#"{"title":"Basics","videos":[{"title":"Hello","source":"https://x/y.mp4","access":"free"}]}"#,
        )
        .unwrap();

        assert_eq!(req.status, ChapterStatus::Draft);
        assert_eq!(req.position, None);
        assert_eq!(req.videos[0].access, VideoAccess::Free);
    }

    #[test]
    fn test_chapter_folder() {
        let course = Uuid::nil();
        let chapter = Uuid::nil();
        assert_eq!(
            chapter_folder(course, chapter),
            format!("courses/{}/chapters/{}", course, chapter)
        );
    }
}
