//! 基于内容哈希的变更检测
//!
//! 部分更新时，只有新值哈希与旧值哈希不同的字段才会写入数据库和缓存。

use serde::Deserialize;

use crate::cache::models::chapter::{FIELD_DESCRIPTION, FIELD_POSITION, FIELD_STATUS, FIELD_TITLE};
use crate::database::models::chapter::{ChapterEntity, ChapterStatus};
use crate::database::models::video::{VideoAccess, VideoEntity};
use crate::database::repositories::{ChapterChanges, VideoChanges};
use crate::utils::content_hash;

/// 章节部分更新请求，缺省字段保持不变
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChapterPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub position: Option<i32>,
    pub status: Option<ChapterStatus>,
}

/// 新值与当前值哈希不同则返回新值
fn changed<T>(new: Option<T>, current: &str, render: impl Fn(&T) -> String) -> Option<T> {
    new.filter(|value| content_hash(&render(value)) != content_hash(current))
}

pub fn detect_chapter_changes(existing: &ChapterEntity, patch: ChapterPatch) -> ChapterChanges {
    ChapterChanges {
        title: changed(patch.title, &existing.title, |v| v.clone()),
        description: changed(patch.description, &existing.description, |v| v.clone()),
        position: changed(patch.position, &existing.position.to_string(), |v| v.to_string()),
        status: changed(patch.status, existing.status.as_str(), |v| v.as_str().to_string()),
    }
}

/// 变更字段对应的章节哈希条目
pub fn chapter_change_fields(changes: &ChapterChanges) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();
    if let Some(title) = &changes.title {
        fields.push((FIELD_TITLE, title.clone()));
    }
    if let Some(description) = &changes.description {
        fields.push((FIELD_DESCRIPTION, description.clone()));
    }
    if let Some(position) = changes.position {
        fields.push((FIELD_POSITION, position.to_string()));
    }
    if let Some(status) = changes.status {
        fields.push((FIELD_STATUS, status.as_str().to_string()));
    }
    fields
}

pub fn detect_video_changes(
    existing: &VideoEntity,
    title: Option<String>,
    access: Option<VideoAccess>,
) -> VideoChanges {
    VideoChanges {
        title: changed(title, &existing.title, |v| v.clone()),
        access: changed(access, existing.access.as_str(), |v| v.as_str().to_string()),
        ..VideoChanges::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn chapter() -> ChapterEntity {
        ChapterEntity {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            title: "Traits".into(),
            description: "Static and dynamic dispatch".into(),
            position: 3,
            status: ChapterStatus::Draft,
        }
    }

    #[test]
    fn test_identical_values_yield_empty_patch() {
        let existing = chapter();
        let patch = ChapterPatch {
            title: Some(existing.title.clone()),
            description: Some(existing.description.clone()),
            position: Some(existing.position),
            status: Some(existing.status),
        };

        let changes = detect_chapter_changes(&existing, patch);

        assert!(changes.is_empty());
        assert!(chapter_change_fields(&changes).is_empty());
    }

    #[test]
    fn test_only_changed_fields_kept() {
        let existing = chapter();
        let patch = ChapterPatch {
            title: Some("Traits".into()),
            description: Some("Generics and trait objects".into()),
            position: None,
            status: Some(ChapterStatus::Published),
        };

        let changes = detect_chapter_changes(&existing, patch);

        assert_eq!(changes.title, None);
        assert_eq!(changes.description.as_deref(), Some("Generics and trait objects"));
        assert_eq!(changes.position, None);
        assert_eq!(changes.status, Some(ChapterStatus::Published));

        let fields = chapter_change_fields(&changes);
        assert_eq!(
            fields,
            vec![
                (FIELD_DESCRIPTION, "Generics and trait objects".to_string()),
                (FIELD_STATUS, "published".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_patch_is_empty() {
        assert!(detect_chapter_changes(&chapter(), ChapterPatch::default()).is_empty());
    }

    #[test]
    fn test_video_changes() {
        let video = VideoEntity {
            id: Uuid::new_v4(),
            chapter_id: Uuid::new_v4(),
            title: "Hello".into(),
            url: "https://res.example.com/demo/video/upload/v1/a.mp4".into(),
            public_id: "a".into(),
            duration: None,
            access: VideoAccess::Paid,
            position: 1,
        };

        let same = detect_video_changes(&video, Some("Hello".into()), Some(VideoAccess::Paid));
        assert_eq!(same, VideoChanges::default());

        let changed = detect_video_changes(&video, None, Some(VideoAccess::Free));
        assert_eq!(changed.access, Some(VideoAccess::Free));
        assert_eq!(changed.title, None);
    }
}
