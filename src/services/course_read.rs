use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use crate::cache::CachedUser;
use crate::database::models::chapter::{ChapterEntity, ChapterStatus};
use crate::database::models::course::{CourseEntity, CourseVisibility};
use crate::database::models::video::{VideoAccess, VideoEntity};
use crate::database::repositories::{ChapterRepository, CourseRepository};
use crate::error::{AppError, AppResult};
use crate::services::chapter::load_videos;
use crate::services::course::load_course;
use crate::services::tags::load_tags;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoView {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub duration: Option<f64>,
    pub access: VideoAccess,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub position: i32,
    pub videos: Vec<VideoView>,
    /// 未购买时被隐藏的付费视频数量
    pub locked_videos: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub level: String,
    pub image_url: Option<String>,
    pub prerequisites: Vec<String>,
    pub benefits: Vec<String>,
    pub visibility: CourseVisibility,
    pub is_published: bool,
    pub tags: Vec<String>,
    pub purchased: bool,
    pub chapters: Vec<ChapterView>,
    pub updated_at: DateTime<Utc>,
}

/// 课程列表中的条目
#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub level: String,
    pub image_url: Option<String>,
}

impl From<CourseEntity> for CourseSummary {
    fn from(course: CourseEntity) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            price: course.price,
            level: course.level,
            image_url: course.image_url,
        }
    }
}

/// 讲师本人与管理员拥有完整访问权限
fn is_privileged(viewer: Option<&CachedUser>, course: &CourseEntity) -> bool {
    viewer.is_some_and(|u| u.is_admin() || u.id == course.instructor_id)
}

/// 过滤章节与视频
///
/// 草稿章节始终移除；未购买时移除付费视频并计数。
pub fn filter_course_view(chapters: Vec<(ChapterEntity, Vec<VideoEntity>)>, purchased: bool) -> Vec<ChapterView> {
    chapters
        .into_iter()
        .filter(|(chapter, _)| chapter.status == ChapterStatus::Published)
        .map(|(chapter, videos)| {
            let total = videos.len();
            let videos: Vec<VideoView> = videos
                .into_iter()
                .filter(|v| purchased || v.access == VideoAccess::Free)
                .map(|v| VideoView {
                    id: v.id,
                    title: v.title,
                    url: v.url,
                    duration: v.duration,
                    access: v.access,
                })
                .collect();

            ChapterView {
                id: chapter.id,
                title: chapter.title,
                description: chapter.description,
                position: chapter.position,
                locked_videos: total - videos.len(),
                videos,
            }
        })
        .collect()
}

async fn has_purchased(state: &AppState, viewer: Option<&CachedUser>, course: &CourseEntity) -> AppResult<bool> {
    let Some(user) = viewer else {
        return Ok(false);
    };
    if is_privileged(viewer, course) || user.has_purchased(course.id) {
        return Ok(true);
    }
    // 缓存中的购买记录可能落后于数据库
    Ok(CourseRepository::has_enrollment(&state.pool, user.id, course.id).await?)
}

/// 组装课程视图
pub async fn get_course_view(
    state: &AppState,
    course_id: Uuid,
    viewer: Option<&CachedUser>,
) -> AppResult<CourseView> {
    let course = load_course(state, course_id).await?;

    if !course.is_listed() && !is_privileged(viewer, &course) {
        return Err(AppError::not_found("课程"));
    }

    let purchased = has_purchased(state, viewer, &course).await?;
    let tags = load_tags(state, course_id).await?;

    let chapters = ChapterRepository::list_by_course(&state.pool, course_id).await?;
    let chapters = try_join_all(chapters.into_iter().map(|chapter| async move {
        let videos = load_videos(state, chapter.id).await?;
        AppResult::Ok((chapter, videos))
    }))
    .await?;

    Ok(CourseView {
        id: course.id,
        instructor_id: course.instructor_id,
        title: course.title,
        description: course.description,
        price: course.price,
        level: course.level,
        image_url: course.image_url,
        prerequisites: course.prerequisites,
        benefits: course.benefits,
        visibility: course.visibility,
        is_published: course.is_published,
        tags: tags.into_iter().map(|t| t.value).collect(),
        purchased,
        chapters: filter_course_view(chapters, purchased),
        updated_at: course.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::user::UserRole;

    fn chapter(title: &str, position: i32, status: ChapterStatus) -> ChapterEntity {
        ChapterEntity {
            id: Uuid::new_v4(),
            course_id: Uuid::nil(),
            title: title.into(),
            description: String::new(),
            position,
            status,
        }
    }

    fn video(title: &str, access: VideoAccess) -> VideoEntity {
        VideoEntity {
            id: Uuid::new_v4(),
            chapter_id: Uuid::nil(),
            title: title.into(),
            url: format!("https://res.example.com/demo/video/upload/{}.mp4", title),
            public_id: title.into(),
            duration: Some(60.0),
            access,
            position: 1,
        }
    }

    fn sample() -> Vec<(ChapterEntity, Vec<VideoEntity>)> {
        vec![
            (
                chapter("Basics", 1, ChapterStatus::Published),
                vec![video("welcome", VideoAccess::Free), video("deep-dive", VideoAccess::Paid)],
            ),
            (
                chapter("Unfinished", 2, ChapterStatus::Draft),
                vec![video("wip", VideoAccess::Free)],
            ),
            (
                chapter("Advanced", 3, ChapterStatus::Published),
                vec![video("unsafe", VideoAccess::Paid)],
            ),
        ]
    }

    #[test]
    fn test_non_purchaser_never_sees_paid_videos() {
        let view = filter_course_view(sample(), false);

        assert_eq!(view.len(), 2);
        assert!(
            view.iter()
                .flat_map(|c| &c.videos)
                .all(|v| v.access == VideoAccess::Free)
        );
        assert_eq!(view[0].videos.len(), 1);
        assert_eq!(view[0].locked_videos, 1);
        assert!(view[1].videos.is_empty());
        assert_eq!(view[1].locked_videos, 1);
    }

    #[test]
    fn test_purchaser_sees_all_published_videos() {
        let view = filter_course_view(sample(), true);

        assert_eq!(view.len(), 2);
        assert_eq!(view[0].videos.len(), 2);
        assert_eq!(view[0].locked_videos, 0);
        assert_eq!(view[1].videos[0].access, VideoAccess::Paid);
    }

    #[test]
    fn test_drafts_never_appear() {
        for purchased in [true, false] {
            let view = filter_course_view(sample(), purchased);
            assert!(view.iter().all(|c| c.title != "Unfinished"));
        }
    }

    #[test]
    fn test_privileged_viewers() {
        let instructor_id = Uuid::new_v4();
        let course = CourseEntity {
            id: Uuid::new_v4(),
            instructor_id,
            title: "Rust".into(),
            description: String::new(),
            price: 1999,
            level: "beginner".into(),
            image_url: None,
            prerequisites: vec![],
            benefits: vec![],
            visibility: CourseVisibility::Private,
            is_published: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut viewer = CachedUser {
            id: instructor_id,
            name: "Grace".into(),
            email: "grace@example.com".into(),
            avatar_url: None,
            role: UserRole::Instructor,
            courses: vec![],
            created_at: 0,
        };

        assert!(is_privileged(Some(&viewer), &course));

        viewer.id = Uuid::new_v4();
        assert!(!is_privileged(Some(&viewer), &course));

        viewer.role = UserRole::Admin;
        assert!(is_privileged(Some(&viewer), &course));

        assert!(!is_privileged(None, &course));
    }
}
