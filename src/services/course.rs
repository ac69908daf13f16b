use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::cache::{CachedUser, CourseCacheOperations};
use crate::database::models::course::{CourseEntity, CourseVisibility};
use crate::database::models::tag::TagEntity;
use crate::database::repositories::{CourseChanges, CourseRepository, NewCourse};
use crate::error::{AppError, AppResult};
use crate::media::ResourceType;
use crate::services::tags::{apply_tag_diff, diff_tags, load_tags, sort_tags, validate_tags};

/// 课程封面存放目录
const COURSE_IMAGE_FOLDER: &str = "courses";

/// 与 `courses` 表的列宽一致
const MAX_TITLE_LEN: usize = 120;
const MAX_LEVEL_LEN: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default = "default_level")]
    pub level: String,
    /// data URI 或远程地址
    pub image: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: CourseVisibility,
}

fn default_level() -> String {
    "beginner".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub level: Option<String>,
    pub image: Option<String>,
    pub prerequisites: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<CourseVisibility>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: CourseEntity,
    pub tags: Vec<String>,
}

impl CourseDetail {
    fn new(course: CourseEntity, tags: Vec<TagEntity>) -> Self {
        Self {
            course,
            tags: tags.into_iter().map(|t| t.value).collect(),
        }
    }
}

fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() || title.trim().chars().count() > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(format!(
            "课程标题长度必须在1到{}个字符之间",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

fn validate_level(level: &str) -> AppResult<()> {
    if level.trim().is_empty() || level.chars().count() > MAX_LEVEL_LEN {
        return Err(AppError::BadRequest(format!(
            "课程难度长度必须在1到{}个字符之间",
            MAX_LEVEL_LEN
        )));
    }
    Ok(())
}

fn validate_price(price: i64) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::BadRequest("课程价格不能为负数".into()));
    }
    Ok(())
}

/// 读取课程：优先缓存，未命中时查询数据库并回填
pub async fn load_course(state: &AppState, course_id: Uuid) -> AppResult<CourseEntity> {
    match CourseCacheOperations::get_cached_course(&state.redis, course_id).await {
        Ok(Some(course)) => return Ok(course),
        Ok(None) => {}
        Err(e) => tracing::warn!("Failed to read course {} from cache: {}", course_id, e),
    }

    let course = CourseRepository::find_by_id(&state.pool, course_id)
        .await?
        .ok_or_else(|| AppError::not_found("课程"))?;

    mirror_course(state, &course).await;
    Ok(course)
}

/// 尽力写入课程缓存，失败只记录日志
async fn mirror_course(state: &AppState, course: &CourseEntity) {
    if let Err(e) = CourseCacheOperations::cache_course(&state.redis, course).await {
        tracing::warn!("Failed to cache course {}: {}", course.id, e);
    }
}

/// 课程讲师或管理员可以修改课程
pub fn ensure_can_edit(actor: &CachedUser, course: &CourseEntity) -> AppResult<()> {
    if actor.is_admin() || course.instructor_id == actor.id {
        Ok(())
    } else {
        Err(AppError::Forbidden("无权修改该课程".into()))
    }
}

pub async fn create_course(
    state: &AppState,
    actor: &CachedUser,
    req: CreateCourseRequest,
) -> AppResult<CourseDetail> {
    if !actor.role.can_author() {
        return Err(AppError::Forbidden("只有讲师可以创建课程".into()));
    }
    validate_title(&req.title)?;
    validate_price(req.price)?;
    validate_level(&req.level)?;
    validate_tags(&req.tags)?;

    let image_url = match req.image.as_deref() {
        Some(source) => Some(
            state
                .media
                .upload(source, COURSE_IMAGE_FOLDER, ResourceType::Image)
                .await?
                .secure_url,
        ),
        None => None,
    };

    let course = CourseRepository::create(
        &state.pool,
        &NewCourse {
            instructor_id: actor.id,
            title: req.title.trim().to_string(),
            description: req.description,
            price: req.price,
            level: req.level,
            image_url,
            prerequisites: req.prerequisites,
            benefits: req.benefits,
            visibility: req.visibility,
        },
    )
    .await?;

    let tags = apply_tag_diff(state, course.id, diff_tags(&[], &req.tags)).await?;
    mirror_course(state, &course).await;

    tracing::info!("User {} created course {}", actor.id, course.id);
    Ok(CourseDetail::new(course, tags))
}

pub async fn update_course(
    state: &AppState,
    actor: &CachedUser,
    course_id: Uuid,
    req: UpdateCourseRequest,
) -> AppResult<CourseDetail> {
    let existing = load_course(state, course_id).await?;
    ensure_can_edit(actor, &existing)?;

    if let Some(title) = &req.title {
        validate_title(title)?;
    }
    if let Some(price) = req.price {
        validate_price(price)?;
    }
    if let Some(level) = &req.level {
        validate_level(level)?;
    }
    if let Some(tags) = &req.tags {
        validate_tags(tags)?;
    }

    let mut changes = CourseChanges {
        title: req.title.map(|t| t.trim().to_string()),
        description: req.description,
        price: req.price,
        level: req.level,
        image_url: None,
        prerequisites: req.prerequisites,
        benefits: req.benefits,
        visibility: req.visibility,
        is_published: req.is_published,
    };

    // 替换封面：删除旧资源后上传新资源
    if let Some(source) = req.image.as_deref() {
        let uploaded = state
            .media
            .replace(
                existing.image_url.as_deref(),
                source,
                COURSE_IMAGE_FOLDER,
                ResourceType::Image,
            )
            .await?;
        changes.image_url = Some(uploaded.secure_url);
    }

    let mut tags = match req.tags {
        Some(incoming) => {
            let current = load_tags(state, course_id).await?;
            let diff = diff_tags(&current, &incoming);
            if diff.is_empty() {
                diff.unchanged
            } else {
                apply_tag_diff(state, course_id, diff).await?
            }
        }
        None => load_tags(state, course_id).await?,
    };
    sort_tags(&mut tags);

    let course = if changes.is_empty() {
        existing
    } else {
        let course = CourseRepository::update(&state.pool, course_id, &changes).await?;
        mirror_course(state, &course).await;
        course
    };

    tracing::info!("User {} updated course {}", actor.id, course_id);
    Ok(CourseDetail::new(course, tags))
}

/// 发布或下架课程
pub async fn publish_course(
    state: &AppState,
    actor: &CachedUser,
    course_id: Uuid,
    published: bool,
) -> AppResult<CourseDetail> {
    let req = UpdateCourseRequest {
        is_published: Some(published),
        ..Default::default()
    };
    update_course(state, actor, course_id, req).await
}

/// 已发布的公开课程列表
pub async fn list_courses(state: &AppState) -> AppResult<Vec<CourseEntity>> {
    Ok(CourseRepository::list_listed(&state.pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::user::UserRole;
    use chrono::Utc;

    fn user(role: UserRole) -> CachedUser {
        CachedUser {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            avatar_url: None,
            role,
            courses: vec![],
            created_at: 0,
        }
    }

    fn course(instructor_id: Uuid) -> CourseEntity {
        CourseEntity {
            id: Uuid::new_v4(),
            instructor_id,
            title: "Rust 入门".into(),
            description: String::new(),
            price: 0,
            level: "beginner".into(),
            image_url: None,
            prerequisites: vec![],
            benefits: vec![],
            visibility: CourseVisibility::Public,
            is_published: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_and_admin_can_edit() {
        let owner = user(UserRole::Instructor);
        let admin = user(UserRole::Admin);
        let other = user(UserRole::Instructor);
        let course = course(owner.id);

        assert!(ensure_can_edit(&owner, &course).is_ok());
        assert!(ensure_can_edit(&admin, &course).is_ok());
        assert!(matches!(
            ensure_can_edit(&other, &course),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_validation() {
        assert!(validate_title("Rust").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
        assert!(validate_price(0).is_ok());
        assert!(validate_price(-1).is_err());
    }

    #[test]
    fn test_title_and_level_respect_column_width() {
        assert!(validate_title(&"课".repeat(MAX_TITLE_LEN)).is_ok());
        assert!(validate_title(&"课".repeat(MAX_TITLE_LEN + 1)).is_err());

        assert!(validate_level("advanced").is_ok());
        assert!(validate_level(&"x".repeat(MAX_LEVEL_LEN)).is_ok());
        assert!(matches!(
            validate_level(&"x".repeat(MAX_LEVEL_LEN + 1)),
            Err(AppError::BadRequest(_))
        ));
        assert!(validate_level("  ").is_err());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateCourseRequest = serde_json::from_str(r#"{"title":"Rust"}"#).unwrap();

        assert_eq!(req.level, "beginner");
        assert_eq!(req.visibility, CourseVisibility::Public);
        assert!(req.tags.is_empty());
        assert!(req.image.is_none());
    }

    #[test]
    fn test_detail_flattens_course() {
        let detail = CourseDetail::new(
            course(Uuid::new_v4()),
            vec![TagEntity {
                id: Uuid::new_v4(),
                course_id: Uuid::nil(),
                value: "rust".into(),
            }],
        );
        let json = serde_json::to_value(&detail).unwrap();

        assert_eq!(json["title"], "Rust 入门");
        assert_eq!(json["tags"], serde_json::json!(["rust"]));
    }
}
