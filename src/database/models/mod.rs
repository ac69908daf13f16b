/// 数据库实体定义
pub mod chapter;
pub mod course;
pub mod tag;
pub mod user;
pub mod video;

pub use chapter::{ChapterEntity, ChapterStatus};
pub use course::{CourseEntity, CourseVisibility};
pub use tag::TagEntity;
pub use user::{UserEntity, UserRole};
pub use video::{VideoAccess, VideoEntity};

/// 数据库中出现了未知的枚举取值
#[derive(Debug, thiserror::Error)]
#[error("unknown enum value: {0}")]
pub struct UnknownVariant(pub String);
