use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UnknownVariant;

/// 视频访问权限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoAccess {
    Free,
    #[default]
    Paid,
}

impl VideoAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoAccess::Free => "free",
            VideoAccess::Paid => "paid",
        }
    }
}

impl TryFrom<String> for VideoAccess {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "free" => Ok(VideoAccess::Free),
            "paid" => Ok(VideoAccess::Paid),
            _ => Err(UnknownVariant(value)),
        }
    }
}

/// 视频数据库实体，同时作为 `course_videos:<chapterId>` 哈希中的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VideoEntity {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub title: String,
    pub url: String,
    pub public_id: String,
    pub duration: Option<f64>,
    #[sqlx(try_from = "String")]
    pub access: VideoAccess,
    pub position: i32,
}
