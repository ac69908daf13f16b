use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UnknownVariant;

/// 章节发布状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
    #[default]
    Draft,
    Published,
}

impl ChapterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterStatus::Draft => "draft",
            ChapterStatus::Published => "published",
        }
    }
}

impl TryFrom<String> for ChapterStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "draft" => Ok(ChapterStatus::Draft),
            "published" => Ok(ChapterStatus::Published),
            _ => Err(UnknownVariant(value)),
        }
    }
}

/// 章节数据库实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChapterEntity {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub position: i32,
    #[sqlx(try_from = "String")]
    pub status: ChapterStatus,
}
