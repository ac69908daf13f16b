use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UnknownVariant;

/// 课程可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CourseVisibility {
    #[default]
    Public,
    Private,
}

impl CourseVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseVisibility::Public => "public",
            CourseVisibility::Private => "private",
        }
    }
}

impl TryFrom<String> for CourseVisibility {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "public" => Ok(CourseVisibility::Public),
            "private" => Ok(CourseVisibility::Private),
            _ => Err(UnknownVariant(value)),
        }
    }
}

/// 课程数据库实体，同时作为 `course:<id>` 的缓存内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CourseEntity {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub title: String,
    pub description: String,
    /// 价格，单位为分
    pub price: i64,
    pub level: String,
    pub image_url: Option<String>,
    pub prerequisites: Vec<String>,
    pub benefits: Vec<String>,
    #[sqlx(try_from = "String")]
    pub visibility: CourseVisibility,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseEntity {
    /// 对公众开放（已发布且公开）
    pub fn is_listed(&self) -> bool {
        self.is_published && self.visibility == CourseVisibility::Public
    }
}
