use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 课程标签
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct TagEntity {
    pub id: Uuid,
    pub course_id: Uuid,
    pub value: String,
}
