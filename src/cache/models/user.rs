use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::user::{UserEntity, UserRole};

/// 用户缓存数据模型，存放于 `user:<id>`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    /// 已购买的课程
    pub courses: Vec<Uuid>,
    pub created_at: i64, // Unix timestamp
}

impl CachedUser {
    pub fn from_entity(user: &UserEntity, courses: Vec<Uuid>) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            role: user.role,
            courses,
            created_at: user.created_at.timestamp(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn has_purchased(&self, course_id: Uuid) -> bool {
        self.courses.contains(&course_id)
    }
}
