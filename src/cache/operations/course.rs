use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};
use uuid::Uuid;

use super::serde_error;
use crate::cache::keys::course_key;
use crate::database::models::course::CourseEntity;

/// 课程缓存操作
pub struct CourseCacheOperations;

impl CourseCacheOperations {
    /// 缓存课程，作为数据库记录的镜像不设置过期时间
    pub async fn cache_course(
        redis: &Arc<RedisClient>,
        course: &CourseEntity,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let json = serde_json::to_string(course).map_err(|e| serde_error("序列化错误", e))?;
        let _: () = conn.set(course_key(course.id), json).await?;

        Ok(())
    }

    pub async fn get_cached_course(
        redis: &Arc<RedisClient>,
        course_id: Uuid,
    ) -> Result<Option<CourseEntity>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let result: Option<String> = conn.get(course_key(course_id)).await?;

        match result {
            Some(json) => {
                let course = serde_json::from_str(&json).map_err(|e| serde_error("反序列化错误", e))?;
                Ok(Some(course))
            }
            None => Ok(None),
        }
    }
}
