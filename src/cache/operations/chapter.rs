use std::collections::HashMap;
use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};
use uuid::Uuid;

use crate::cache::keys::chapter_key;
use crate::cache::models::chapter::{chapter_from_fields, chapter_to_fields};
use crate::database::models::chapter::ChapterEntity;

/// 章节缓存操作，每个内容字段独立存放在同一个哈希中
pub struct ChapterCacheOperations;

impl ChapterCacheOperations {
    /// 写入完整章节
    pub async fn cache_chapter(
        redis: &Arc<RedisClient>,
        chapter: &ChapterEntity,
    ) -> Result<(), redis::RedisError> {
        let fields = chapter_to_fields(chapter);
        Self::cache_fields(redis, chapter.course_id, chapter.id, &fields).await
    }

    /// 只写入指定字段
    pub async fn cache_fields(
        redis: &Arc<RedisClient>,
        course_id: Uuid,
        chapter_id: Uuid,
        fields: &[(&'static str, String)],
    ) -> Result<(), redis::RedisError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let _: () = conn
            .hset_multiple(chapter_key(course_id, chapter_id), fields)
            .await?;

        Ok(())
    }

    /// 读取章节，哈希不存在或不完整时返回 `None`
    pub async fn get_chapter(
        redis: &Arc<RedisClient>,
        course_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<Option<ChapterEntity>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let fields: HashMap<String, String> = conn.hgetall(chapter_key(course_id, chapter_id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }

        Ok(chapter_from_fields(&fields))
    }
}
