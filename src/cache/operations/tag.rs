use std::collections::HashMap;
use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};
use uuid::Uuid;

use crate::cache::keys::course_tags_key;
use crate::database::models::tag::TagEntity;

/// 课程标签哈希缓存操作，字段为标签ID，值为标签文本
pub struct TagCacheOperations;

impl TagCacheOperations {
    /// 读取课程标签，哈希不存在时返回 `None`
    pub async fn get_tags(
        redis: &Arc<RedisClient>,
        course_id: Uuid,
    ) -> Result<Option<Vec<TagEntity>>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let entries: HashMap<String, String> = conn.hgetall(course_tags_key(course_id)).await?;
        if entries.is_empty() {
            return Ok(None);
        }

        let mut tags = Vec::with_capacity(entries.len());
        for (id, value) in entries {
            match Uuid::parse_str(&id) {
                Ok(id) => tags.push(TagEntity { id, course_id, value }),
                Err(_) => {
                    // 存在无法解析的字段时，整个哈希视为未命中
                    tracing::warn!("Invalid tag id {} in cache for course {}", id, course_id);
                    return Ok(None);
                }
            }
        }
        tags.sort_by(|a, b| a.value.cmp(&b.value));

        Ok(Some(tags))
    }

    /// 写入一组标签
    pub async fn cache_tags(redis: &Arc<RedisClient>, tags: &[TagEntity]) -> Result<(), redis::RedisError> {
        let Some(first) = tags.first() else {
            return Ok(());
        };
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let items: Vec<(String, &str)> = tags
            .iter()
            .map(|t| (t.id.to_string(), t.value.as_str()))
            .collect();
        let _: () = conn.hset_multiple(course_tags_key(first.course_id), &items[..]).await?;

        Ok(())
    }

    pub async fn add_tag(redis: &Arc<RedisClient>, tag: &TagEntity) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let _: () = conn
            .hset(course_tags_key(tag.course_id), tag.id.to_string(), &tag.value)
            .await?;

        Ok(())
    }

    /// 删除整个标签哈希
    pub async fn evict(redis: &Arc<RedisClient>, course_id: Uuid) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let _: () = conn.del(course_tags_key(course_id)).await?;

        Ok(())
    }

    pub async fn remove_tag(
        redis: &Arc<RedisClient>,
        course_id: Uuid,
        tag_id: Uuid,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let _: () = conn.hdel(course_tags_key(course_id), tag_id.to_string()).await?;

        Ok(())
    }
}
