use std::collections::HashMap;
use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};
use uuid::Uuid;

use super::serde_error;
use crate::cache::keys::course_videos_key;
use crate::database::models::video::VideoEntity;

/// 章节视频哈希缓存操作，字段为视频ID，值为视频JSON
pub struct VideoCacheOperations;

impl VideoCacheOperations {
    pub async fn cache_videos(
        redis: &Arc<RedisClient>,
        chapter_id: Uuid,
        videos: &[VideoEntity],
    ) -> Result<(), redis::RedisError> {
        if videos.is_empty() {
            return Ok(());
        }
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let mut items = Vec::with_capacity(videos.len());
        for video in videos {
            let json = serde_json::to_string(video).map_err(|e| serde_error("序列化错误", e))?;
            items.push((video.id.to_string(), json));
        }
        let _: () = conn.hset_multiple(course_videos_key(chapter_id), &items[..]).await?;

        Ok(())
    }

    pub async fn cache_video(redis: &Arc<RedisClient>, video: &VideoEntity) -> Result<(), redis::RedisError> {
        Self::cache_videos(redis, video.chapter_id, std::slice::from_ref(video)).await
    }

    /// 删除章节视频哈希，下次读取时从数据库重建
    pub async fn evict(redis: &Arc<RedisClient>, chapter_id: Uuid) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let _: () = conn.del(course_videos_key(chapter_id)).await?;

        Ok(())
    }

    /// 读取章节下的全部视频（按序号排序），哈希不存在时返回 `None`
    pub async fn get_videos(
        redis: &Arc<RedisClient>,
        chapter_id: Uuid,
    ) -> Result<Option<Vec<VideoEntity>>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let entries: HashMap<String, String> = conn.hgetall(course_videos_key(chapter_id)).await?;
        if entries.is_empty() {
            return Ok(None);
        }

        let mut videos = entries
            .values()
            .map(|json| serde_json::from_str::<VideoEntity>(json))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| serde_error("反序列化错误", e))?;
        videos.sort_by_key(|v| v.position);

        Ok(Some(videos))
    }
}
