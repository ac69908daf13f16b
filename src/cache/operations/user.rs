use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};
use uuid::Uuid;

use super::serde_error;
use crate::cache::keys::user_keys;
use crate::cache::models::user::CachedUser;

/// 用户缓存操作
pub struct UserCacheOperations;

impl UserCacheOperations {
    /// 将用户信息缓存到 Redis，过期时间与刷新令牌一致
    pub async fn cache_user(
        redis: &Arc<RedisClient>,
        user: &CachedUser,
        ttl_secs: u64,
    ) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let key = user_keys::user_key(user.id);
        let json = serde_json::to_string(user).map_err(|e| serde_error("序列化错误", e))?;

        let _: () = conn.set_ex(key, json, ttl_secs).await?;

        Ok(())
    }

    /// 从 Redis 获取用户信息
    pub async fn get_cached_user(
        redis: &Arc<RedisClient>,
        user_id: Uuid,
    ) -> Result<Option<CachedUser>, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let key = user_keys::user_key(user_id);
        let result: Option<String> = conn.get(key).await?;

        match result {
            Some(json) => {
                let cached_user =
                    serde_json::from_str(&json).map_err(|e| serde_error("反序列化错误", e))?;
                Ok(Some(cached_user))
            }
            None => Ok(None),
        }
    }

    /// 从缓存中删除用户
    pub async fn remove_user(redis: &Arc<RedisClient>, user_id: Uuid) -> Result<(), redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;

        let _: () = conn.del(user_keys::user_key(user_id)).await?;

        Ok(())
    }
}
