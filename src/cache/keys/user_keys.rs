use uuid::Uuid;

/// 用户缓存键前缀
const USER_PREFIX: &str = "user:";

/// 限流计数键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 生成用户缓存键 `user:<id>`
pub fn user_key(user_id: Uuid) -> String {
    format!("{}{}", USER_PREFIX, user_id)
}

/// 生成限流计数键
pub fn rate_limit_key(ip: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, ip)
}
