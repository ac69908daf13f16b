/// 缓存操作
/// 提供缓存操作的功能实现

// 用户缓存操作
pub mod user;

// 课程与标签缓存操作
pub mod course;
pub mod tag;

// 章节与视频缓存操作
pub mod chapter;
pub mod video;

// 重新导出常用操作
pub use chapter::ChapterCacheOperations;
pub use course::CourseCacheOperations;
pub use tag::TagCacheOperations;
pub use user::UserCacheOperations;
pub use video::VideoCacheOperations;

/// JSON 编解码失败转换为 Redis 错误
pub(crate) fn serde_error(desc: &'static str, e: serde_json::Error) -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::IoError, desc, e.to_string()))
}
