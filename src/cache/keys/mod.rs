/// 缓存键模块
/// 提供各种缓存键生成函数

// 用户缓存键模块
pub mod user_keys;

// 课程、章节、标签、视频缓存键模块
pub mod course_keys;

// 重新导出常用的键生成函数
pub use course_keys::{chapter_key, course_key, course_tags_key, course_videos_key};
pub use user_keys::{rate_limit_key, user_key};
