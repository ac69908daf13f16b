// 缓存模块
// 包含缓存键、缓存数据结构和操作逻辑
// 缓存只是数据库记录的尽力镜像，不保证与数据库强一致

pub mod keys;
pub mod models;
pub mod operations;

// 重新导出常用类型和函数，方便其他模块使用
pub use models::user::CachedUser;
pub use operations::{
    ChapterCacheOperations, CourseCacheOperations, TagCacheOperations, UserCacheOperations,
    VideoCacheOperations,
};
