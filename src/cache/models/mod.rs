/// 缓存数据模型
/// 定义缓存数据的结构体
// 用户缓存模型
pub mod user;

// 章节按字段缓存
pub mod chapter;

// 重新导出常用类型
pub use user::CachedUser;
