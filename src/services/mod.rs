// 业务服务层
// 数据库是权威数据源，缓存写入失败只记录日志

pub mod changes;
pub mod chapter;
pub mod course;
pub mod course_read;
pub mod tags;
pub mod token;
pub mod user;
