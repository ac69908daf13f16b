/// 存储库：封装所有 SQL 访问
pub mod chapter;
pub mod course;
pub mod tag;
pub mod user;
pub mod video;

pub use chapter::{ChapterChanges, ChapterRepository};
pub use course::{CourseChanges, CourseRepository, NewCourse};
pub use tag::TagRepository;
pub use user::UserRepository;
pub use video::{NewVideo, VideoChanges, VideoRepository};
