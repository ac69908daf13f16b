use uuid::Uuid;

/// 课程缓存键前缀
const COURSE_PREFIX: &str = "course:";

/// 课程标签哈希键前缀
const COURSE_TAGS_PREFIX: &str = "course_tags:";

/// 章节视频哈希键前缀
const COURSE_VIDEOS_PREFIX: &str = "course_videos:";

/// 生成课程缓存键 `course:<id>`
pub fn course_key(course_id: Uuid) -> String {
    format!("{}{}", COURSE_PREFIX, course_id)
}

/// 生成课程标签哈希键 `course_tags:<id>`，字段为标签ID
pub fn course_tags_key(course_id: Uuid) -> String {
    format!("{}{}", COURSE_TAGS_PREFIX, course_id)
}

/// 生成章节缓存键 `course:<courseId>:chapters:<chapterId>`，每个字段单独存储
pub fn chapter_key(course_id: Uuid, chapter_id: Uuid) -> String {
    format!("{}{}:chapters:{}", COURSE_PREFIX, course_id, chapter_id)
}

/// 生成章节视频哈希键 `course_videos:<chapterId>`，字段为视频ID
pub fn course_videos_key(chapter_id: Uuid) -> String {
    format!("{}{}", COURSE_VIDEOS_PREFIX, chapter_id)
}
