use std::collections::HashMap;

use uuid::Uuid;

use crate::database::models::chapter::{ChapterEntity, ChapterStatus};

/// 章节哈希中的字段名
pub const FIELD_ID: &str = "id";
pub const FIELD_COURSE_ID: &str = "course_id";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_POSITION: &str = "position";
pub const FIELD_STATUS: &str = "status";

/// 章节按字段展开为哈希条目
pub fn chapter_to_fields(chapter: &ChapterEntity) -> Vec<(&'static str, String)> {
    vec![
        (FIELD_ID, chapter.id.to_string()),
        (FIELD_COURSE_ID, chapter.course_id.to_string()),
        (FIELD_TITLE, chapter.title.clone()),
        (FIELD_DESCRIPTION, chapter.description.clone()),
        (FIELD_POSITION, chapter.position.to_string()),
        (FIELD_STATUS, chapter.status.as_str().to_string()),
    ]
}

/// 从哈希条目还原章节，字段缺失或格式错误时视为未命中
pub fn chapter_from_fields(fields: &HashMap<String, String>) -> Option<ChapterEntity> {
    Some(ChapterEntity {
        id: Uuid::parse_str(fields.get(FIELD_ID)?).ok()?,
        course_id: Uuid::parse_str(fields.get(FIELD_COURSE_ID)?).ok()?,
        title: fields.get(FIELD_TITLE)?.clone(),
        description: fields.get(FIELD_DESCRIPTION)?.clone(),
        position: fields.get(FIELD_POSITION)?.parse().ok()?,
        status: ChapterStatus::try_from(fields.get(FIELD_STATUS)?.clone()).ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChapterEntity {
        ChapterEntity {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            title: "Ownership".into(),
            description: "Moves and borrows".into(),
            position: 2,
            status: ChapterStatus::Published,
        }
    }

    #[test]
    fn test_fields_restore_chapter() {
        let chapter = sample();
        let fields: HashMap<String, String> = chapter_to_fields(&chapter)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        assert_eq!(chapter_from_fields(&fields), Some(chapter));
    }

    #[test]
    fn test_partial_hash_is_a_miss() {
        let mut fields: HashMap<String, String> = chapter_to_fields(&sample())
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        fields.remove(FIELD_STATUS);

        assert_eq!(chapter_from_fields(&fields), None);
    }
}
