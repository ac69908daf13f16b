use super::MediaError;

/// 转换参数的键，如 `c_fill`、`w_200`、`q_auto`
const TRANSFORMATION_KEYS: &[&str] = &[
    "a", "ac", "af", "ar", "b", "bl", "bo", "br", "c", "co", "cs", "d", "dl", "dn", "dpr", "du",
    "e", "eo", "f", "fl", "fn", "fps", "g", "h", "if", "ki", "l", "o", "p", "pg", "q", "r", "so",
    "sp", "t", "u", "vc", "vs", "w", "x", "y", "z",
];

fn is_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// 段内每个逗号分隔的部分都形如 `<键>_<值>`
fn is_transformation(segment: &str) -> bool {
    segment.split(',').all(|part| match part.split_once('_') {
        Some((key, value)) => !value.is_empty() && TRANSFORMATION_KEYS.contains(&key),
        None => false,
    })
}

/// 从媒体地址推导资源的 public id
///
/// `https://res.cloudinary.com/demo/image/upload/c_fill,w_200/v1712/courses/abc.jpg` → `courses/abc`
pub fn public_id_from_url(url: &str) -> Result<String, MediaError> {
    let (_, path) = url
        .split_once("/upload/")
        .ok_or_else(|| MediaError::InvalidUrl(url.to_string()))?;

    // 去掉查询参数
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // 有版本段时取其后的部分，否则跳过开头的转换段（最后一段始终保留）
    let start = match segments.iter().position(|s| is_version(s)) {
        Some(version) => version + 1,
        None => segments
            .iter()
            .take(segments.len().saturating_sub(1))
            .take_while(|s| is_transformation(s))
            .count(),
    };
    let path = segments[start.min(segments.len())..].join("/");

    // 去掉扩展名（只处理最后一段）
    let public_id = match path.rfind('.') {
        Some(dot) if !path[dot..].contains('/') => &path[..dot],
        _ => path.as_str(),
    };

    if public_id.is_empty() {
        return Err(MediaError::InvalidUrl(url.to_string()));
    }

    Ok(public_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_url_with_folder() {
        let id = public_id_from_url(
            "https://res.cloudinary.com/demo/image/upload/v1712345678/courses/cover_1.jpg",
        )
        .unwrap();
        assert_eq!(id, "courses/cover_1");
    }

    #[test]
    fn test_url_without_version() {
        let id = public_id_from_url("https://res.cloudinary.com/demo/video/upload/lessons/intro.mp4")
            .unwrap();
        assert_eq!(id, "lessons/intro");
    }

    #[test]
    fn test_query_string_and_dotted_folder() {
        let id = public_id_from_url(
            "https://res.cloudinary.com/demo/image/upload/v9/v1.2/banner?_a=xyz",
        )
        .unwrap();
        assert_eq!(id, "v1.2/banner");
    }

    #[test]
    fn test_transformations_before_version_skipped() {
        let id = public_id_from_url(
            "https://res.cloudinary.com/demo/image/upload/c_fill,w_200/v17/courses/a.jpg",
        )
        .unwrap();
        assert_eq!(id, "courses/a");
    }

    #[test]
    fn test_transformations_without_version_skipped() {
        let id = public_id_from_url(
            "https://res.cloudinary.com/demo/image/upload/q_auto,f_auto/t_thumb/course_covers/a.png",
        )
        .unwrap();
        assert_eq!(id, "course_covers/a");
    }

    #[test]
    fn test_folder_names_are_not_transformations() {
        let id = public_id_from_url("https://res.cloudinary.com/demo/image/upload/my_folder/a.png")
            .unwrap();
        assert_eq!(id, "my_folder/a");
    }

    #[test]
    fn test_rejects_foreign_url() {
        assert!(matches!(
            public_id_from_url("https://example.com/cover.png"),
            Err(MediaError::InvalidUrl(_))
        ));
    }
}
