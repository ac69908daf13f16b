use std::collections::HashSet;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use uuid::Uuid;

use crate::AppState;
use crate::cache::TagCacheOperations;
use crate::database::models::tag::TagEntity;
use crate::database::repositories::TagRepository;
use crate::error::{AppError, AppResult};

/// 标签文本最大长度（字符），与 `course_tags.value` 列宽一致
pub const MAX_TAG_LEN: usize = 64;

/// 现有标签与提交标签的差异
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagDiff {
    /// 需要新增的标签文本
    pub to_add: Vec<String>,
    /// 不再出现在提交列表中的标签
    pub to_remove: Vec<TagEntity>,
    /// 保持不变的标签
    pub unchanged: Vec<TagEntity>,
}

impl TagDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// 去除首尾空白、丢弃空值并按首次出现顺序去重
pub fn normalize_tags(incoming: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    incoming
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect()
}

/// 规范化后的标签不能超过列宽
pub fn validate_tags(incoming: &[String]) -> AppResult<()> {
    match normalize_tags(incoming)
        .into_iter()
        .find(|t| t.chars().count() > MAX_TAG_LEN)
    {
        Some(tag) => Err(AppError::BadRequest(format!(
            "标签长度不能超过{}个字符: {}",
            MAX_TAG_LEN, tag
        ))),
        None => Ok(()),
    }
}

/// 按标签文本排序，保证响应顺序稳定
pub fn sort_tags(tags: &mut [TagEntity]) {
    tags.sort_by(|a, b| a.value.cmp(&b.value));
}

/// 计算标签差异
///
/// 现有标签中重复的文本只保留第一条，其余进入 `to_remove`。
pub fn diff_tags(existing: &[TagEntity], incoming: &[String]) -> TagDiff {
    let incoming = normalize_tags(incoming);
    let wanted: HashSet<&str> = incoming.iter().map(String::as_str).collect();

    let mut diff = TagDiff::default();
    let mut kept: HashSet<&str> = HashSet::new();

    for tag in existing {
        if wanted.contains(tag.value.as_str()) && kept.insert(tag.value.as_str()) {
            diff.unchanged.push(tag.clone());
        } else {
            diff.to_remove.push(tag.clone());
        }
    }

    diff.to_add = incoming
        .into_iter()
        .filter(|value| !kept.contains(value.as_str()))
        .collect();

    diff
}

/// 读取课程标签：优先缓存，未命中时查询数据库并回填
pub async fn load_tags(state: &AppState, course_id: Uuid) -> AppResult<Vec<TagEntity>> {
    match TagCacheOperations::get_tags(&state.redis, course_id).await {
        Ok(Some(tags)) => return Ok(tags),
        Ok(None) => {}
        Err(e) => tracing::warn!("Failed to read tags of course {} from cache: {}", course_id, e),
    }

    let tags = TagRepository::list_by_course(&state.pool, course_id).await?;
    if let Err(e) = TagCacheOperations::cache_tags(&state.redis, &tags).await {
        tracing::warn!("Failed to cache tags of course {}: {}", course_id, e);
    }

    Ok(tags)
}

enum TagOp {
    Add(String),
    Remove(TagEntity),
}

/// 以一个有并发上限的批次应用标签差异，返回最终的标签列表
pub async fn apply_tag_diff(state: &AppState, course_id: Uuid, diff: TagDiff) -> AppResult<Vec<TagEntity>> {
    let TagDiff {
        to_add,
        to_remove,
        mut unchanged,
    } = diff;

    tracing::debug!(
        "Reconciling tags of course {}: +{} -{} ={}",
        course_id,
        to_add.len(),
        to_remove.len(),
        unchanged.len()
    );

    let ops = to_add
        .into_iter()
        .map(TagOp::Add)
        .chain(to_remove.into_iter().map(TagOp::Remove));

    let result: AppResult<Vec<Option<TagEntity>>> = stream::iter(ops)
        .map(|op| async move {
            match op {
                TagOp::Add(value) => {
                    let tag = TagRepository::insert(&state.pool, course_id, &value).await?;
                    if let Err(e) = TagCacheOperations::add_tag(&state.redis, &tag).await {
                        tracing::warn!("Failed to cache tag {}: {}", tag.id, e);
                    }
                    AppResult::Ok(Some(tag))
                }
                TagOp::Remove(tag) => {
                    TagRepository::delete(&state.pool, tag.id).await?;
                    if let Err(e) = TagCacheOperations::remove_tag(&state.redis, course_id, tag.id).await {
                        tracing::warn!("Failed to evict tag {}: {}", tag.id, e);
                    }
                    Ok(None)
                }
            }
        })
        .buffer_unordered(state.config.upload_concurrency)
        .try_collect()
        .await;

    // 出错时未完成的操作被丢弃，缓存可能落后于数据库，删除后由下次读取重建
    let added = match result {
        Ok(added) => added,
        Err(e) => {
            if let Err(evict_err) = TagCacheOperations::evict(&state.redis, course_id).await {
                tracing::warn!("Failed to evict tags of course {}: {}", course_id, evict_err);
            }
            return Err(e);
        }
    };

    unchanged.extend(added.into_iter().flatten());
    sort_tags(&mut unchanged);

    Ok(unchanged)
}
