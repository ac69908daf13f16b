use std::collections::HashMap;
use std::future::Future;

use futures_util::stream::{self, StreamExt, TryStreamExt};

/// 按并发上限执行一批上传，结果按标题收集
///
/// 任一上传失败时立即返回该错误，尚未完成的上传会被丢弃。
pub async fn upload_bounded<T, R, E, F, Fut>(
    items: Vec<(String, T)>,
    concurrency: usize,
    upload: F,
) -> Result<HashMap<String, R>, E>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let upload = &upload;

    stream::iter(items)
        .map(|(title, item)| async move { upload(item).await.map(|result| (title, result)) })
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await
}
