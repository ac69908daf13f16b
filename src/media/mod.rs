//! 外部媒体存储（Cloudinary 兼容接口）
//!
//! 负责图片/视频的上传与删除，以及按并发上限批量上传章节视频。

mod batch;
mod client;
mod public_id;

pub use batch::upload_bounded;
pub use client::{MediaStore, ResourceType, UploadItem, UploadedAsset};
pub use public_id::public_id_from_url;

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("媒体服务请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("媒体服务拒绝请求 ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("无效的媒体地址: {0}")]
    InvalidUrl(String),
}

impl MediaError {
    /// 上游返回的 HTTP 状态码（如果有）
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            MediaError::Http(e) => e.status(),
            MediaError::Rejected { status, .. } => Some(*status),
            MediaError::InvalidUrl(_) => Some(StatusCode::BAD_REQUEST),
        }
    }
}
