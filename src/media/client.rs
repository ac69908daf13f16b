use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use axum::http::StatusCode;
use reqwest::multipart::Form;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{MediaError, public_id_from_url, upload_bounded};
use crate::config::Config;

const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// 资源类型，对应上传接口路径中的一段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Image,
    Video,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
        }
    }
}

/// 上传成功后媒体服务返回的资源信息
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedAsset {
    pub public_id: String,
    pub secure_url: String,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// 批量上传中的一项，`source` 为 data URI 或远程地址
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub title: String,
    pub source: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DestroyBody {
    result: String,
}

/// 媒体存储客户端
#[derive(Clone)]
pub struct MediaStore {
    http: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl MediaStore {
    pub fn new(config: &Config) -> Result<Self, MediaError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: config.media_base_url.trim_end_matches('/').to_string(),
            cloud_name: config.media_cloud_name.clone(),
            api_key: config.media_api_key.clone(),
            api_secret: config.media_api_secret.clone(),
        })
    }

    fn endpoint(&self, resource_type: ResourceType, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.base_url,
            self.cloud_name,
            resource_type.as_str(),
            action
        )
    }

    /// 对参数签名：按键排序后拼接，再附加密钥做 SHA-256
    fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        let payload = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        hex::encode(Sha256::digest(format!("{}{}", payload, self.api_secret).as_bytes()))
    }

    fn signed_form(&self, mut params: BTreeMap<&str, String>) -> Form {
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = self.sign(&params);

        let mut form = Form::new();
        for (key, value) in params {
            form = form.text(key.to_string(), value);
        }
        form.text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }

    async fn rejected(response: reqwest::Response) -> MediaError {
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };
        MediaError::Rejected { status, message }
    }

    /// 上传单个资源
    pub async fn upload(
        &self,
        source: &str,
        folder: &str,
        resource_type: ResourceType,
    ) -> Result<UploadedAsset, MediaError> {
        let params = BTreeMap::from([("folder", folder.to_string())]);
        let form = self.signed_form(params).text("file", source.to_string());

        let response = self
            .http
            .post(self.endpoint(resource_type, "upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::rejected(response).await;
            tracing::error!("Media upload to {} failed: {}", folder, err);
            return Err(err);
        }

        let asset: UploadedAsset = response.json().await?;
        tracing::debug!("Uploaded {} to {}", asset.public_id, asset.secure_url);
        Ok(asset)
    }

    /// 删除资源，资源已不存在时视为成功
    pub async fn destroy(&self, public_id: &str, resource_type: ResourceType) -> Result<(), MediaError> {
        let params = BTreeMap::from([("public_id", public_id.to_string())]);
        let form = self.signed_form(params);

        let response = self
            .http
            .post(self.endpoint(resource_type, "destroy"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let body: DestroyBody = response.json().await?;
        match body.result.as_str() {
            "ok" => Ok(()),
            "not found" => {
                tracing::warn!("Media asset {} already removed", public_id);
                Ok(())
            }
            other => Err(MediaError::Rejected {
                status: StatusCode::BAD_GATEWAY,
                message: format!("destroy {} returned {}", public_id, other),
            }),
        }
    }

    /// 替换资源：先删除旧资源（由地址推导 public id），再上传新资源
    pub async fn replace(
        &self,
        previous_url: Option<&str>,
        source: &str,
        folder: &str,
        resource_type: ResourceType,
    ) -> Result<UploadedAsset, MediaError> {
        let previous_id = match previous_url.map(public_id_from_url) {
            Some(Ok(public_id)) => Some(public_id),
            Some(Err(_)) => {
                // 旧地址不是本服务的资源，无需删除
                tracing::warn!("Skip destroying foreign media url {:?}", previous_url);
                None
            }
            None => None,
        };

        self.replace_by_id(previous_id.as_deref(), source, folder, resource_type)
            .await
    }

    /// 已知旧资源 public id 时直接删除，再上传新资源
    pub async fn replace_by_id(
        &self,
        previous_id: Option<&str>,
        source: &str,
        folder: &str,
        resource_type: ResourceType,
    ) -> Result<UploadedAsset, MediaError> {
        if let Some(public_id) = previous_id {
            self.destroy(public_id, resource_type).await?;
        }

        self.upload(source, folder, resource_type).await
    }

    /// 批量上传视频，结果按标题收集
    pub async fn upload_videos(
        &self,
        items: Vec<UploadItem>,
        folder: &str,
        concurrency: usize,
    ) -> Result<HashMap<String, UploadedAsset>, MediaError> {
        let total = items.len();
        let items = items
            .into_iter()
            .map(|item| (item.title, item.source))
            .collect();

        let uploaded = upload_bounded(items, concurrency, |source: String| async move {
            self.upload(&source, folder, ResourceType::Video).await
        })
        .await?;

        tracing::info!("Uploaded {} videos to {} (concurrency {})", total, folder, concurrency);
        Ok(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(base_url: &str) -> MediaStore {
        let mut config = test_config();
        config.media_base_url = base_url.to_string();
        config.media_cloud_name = "demo".into();
        config.media_api_key = "key-123".into();
        config.media_api_secret = "shh".into();
        MediaStore::new(&config).unwrap()
    }

    #[test]
    fn test_signature_is_order_independent() {
        let store = store("http://localhost");
        let a = BTreeMap::from([("folder", "courses".to_string()), ("timestamp", "1".to_string())]);
        let b = BTreeMap::from([("timestamp", "1".to_string()), ("folder", "courses".to_string())]);

        assert_eq!(store.sign(&a), store.sign(&b));
        assert_eq!(store.sign(&a).len(), 64);
    }

    #[tokio::test]
    async fn test_upload_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .and(body_string_contains("courses"))
            .and(body_string_contains("key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "courses/cover",
                "secure_url": "https://res.example.com/demo/image/upload/v1/courses/cover.png"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let asset = store(&mock_server.uri())
            .upload("data:image/png;base64,AAAA", "courses", ResourceType::Image)
            .await
            .unwrap();

        assert_eq!(asset.public_id, "courses/cover");
        assert_eq!(asset.duration, None);
    }

    #[tokio::test]
    async fn test_upload_rejected_keeps_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/video/upload"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "Invalid file" }
            })))
            .mount(&mock_server)
            .await;

        let err = store(&mock_server.uri())
            .upload("not-a-file", "lessons", ResourceType::Video)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert!(err.to_string().contains("Invalid file"));
    }

    #[tokio::test]
    async fn test_replace_destroys_previous_asset() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/destroy"))
            .and(body_string_contains("courses/old_cover"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "ok"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "courses/new_cover",
                "secure_url": "https://res.example.com/demo/image/upload/v2/courses/new_cover.png"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let asset = store(&mock_server.uri())
            .replace(
                Some("https://res.example.com/demo/image/upload/v1/courses/old_cover.png"),
                "data:image/png;base64,BBBB",
                "courses",
                ResourceType::Image,
            )
            .await
            .unwrap();

        assert_eq!(asset.public_id, "courses/new_cover");
    }

    #[tokio::test]
    async fn test_replace_by_id_uses_stored_public_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/video/destroy"))
            .and(body_string_contains("lessons/stored_clip"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "ok"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/video/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "lessons/new_clip",
                "secure_url": "https://res.example.com/demo/video/upload/v3/lessons/new_clip.mp4"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let asset = store(&mock_server.uri())
            .replace_by_id(
                Some("lessons/stored_clip"),
                "https://files.example.com/new.mp4",
                "lessons",
                ResourceType::Video,
            )
            .await
            .unwrap();

        assert_eq!(asset.public_id, "lessons/new_clip");
    }

    #[tokio::test]
    async fn test_upload_videos_collects_by_title() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/video/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "lessons/clip",
                "secure_url": "https://res.example.com/demo/video/upload/v1/lessons/clip.mp4",
                "duration": 42.5
            })))
            .expect(3)
            .mount(&mock_server)
            .await;

        let items = ["Intro", "Setup", "Wrap-up"]
            .iter()
            .map(|title| UploadItem {
                title: title.to_string(),
                source: "https://files.example.com/clip.mp4".into(),
            })
            .collect();

        let uploaded = store(&mock_server.uri())
            .upload_videos(items, "lessons", 10)
            .await
            .unwrap();

        assert_eq!(uploaded.len(), 3);
        assert_eq!(uploaded["Setup"].duration, Some(42.5));
    }
}
