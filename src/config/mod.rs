use std::env;
use std::time::Duration;

use thiserror::Error;

/// 令牌有效期上限（十年）
const MAX_TOKEN_LIFETIME_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("缺少环境变量 {0}")]
    Missing(&'static str),

    #[error("环境变量 {key} 的取值无效: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub app_env: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_expire_secs: u64,
    pub refresh_token_expire_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub media_base_url: String,
    pub media_cloud_name: String,
    pub media_api_key: String,
    pub media_api_secret: String,
    pub upload_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key))
    }

    /// 从任意键值来源构造配置，必填项缺失时返回错误，其余项使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let optional = |key: &str| lookup(key).ok().filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| lookup(key).map_err(|_| ConfigError::Missing(key));

        // 访问令牌以分钟计，刷新令牌以天计
        let token_lifetime = |key: &'static str, suffix: char, unit_secs: u64, default: u64| {
            let Some(raw) = optional(key) else {
                return Ok(default * unit_secs);
            };
            raw.trim()
                .trim_end_matches(suffix)
                .parse::<u64>()
                .ok()
                .and_then(|n| n.checked_mul(unit_secs))
                .filter(|secs| (1..=MAX_TOKEN_LIFETIME_SECS).contains(secs))
                .ok_or(ConfigError::Invalid { key, value: raw })
        };
        let access_token_expire_secs = token_lifetime("ACCESS_TOKEN_EXPIRE_MINUTES", 'm', 60, 15)?;
        let refresh_token_expire_secs =
            token_lifetime("REFRESH_TOKEN_EXPIRE_DAYS", 'd', 24 * 3600, 7)?;

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            access_token_secret: required("ACCESS_TOKEN_SECRET")?,
            refresh_token_secret: required("REFRESH_TOKEN_SECRET")?,
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "::".into()),
            server_port: optional("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            api_base_uri: optional("API_BASE_URI").unwrap_or_else(|| "/api/v1".into()),
            app_env: optional("APP_ENV").unwrap_or_else(|| "development".into()),
            access_token_expire_secs,
            refresh_token_expire_secs,
            rate_limit_window_secs: optional("RATE_LIMIT_WINDOW")
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            rate_limit_requests: optional("RATE_LIMIT_REQUESTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            media_base_url: optional("MEDIA_BASE_URL")
                .unwrap_or_else(|| "https://api.cloudinary.com".into()),
            media_cloud_name: optional("MEDIA_CLOUD_NAME").unwrap_or_default(),
            media_api_key: optional("MEDIA_API_KEY").unwrap_or_default(),
            media_api_secret: optional("MEDIA_API_SECRET").unwrap_or_default(),
            upload_concurrency: optional("UPLOAD_CONCURRENCY")
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(10),
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn access_token_expiration(&self) -> Duration {
        Duration::from_secs(self.access_token_expire_secs)
    }

    pub fn refresh_token_expiration(&self) -> Duration {
        Duration::from_secs(self.refresh_token_expire_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}
