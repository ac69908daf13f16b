use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;

use crate::{
    cache::keys::rate_limit_key,
    config::Config,
    utils::{error_codes, error_to_api_response},
};

/// 基于 Redis 计数器的固定窗口限流
#[derive(Clone)]
pub struct RateLimiter {
    redis: Arc<redis::Client>,
    config: Arc<Config>,
}

/// 依次读取 `x-real-ip`、`x-forwarded-for` 的第一个地址，最后使用连接地址
fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()))
                .map(str::to_string)
        })
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
        .map(|ip| ip.trim().to_string())
        .unwrap_or_else(|| "unknown".into())
}

impl RateLimiter {
    pub fn new(redis: Arc<redis::Client>, config: Config) -> Self {
        Self {
            redis,
            config: Arc::new(config),
        }
    }

    /// 计数并返回窗口内的请求次数
    async fn hit(&self, ip: &str) -> Result<u64, redis::RedisError> {
        let key = rate_limit_key(ip);
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let count: u64 = conn.incr(&key, 1).await?;
        if count == 1 {
            let _: () = conn
                .expire(&key, self.config.rate_limit_window().as_secs() as i64)
                .await?;
        }
        Ok(count)
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        let remote = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);
        let ip = client_ip(req.headers(), remote);

        let count = match self.hit(&ip).await {
            Ok(count) => count,
            Err(e) => {
                // Redis 不可用时放行请求
                tracing::warn!("Rate limiter unavailable for {}: {}", ip, e);
                return next.run(req).await;
            }
        };

        if count > u64::from(self.config.rate_limit_requests) {
            tracing::debug!("Rate limit exceeded for {} ({} requests)", ip, count);
            return (
                StatusCode::TOO_MANY_REQUESTS,
                error_to_api_response::<()>(
                    error_codes::RATE_LIMIT,
                    format!(
                        "请求过于频繁，请在{}秒后重试",
                        self.config.rate_limit_window().as_secs()
                    ),
                ),
            )
                .into_response();
        }

        next.run(req).await
    }
}

pub async fn rate_limit(State(limiter): State<Arc<RateLimiter>>, req: Request<Body>, next: Next) -> Response {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_precedence() {
        let remote: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        let mut headers = HeaderMap::new();

        assert_eq!(client_ip(&headers, Some(remote)), "10.0.0.9");
        assert_eq!(client_ip(&headers, None), "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" , 203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&headers, Some(remote)), "203.0.113.7");

        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers, Some(remote)), "198.51.100.2");
    }
}
