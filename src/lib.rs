use config::Config;
use media::MediaStore;
use redis::Client as RedisClient;
use sqlx::PgPool;
use std::sync::Arc;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod media;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub redis: Arc<RedisClient>,
    pub media: MediaStore,
}
