//! Toko back-office service
//!
//! E-commerce back-office over PostgreSQL: product/variant/category catalog,
//! carts and checkout, order processing, media upload, and sales reporting,
//! exposed as a JSON HTTP API.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod domain;
pub mod error;
pub mod events;
pub mod models;
pub mod routes;
pub mod storage;

/// Shared per-process handles, injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
    pub media: Arc<dyn storage::MediaStore>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    /// 1-based page, limit clamped to 100, default 20 per page.
    pub fn resolve(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        (page, limit)
    }

    pub fn offset(&self) -> i64 {
        let (page, limit) = self.resolve();
        (page as i64 - 1) * limit as i64
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub data: Vec<T>,
}

/// Url-ish slug from a display name: lowercase, runs of non-alphanumerics
/// collapsed to single hyphens.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Slug with a short random suffix for uniqueness across inserts.
pub fn unique_slug(name: &str) -> String {
    format!("{}-{:06}", slugify(name), rand::random::<u32>() % 1_000_000)
}
