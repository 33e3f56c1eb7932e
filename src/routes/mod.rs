//! HTTP surface. Thin request/response translators over the store; the
//! logic-bearing pieces live under `crate::domain`.

use axum::{
    routing::{delete, get, patch, post},
    Json, Router,
};

use crate::AppState;

pub mod carts;
pub mod categories;
pub mod customers;
pub mod media;
pub mod orders;
pub mod products;
pub mod reports;
pub mod seed;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "toko-backoffice"})) }),
        )
        .route("/carts/add", post(carts::add))
        .route("/carts/checkout", post(carts::checkout))
        .route("/carts/clear", post(carts::clear))
        .route("/carts/remove", delete(carts::remove_item))
        .route("/carts/update", patch(carts::update_item))
        .route("/carts/:customer_slug", get(carts::get_cart))
        .route("/categories/tree", get(categories::tree))
        .route("/categories/detail/:slug", get(categories::detail))
        .route("/categories/add", post(categories::create))
        .route("/products/add", post(products::create))
        .route("/products/lists", get(products::list))
        .route("/products/:slug", get(products::detail))
        .route("/products/:slug/edit", patch(products::edit))
        .route("/products/:slug/delete", delete(products::delete))
        .route("/customers/add", post(customers::create))
        .route("/customers/lists", get(customers::list))
        .route("/customers/:slug", get(customers::detail))
        .route("/customers/:slug/edit", patch(customers::edit))
        .route("/customers/:slug/delete", delete(customers::delete))
        .route("/orders/lists", get(orders::list))
        .route("/orders/:slug", get(orders::detail))
        .route("/multiple-upload", post(media::multiple_upload))
        .route("/reports/sales", get(reports::sales))
        .route("/dev/seed", post(seed::run))
        .with_state(state)
}
