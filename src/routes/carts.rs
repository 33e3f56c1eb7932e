//! Cart workflow: fetch, add/increment, update, remove, clear, checkout.
//!
//! Line identity is the exact (product, variant) pair, variant absence
//! matching absence. Unit prices are snapshotted when a line is first added
//! and never re-priced against the catalog; `total` is kept equal to
//! `price * quantity` after every mutation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::events;
use crate::models::{order_status, Cart, CartItem, Customer, Order, OrderItem};
use crate::AppState;

pub async fn find_customer(db: &PgPool, slug: &str) -> ApiResult<Customer> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE slug = $1")
        .bind(slug)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound("customer"))
}

/// "First cart for this customer" lookup; creates one when none exists.
async fn find_or_create_cart(db: &PgPool, customer_id: Uuid) -> ApiResult<Cart> {
    let existing = sqlx::query_as::<_, Cart>(
        "SELECT * FROM carts WHERE customer_id = $1 ORDER BY created_at LIMIT 1",
    )
    .bind(customer_id)
    .fetch_optional(db)
    .await?;
    if let Some(cart) = existing {
        return Ok(cart);
    }
    let cart =
        sqlx::query_as::<_, Cart>("INSERT INTO carts (id, customer_id) VALUES ($1, $2) RETURNING *")
            .bind(Uuid::now_v7())
            .bind(customer_id)
            .fetch_one(db)
            .await?;
    Ok(cart)
}

async fn cart_items(db: &PgPool, cart_id: Uuid) -> ApiResult<Vec<CartItem>> {
    let items = sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY created_at",
    )
    .bind(cart_id)
    .fetch_all(db)
    .await?;
    Ok(items)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart: Option<Cart>,
    pub items: Vec<CartItem>,
    pub subtotal: i64,
}

pub async fn get_cart(
    State(s): State<AppState>,
    Path(customer_slug): Path<String>,
) -> ApiResult<Json<CartView>> {
    let customer = find_customer(&s.db, &customer_slug).await?;
    let cart = sqlx::query_as::<_, Cart>(
        "SELECT * FROM carts WHERE customer_id = $1 ORDER BY created_at LIMIT 1",
    )
    .bind(customer.id)
    .fetch_optional(&s.db)
    .await?;
    let items = match &cart {
        Some(cart) => cart_items(&s.db, cart.id).await?,
        None => Vec::new(),
    };
    let subtotal = items.iter().map(|i| i.total).sum();
    Ok(Json(CartView { cart, items, subtotal }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub customer_slug: Option<String>,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub quantity: Option<i32>,
}

pub async fn add(
    State(s): State<AppState>,
    Json(req): Json<AddToCartRequest>,
) -> ApiResult<(StatusCode, Json<CartItem>)> {
    let slug = req
        .customer_slug
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation("customerSlug is required"))?;
    let (Some(product_id), Some(quantity)) = (req.product_id, req.quantity) else {
        return Err(ApiError::validation("productId and quantity are required"));
    };

    let customer = find_customer(&s.db, slug).await?;
    let cart = find_or_create_cart(&s.db, customer.id).await?;

    let existing = sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items
         WHERE cart_id = $1 AND product_id = $2 AND variant_id IS NOT DISTINCT FROM $3",
    )
    .bind(cart.id)
    .bind(product_id)
    .bind(req.variant_id)
    .fetch_optional(&s.db)
    .await?;

    if let Some(line) = existing {
        // Increment against the stored price snapshot, never the current
        // catalog price.
        let updated = sqlx::query_as::<_, CartItem>(
            "UPDATE cart_items SET quantity = $2, total = price * $2 WHERE id = $1 RETURNING *",
        )
        .bind(line.id)
        .bind(line.quantity + quantity)
        .fetch_one(&s.db)
        .await?;
        return Ok((StatusCode::OK, Json(updated)));
    }

    let price: i64 = match req.variant_id {
        Some(variant_id) => sqlx::query_scalar("SELECT price FROM variants WHERE id = $1")
            .bind(variant_id)
            .fetch_optional(&s.db)
            .await?
            .unwrap_or(0),
        None => sqlx::query_scalar("SELECT price FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&s.db)
            .await?
            .unwrap_or(0),
    };

    let line = sqlx::query_as::<_, CartItem>(
        "INSERT INTO cart_items (id, cart_id, product_id, variant_id, quantity, price, total)
         VALUES ($1, $2, $3, $4, $5, $6, $6 * $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(cart.id)
    .bind(product_id)
    .bind(req.variant_id)
    .bind(quantity)
    .bind(price)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(line)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSlugRequest {
    pub customer_slug: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Converts the cart into an order and clears the items, in one transaction:
/// a failure at any step leaves both the cart and the order store untouched.
pub async fn checkout(
    State(s): State<AppState>,
    Json(req): Json<CustomerSlugRequest>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)> {
    let slug = req
        .customer_slug
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation("customerSlug is required"))?;
    let customer = find_customer(&s.db, slug).await?;

    let cart = sqlx::query_as::<_, Cart>(
        "SELECT * FROM carts WHERE customer_id = $1 ORDER BY created_at LIMIT 1",
    )
    .bind(customer.id)
    .fetch_optional(&s.db)
    .await?
    .ok_or_else(|| ApiError::validation("cart is empty"))?;

    let lines = cart_items(&s.db, cart.id).await?;
    if lines.is_empty() {
        return Err(ApiError::validation("cart is empty"));
    }
    let subtotal: i64 = lines.iter().map(|l| l.total).sum();

    let mut tx = s.db.begin().await?;
    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, order_number, customer_id, status, subtotal, total_amount, ordered_at)
         VALUES ($1, $2, $3, $4, $5, $5, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(format!("ORD-{:08}", rand::random::<u32>() % 100_000_000))
    .bind(customer.id)
    .bind(order_status::PENDING)
    .bind(subtotal)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = sqlx::query_as::<_, OrderItem>(
            "INSERT INTO order_items (id, order_id, product_id, variant_id, quantity, price, total)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(line.product_id)
        .bind(line.variant_id)
        .bind(line.quantity)
        .bind(line.price)
        .bind(line.total)
        .fetch_one(&mut *tx)
        .await?;
        items.push(item);
    }
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    events::publish_order_created(&s.nats, &order).await;
    tracing::info!(order_number = %order.order_number, subtotal, "checkout completed");
    Ok((StatusCode::CREATED, Json(CheckoutResponse { order, items })))
}

pub async fn clear(
    State(s): State<AppState>,
    Json(req): Json<CustomerSlugRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut deleted = 0u64;
    if let Some(slug) = req.customer_slug.as_deref().filter(|v| !v.is_empty()) {
        let cart = sqlx::query_as::<_, Cart>(
            "SELECT c.* FROM carts c JOIN customers cu ON cu.id = c.customer_id
             WHERE cu.slug = $1 ORDER BY c.created_at LIMIT 1",
        )
        .bind(slug)
        .fetch_optional(&s.db)
        .await?;
        if let Some(cart) = cart {
            deleted = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
                .bind(cart.id)
                .execute(&s.db)
                .await?
                .rows_affected();
        }
    }
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    pub cart_item_id: Option<Uuid>,
}

pub async fn remove_item(
    State(s): State<AppState>,
    Json(req): Json<RemoveItemRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = req
        .cart_item_id
        .ok_or_else(|| ApiError::validation("cartItemId is required"))?;
    let deleted = sqlx::query("DELETE FROM cart_items WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?
        .rows_affected();
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub cart_item_id: Option<Uuid>,
    pub quantity: Option<i32>,
}

pub async fn update_item(
    State(s): State<AppState>,
    Json(req): Json<UpdateItemRequest>,
) -> ApiResult<Json<CartItem>> {
    let (Some(id), Some(quantity)) = (req.cart_item_id, req.quantity) else {
        return Err(ApiError::validation("cartItemId and quantity are required"));
    };
    let updated = sqlx::query_as::<_, CartItem>(
        "UPDATE cart_items SET quantity = $2, total = price * $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(quantity)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("cart item"))?;
    Ok(Json(updated))
}
