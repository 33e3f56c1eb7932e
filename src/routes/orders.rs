//! Order read surface: detail by order number, paginated filterable listing.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Customer, Order, OrderItem};
use crate::{AppState, PageParams, Paginated};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
}

pub async fn detail(
    State(s): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<OrderDetail>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_number = $1")
        .bind(&slug)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("order"))?;
    let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
        .bind(order.customer_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("customer"))?;
    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
        .bind(order.id)
        .fetch_all(&s.db)
        .await?;
    Ok(Json(OrderDetail {
        order,
        customer,
        items,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub customer_slug: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRow {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

pub async fn list(
    State(s): State<AppState>,
    Query(p): Query<OrderListParams>,
) -> ApiResult<Json<Paginated<OrderRow>>> {
    let pager = PageParams {
        page: p.page,
        limit: p.limit,
    };
    let (page, limit) = pager.resolve();
    let status = p.status.as_deref().filter(|v| !v.is_empty());
    let customer = p.customer_slug.as_deref().filter(|v| !v.is_empty());

    const FILTER: &str = "($1::text IS NULL OR o.status = $1)
         AND ($2::text IS NULL
              OR o.customer_id IN (SELECT id FROM customers WHERE slug = $2))";

    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT o.* FROM orders o WHERE {FILTER} ORDER BY o.ordered_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(status)
    .bind(customer)
    .bind(limit as i64)
    .bind(pager.offset())
    .fetch_all(&s.db)
    .await?;
    let total: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders o WHERE {FILTER}"))
            .bind(status)
            .bind(customer)
            .fetch_one(&s.db)
            .await?;

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let all_items =
        sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = ANY($1)")
            .bind(&ids)
            .fetch_all(&s.db)
            .await?;

    let data = orders
        .into_iter()
        .map(|order| {
            let items = all_items
                .iter()
                .filter(|i| i.order_id == order.id)
                .cloned()
                .collect();
            OrderRow { order, items }
        })
        .collect();
    Ok(Json(Paginated {
        page,
        limit,
        total,
        data,
    }))
}
