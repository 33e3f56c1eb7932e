//! Sales report endpoint: resolve the window, fetch the matching orders with
//! their items, hand everything to the pure aggregator.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::reports::{
    aggregate, resolve_window, ItemRecord, OrderRecord, ReportType, SalesReport,
};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesParams {
    #[serde(rename = "type")]
    pub report_type: Option<ReportType>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub customer_slug: Option<String>,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_id: Uuid,
    customer_name: String,
    status: String,
    total_amount: i64,
    ordered_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    order_id: Uuid,
    product_id: Uuid,
    product_title: String,
    quantity: i32,
    price: i64,
    total: i64,
}

pub async fn sales(
    State(s): State<AppState>,
    Query(p): Query<SalesParams>,
) -> ApiResult<Json<SalesReport>> {
    let (start, end) = resolve_window(p.report_type, p.start, p.end, Utc::now())
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let status = p.status.as_deref().filter(|v| !v.is_empty());
    let customer = p.customer_slug.as_deref().filter(|v| !v.is_empty());

    let orders = sqlx::query_as::<_, OrderRow>(
        "SELECT o.id, o.order_number, o.customer_id, c.name AS customer_name,
                o.status, o.total_amount, o.ordered_at
         FROM orders o JOIN customers c ON c.id = o.customer_id
         WHERE o.ordered_at >= $1 AND o.ordered_at <= $2
           AND ($3::text IS NULL OR o.status = $3)
           AND ($4::text IS NULL OR c.slug = $4)
           AND ($5::uuid IS NULL OR EXISTS (
                SELECT 1 FROM order_items oi
                WHERE oi.order_id = o.id AND oi.product_id = $5))
         ORDER BY o.ordered_at ASC",
    )
    .bind(start)
    .bind(end)
    .bind(status)
    .bind(customer)
    .bind(p.product_id)
    .fetch_all(&s.db)
    .await?;

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = sqlx::query_as::<_, ItemRow>(
        "SELECT i.order_id, i.product_id, p.title AS product_title,
                i.quantity, i.price, i.total
         FROM order_items i JOIN products p ON p.id = i.product_id
         WHERE i.order_id = ANY($1)
           AND ($2::uuid IS NULL OR i.product_id = $2)",
    )
    .bind(&ids)
    .bind(p.product_id)
    .fetch_all(&s.db)
    .await?;

    let records: Vec<OrderRecord> = orders
        .into_iter()
        .map(|o| OrderRecord {
            items: items
                .iter()
                .filter(|i| i.order_id == o.id)
                .map(|i| ItemRecord {
                    product_id: i.product_id,
                    product_title: i.product_title.clone(),
                    quantity: i.quantity,
                    price: i.price,
                    total: i.total,
                })
                .collect(),
            id: o.id,
            order_number: o.order_number,
            customer_id: o.customer_id,
            customer_name: o.customer_name,
            status: o.status,
            total_amount: o.total_amount,
            ordered_at: o.ordered_at,
        })
        .collect();

    Ok(Json(aggregate(&records, start, end)))
}
