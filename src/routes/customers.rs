//! Customer CRUD; deletion is a status transition, never a row removal.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::{customer_status, Customer};
use crate::{unique_slug, AppState, PageParams, Paginated};

#[derive(Debug, Deserialize)]
pub struct CustomerListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

pub async fn list(
    State(s): State<AppState>,
    Query(p): Query<CustomerListParams>,
) -> ApiResult<Json<Paginated<Customer>>> {
    let pager = PageParams {
        page: p.page,
        limit: p.limit,
    };
    let (page, limit) = pager.resolve();
    let search = p.search.as_deref().filter(|v| !v.is_empty());

    // Rows and count are independent reads, fetched together.
    let rows = sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers
         WHERE status <> 'DELETED'
           AND ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(search)
    .bind(limit as i64)
    .bind(pager.offset())
    .fetch_all(&s.db);
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM customers
         WHERE status <> 'DELETED'
           AND ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')",
    )
    .bind(search)
    .fetch_one(&s.db);
    let (rows, total) = tokio::try_join!(rows, count)?;

    Ok(Json(Paginated {
        page,
        limit,
        total,
        data: rows,
    }))
}

pub async fn detail(
    State(s): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Customer>> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&s.db)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("customer"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "valid email is required"))]
    pub email: String,
}

pub async fn create(
    State(s): State<AppState>,
    Json(req): Json<CreateCustomerRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    req.validate()?;
    let customer = sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (id, slug, name, email, status) VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(unique_slug(&req.name))
    .bind(req.name.trim())
    .bind(req.email.trim())
    .bind(customer_status::ACTIVE)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
}

pub async fn edit(
    State(s): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<UpdateCustomerRequest>,
) -> ApiResult<Json<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(
        "UPDATE customers SET
             name = COALESCE($2, name),
             email = COALESCE($3, email),
             status = COALESCE($4, status),
             updated_at = NOW()
         WHERE slug = $1 RETURNING *",
    )
    .bind(&slug)
    .bind(req.name.as_deref().map(str::trim).filter(|v| !v.is_empty()))
    .bind(req.email.as_deref().map(str::trim).filter(|v| !v.is_empty()))
    .bind(req.status.as_deref().filter(|v| !v.is_empty()))
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("customer"))?;
    Ok(Json(customer))
}

pub async fn delete(
    State(s): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(
        "UPDATE customers SET status = $2, updated_at = NOW() WHERE slug = $1 RETURNING *",
    )
    .bind(&slug)
    .bind(customer_status::DELETED)
    .fetch_optional(&s.db)
    .await?
    .ok_or(ApiError::NotFound("customer"))?;
    Ok(Json(customer))
}
