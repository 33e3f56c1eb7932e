//! Category endpoints: full nested tree, creation, and category-scoped
//! product listing over the descendant closure.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::categories::{build_forest, descendant_ids, CategoryNode};
use crate::error::{ApiError, ApiResult};
use crate::models::Category;
use crate::routes::products::{with_relations, ProductWithRelations};
use crate::{slugify, AppState};

async fn all_categories(db: &sqlx::PgPool) -> ApiResult<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>("SELECT * FROM categories")
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn tree(State(s): State<AppState>) -> ApiResult<Json<Vec<CategoryNode>>> {
    let rows = all_categories(&s.db).await?;
    Ok(Json(build_forest(&rows, None)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
    pub products: Vec<ProductWithRelations>,
}

/// Category plus every product in its descendant closure, newest first.
pub async fn detail(
    State(s): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<CategoryDetail>> {
    let rows = all_categories(&s.db).await?;
    let category = rows
        .iter()
        .find(|c| c.slug == slug)
        .cloned()
        .ok_or(ApiError::NotFound("category"))?;

    let scope = descendant_ids(&rows, category.id);
    let products = sqlx::query_as::<_, crate::models::Product>(
        "SELECT * FROM products
         WHERE status <> 'DELETED' AND category_id = ANY($1)
         ORDER BY created_at DESC",
    )
    .bind(&scope)
    .fetch_all(&s.db)
    .await?;
    let products = with_relations(&s.db, products).await?;

    Ok(Json(CategoryDetail {
        children: build_forest(&rows, Some(category.id)),
        category,
        products,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
    pub parent_id: Option<Uuid>,
}

pub async fn create(
    State(s): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::validation("name is required"))?;
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, slug, parent_id) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(name)
    .bind(slugify(name))
    .bind(req.parent_id)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(category)))
}
