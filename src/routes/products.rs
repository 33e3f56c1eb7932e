//! Product catalog: create, edit (variant + media reset), soft-delete,
//! filterable listing, detail with editor-shaped variants.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{categories, variants};
use crate::domain::variants::{GeneratedVariants, GroupedVariant};
use crate::error::{ApiError, ApiResult};
use crate::models::{product_status, Category, Media, Product, Variant};
use crate::{unique_slug, AppState, PageParams, Paginated};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub title: Option<String>,
    #[serde(default)]
    pub description: serde_json::Value,
    pub sku: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Option<i64>,
    pub hold_price: Option<i64>,
    pub hold_discount: Option<i64>,
    pub premium_price: Option<i64>,
    pub premium_discount: Option<i64>,
    pub status: Option<String>,
    /// Grouped editor shape; flattened to one row per combination on save.
    #[serde(default)]
    pub variants: Vec<GroupedVariant>,
    /// Previously uploaded media to attach.
    #[serde(default)]
    pub media_ids: Vec<Uuid>,
}

impl ProductPayload {
    fn title(&self) -> ApiResult<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::validation("title is required"))
    }
}

fn opt(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

async fn insert_variants(
    tx: &mut Transaction<'_, Postgres>,
    product: &Product,
    grouped: Vec<GroupedVariant>,
) -> ApiResult<Vec<Variant>> {
    let flat = variants::flatten(&GeneratedVariants { variants: grouped });
    let mut rows = Vec::with_capacity(flat.len());
    for (i, row) in flat.iter().enumerate() {
        let inserted = sqlx::query_as::<_, Variant>(
            "INSERT INTO variants
                 (id, slug, product_id, size, color, material, price, stock, barcode, image_variant)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(format!("{}-{}", product.slug, i + 1))
        .bind(product.id)
        .bind(opt(&row.size))
        .bind(opt(&row.color))
        .bind(opt(&row.material))
        .bind(row.price)
        .bind(row.stock)
        .bind(opt(&row.barcode))
        .bind(opt(&row.image_variant))
        .fetch_one(&mut **tx)
        .await?;
        rows.push(inserted);
    }
    Ok(rows)
}

async fn attach_media(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    media_ids: &[Uuid],
) -> ApiResult<()> {
    sqlx::query("UPDATE media SET product_id = NULL WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut **tx)
        .await?;
    if !media_ids.is_empty() {
        sqlx::query("UPDATE media SET product_id = $1 WHERE id = ANY($2)")
            .bind(product_id)
            .bind(media_ids)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub media: Vec<Media>,
    pub variants: Vec<GroupedVariant>,
}

pub async fn create(
    State(s): State<AppState>,
    Json(req): Json<ProductPayload>,
) -> ApiResult<(StatusCode, Json<ProductDetail>)> {
    let title = req.title()?.to_string();
    let slug = unique_slug(&title);
    let sku = req
        .sku
        .clone()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| format!("SKU-{:08}", rand::random::<u32>() % 100_000_000));

    let mut tx = s.db.begin().await?;
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products
             (id, slug, sku, title, description, category_id, price,
              hold_price, hold_discount, premium_price, premium_discount, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&slug)
    .bind(&sku)
    .bind(&title)
    .bind(&req.description)
    .bind(req.category_id)
    .bind(req.price.unwrap_or(0))
    .bind(req.hold_price)
    .bind(req.hold_discount)
    .bind(req.premium_price)
    .bind(req.premium_discount)
    .bind(req.status.as_deref().unwrap_or(product_status::DRAFT))
    .fetch_one(&mut *tx)
    .await?;

    let rows = insert_variants(&mut tx, &product, req.variants).await?;
    attach_media(&mut tx, product.id, &req.media_ids).await?;
    tx.commit().await?;

    let media = media_for(&s.db, product.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductDetail {
            product,
            media,
            variants: variants::regroup(&rows).variants,
        }),
    ))
}

/// Full replace: product fields updated, variants and media attachments
/// deleted and recreated from the submitted set. One transaction, so a step
/// failure never leaves the product stripped of variants or media.
pub async fn edit(
    State(s): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<ProductPayload>,
) -> ApiResult<Json<ProductDetail>> {
    let title = req.title()?.to_string();
    let existing = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("product"))?;

    let mut tx = s.db.begin().await?;
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET
             title = $2, description = $3, category_id = $4, price = $5,
             hold_price = $6, hold_discount = $7, premium_price = $8, premium_discount = $9,
             status = $10, sku = $11, updated_at = NOW()
         WHERE id = $1 RETURNING *",
    )
    .bind(existing.id)
    .bind(&title)
    .bind(&req.description)
    .bind(req.category_id)
    .bind(req.price.unwrap_or(existing.price))
    .bind(req.hold_price.or(existing.hold_price))
    .bind(req.hold_discount.or(existing.hold_discount))
    .bind(req.premium_price.or(existing.premium_price))
    .bind(req.premium_discount.or(existing.premium_discount))
    .bind(req.status.as_deref().unwrap_or(&existing.status))
    .bind(req.sku.as_deref().filter(|v| !v.is_empty()).unwrap_or(&existing.sku))
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM variants WHERE product_id = $1")
        .bind(product.id)
        .execute(&mut *tx)
        .await?;
    let rows = insert_variants(&mut tx, &product, req.variants).await?;
    attach_media(&mut tx, product.id, &req.media_ids).await?;
    tx.commit().await?;

    let media = media_for(&s.db, product.id).await?;
    Ok(Json(ProductDetail {
        product,
        media,
        variants: variants::regroup(&rows).variants,
    }))
}

pub async fn delete(
    State(s): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    sqlx::query("UPDATE products SET status = $2, updated_at = NOW() WHERE slug = $1")
        .bind(&slug)
        .bind(product_status::DELETED)
        .execute(&s.db)
        .await?;
    Ok(Json(serde_json::json!({ "status": product_status::DELETED })))
}

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithRelations {
    #[serde(flatten)]
    pub product: Product,
    pub media: Vec<Media>,
    pub variants: Vec<Variant>,
}

/// Paginated catalog listing. DELETED products never appear, whatever the
/// other filters say; a category filter scopes to the requested category plus
/// its full descendant closure.
pub async fn list(
    State(s): State<AppState>,
    Query(p): Query<ProductListParams>,
) -> ApiResult<Json<Paginated<ProductWithRelations>>> {
    let pager = PageParams {
        page: p.page,
        limit: p.limit,
    };
    let (page, limit) = pager.resolve();

    // None means "no category filter"; an unknown slug matches nothing.
    let category_scope: Option<Vec<Uuid>> = match p.category.as_deref().filter(|v| !v.is_empty()) {
        None => None,
        Some(slug) => {
            let all = sqlx::query_as::<_, Category>("SELECT * FROM categories")
                .fetch_all(&s.db)
                .await?;
            Some(match all.iter().find(|c| c.slug == slug) {
                Some(root) => categories::descendant_ids(&all, root.id),
                None => Vec::new(),
            })
        }
    };
    let search = p.search.as_deref().filter(|v| !v.is_empty());
    let sku = p.sku.as_deref().filter(|v| !v.is_empty());

    const FILTER: &str = "status <> 'DELETED'
         AND ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
         AND ($2::text IS NULL OR sku = $2
              OR id IN (SELECT product_id FROM variants WHERE barcode = $2))
         AND ($3::uuid[] IS NULL OR category_id = ANY($3))";

    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT * FROM products WHERE {FILTER} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
    ))
    .bind(search)
    .bind(sku)
    .bind(&category_scope)
    .bind(limit as i64)
    .bind(pager.offset())
    .fetch_all(&s.db)
    .await?;

    let total: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products WHERE {FILTER}"))
            .bind(search)
            .bind(sku)
            .bind(&category_scope)
            .fetch_one(&s.db)
            .await?;

    let data = with_relations(&s.db, rows).await?;
    Ok(Json(Paginated { page, limit, total, data }))
}

pub async fn with_relations(
    db: &PgPool,
    products: Vec<Product>,
) -> ApiResult<Vec<ProductWithRelations>> {
    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let all_variants = sqlx::query_as::<_, Variant>(
        "SELECT * FROM variants WHERE product_id = ANY($1) ORDER BY id",
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;
    let all_media = sqlx::query_as::<_, Media>(
        "SELECT * FROM media WHERE product_id = ANY($1) AND deleted = FALSE ORDER BY created_at",
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    Ok(products
        .into_iter()
        .map(|product| {
            let variants = all_variants
                .iter()
                .filter(|v| v.product_id == product.id)
                .cloned()
                .collect();
            let media = all_media
                .iter()
                .filter(|m| m.product_id == Some(product.id))
                .cloned()
                .collect();
            ProductWithRelations { product, media, variants }
        })
        .collect())
}

async fn media_for(db: &PgPool, product_id: Uuid) -> ApiResult<Vec<Media>> {
    let media = sqlx::query_as::<_, Media>(
        "SELECT * FROM media WHERE product_id = $1 AND deleted = FALSE ORDER BY created_at",
    )
    .bind(product_id)
    .fetch_all(db)
    .await?;
    Ok(media)
}

pub async fn detail(
    State(s): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ProductDetail>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&s.db)
        .await?
        .ok_or(ApiError::NotFound("product"))?;
    let rows = sqlx::query_as::<_, Variant>(
        "SELECT * FROM variants WHERE product_id = $1 ORDER BY id",
    )
    .bind(product.id)
    .fetch_all(&s.db)
    .await?;
    let media = media_for(&s.db, product.id).await?;
    Ok(Json(ProductDetail {
        product,
        media,
        variants: variants::regroup(&rows).variants,
    }))
}
