//! Demo-data seeder. Development convenience only; generates a small balanced
//! catalog, customers, and a month of orders so listings and reports have
//! something to show. Reseeding upserts the catalog and customers in place
//! and appends a fresh batch of demo orders.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use uuid::Uuid;

use crate::domain::variants::{self, GeneratedVariants, OptionAxis};
use crate::error::ApiResult;
use crate::models::{customer_status, order_status, product_status};
use crate::{slugify, AppState};

const CUSTOMERS: &[(&str, &str)] = &[
    ("Ayu Lestari", "ayu@example.com"),
    ("Budi Santoso", "budi@example.com"),
    ("Citra Dewi", "citra@example.com"),
    ("Dian Pratama", "dian@example.com"),
    ("Eka Putri", "eka@example.com"),
    ("Fajar Hidayat", "fajar@example.com"),
];

const PRODUCT_NAMES: &[&str] = &[
    "Classic Tee",
    "Linen Shirt",
    "Denim Jacket",
    "Chino Pants",
    "Wrap Dress",
    "Pleated Skirt",
    "Canvas Tote",
    "Wool Scarf",
];

pub async fn run(
    State(s): State<AppState>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let mut rng = StdRng::from_entropy();

    // Balanced 3-level category tree, branching factor 2.
    let names = [
        ("Apparel", None),
        ("Men", Some(0)),
        ("Women", Some(0)),
        ("Shirts", Some(1)),
        ("Pants", Some(1)),
        ("Dresses", Some(2)),
        ("Skirts", Some(2)),
    ];
    let mut category_ids: Vec<Uuid> = Vec::with_capacity(names.len());
    for (name, parent) in names {
        // Upsert so reseeding reuses the existing tree instead of duplicating it.
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO categories (id, name, slug, parent_id) VALUES ($1, $2, $3, $4)
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name RETURNING id",
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(slugify(name))
        .bind(parent.map(|i: usize| category_ids[i]))
        .fetch_one(&s.db)
        .await?;
        category_ids.push(id);
    }

    let mut customer_ids: Vec<Uuid> = Vec::with_capacity(CUSTOMERS.len());
    for (name, email) in CUSTOMERS {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO customers (id, slug, name, email, status) VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (slug) DO UPDATE SET email = EXCLUDED.email RETURNING id",
        )
        .bind(Uuid::now_v7())
        .bind(slugify(name))
        .bind(name)
        .bind(email)
        .bind(customer_status::ACTIVE)
        .fetch_one(&s.db)
        .await?;
        customer_ids.push(id);
    }

    let axes = [
        OptionAxis {
            name: "Size".into(),
            values: vec!["S".into(), "M".into(), "L".into()],
        },
        OptionAxis {
            name: "Color".into(),
            values: vec!["Black".into(), "White".into()],
        },
    ];

    // (variant_id, variant_price) per product, for order lines below.
    let mut products: Vec<(Uuid, i64, Vec<(Uuid, i64)>)> = Vec::new();
    for name in PRODUCT_NAMES {
        let slug = slugify(name);
        let price: i64 = rng.gen_range(50..400) * 1000;
        // Leaves only, so every product is reachable through the tree walk.
        let category_id = category_ids[rng.gen_range(3..7)];
        let product_id: Uuid = sqlx::query_scalar(
            "INSERT INTO products (id, slug, sku, title, description, category_id, price, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (slug) DO UPDATE SET price = EXCLUDED.price, category_id = EXCLUDED.category_id
             RETURNING id",
        )
        .bind(Uuid::now_v7())
        .bind(&slug)
        .bind(format!("SKU-{:08}", rng.gen_range(0..100_000_000u32)))
        .bind(name)
        .bind(serde_json::json!({ "body": format!("Demo listing for {name}") }))
        .bind(category_id)
        .bind(price)
        .bind(product_status::PUBLISHED)
        .fetch_one(&s.db)
        .await?;

        // Line rows keep their snapshots; the variant reference nulls out.
        sqlx::query("DELETE FROM variants WHERE product_id = $1")
            .bind(product_id)
            .execute(&s.db)
            .await?;

        let mut generated = variants::generate(&axes);
        for group in &mut generated.variants {
            for sub in &mut group.sub_variants {
                sub.price = price + rng.gen_range(0..20) * 1000;
                sub.stock = rng.gen_range(0..50);
            }
        }
        let mut variant_rows = Vec::new();
        for (i, row) in variants::flatten(&GeneratedVariants {
            variants: generated.variants,
        })
        .iter()
        .enumerate()
        {
            let variant_id = Uuid::now_v7();
            sqlx::query(
                "INSERT INTO variants (id, slug, product_id, size, color, material, price, stock, barcode)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(variant_id)
            .bind(format!("{}-{}", slug, i + 1))
            .bind(product_id)
            .bind(Some(row.size.as_str()).filter(|v| !v.is_empty()))
            .bind(Some(row.color.as_str()).filter(|v| !v.is_empty()))
            .bind(Some(row.material.as_str()).filter(|v| !v.is_empty()))
            .bind(row.price)
            .bind(row.stock)
            .bind(format!("BAR-{:010}", rng.gen_range(0..10_000_000_000u64)))
            .execute(&s.db)
            .await?;
            variant_rows.push((variant_id, row.price));
        }
        products.push((product_id, price, variant_rows));
    }

    let mut order_count = 0u32;
    for _ in 0..20 {
        let customer_id = customer_ids[rng.gen_range(0..customer_ids.len())];
        let order_id = Uuid::now_v7();
        let ordered_at = Utc::now()
            - Duration::days(rng.gen_range(0..30))
            - Duration::minutes(rng.gen_range(0..1440));
        let status = [
            order_status::PENDING,
            order_status::PROCESSING,
            order_status::COMPLETED,
        ][rng.gen_range(0..3)];
        sqlx::query(
            "INSERT INTO orders (id, order_number, customer_id, status, subtotal, total_amount, ordered_at)
             VALUES ($1, $2, $3, $4, 0, 0, $5)",
        )
        .bind(order_id)
        .bind(format!("ORD-{:08}", rng.gen_range(0..100_000_000u32)))
        .bind(customer_id)
        .bind(status)
        .bind(ordered_at)
        .execute(&s.db)
        .await?;

        for _ in 0..rng.gen_range(1..=3) {
            let (product_id, product_price, variant_rows) =
                &products[rng.gen_range(0..products.len())];
            let (variant_id, price) = match variant_rows.is_empty() {
                true => (None, *product_price),
                false => {
                    let (id, price) = variant_rows[rng.gen_range(0..variant_rows.len())];
                    (Some(id), price)
                }
            };
            let quantity = rng.gen_range(1..4);
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, variant_id, quantity, price, total)
                 VALUES ($1, $2, $3, $4, $5, $6, $6 * $5)",
            )
            .bind(Uuid::now_v7())
            .bind(order_id)
            .bind(product_id)
            .bind(variant_id)
            .bind(quantity)
            .bind(price)
            .execute(&s.db)
            .await?;
        }

        // Totals finalization: the one mutation orders see after creation.
        sqlx::query(
            "UPDATE orders SET subtotal = t.sum, total_amount = t.sum
             FROM (SELECT COALESCE(SUM(total), 0) AS sum FROM order_items WHERE order_id = $1) t
             WHERE id = $1",
        )
        .bind(order_id)
        .execute(&s.db)
        .await?;
        order_count += 1;
    }

    tracing::info!(orders = order_count, "seeded demo data");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "categories": category_ids.len(),
            "customers": customer_ids.len(),
            "products": products.len(),
            "orders": order_count,
        })),
    ))
}
