//! Store-backed workflow tests: cart add/increment, checkout, catalog listing
//! and the variant reset on product edit. Each test gets its own database via
//! `#[sqlx::test]`, with the schema applied from ./migrations.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use sqlx::PgPool;
use uuid::Uuid;

use toko_backoffice::domain::variants::GroupedVariant;
use toko_backoffice::error::ApiError;
use toko_backoffice::routes::{carts, products};
use toko_backoffice::storage::DiskStore;
use toko_backoffice::AppState;

fn state(db: PgPool) -> AppState {
    AppState {
        db,
        nats: None,
        media: Arc::new(DiskStore::new(
            std::env::temp_dir(),
            "http://localhost:8083/media",
        )),
    }
}

async fn seed_customer(db: &PgPool, slug: &str) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO customers (id, slug, name, email, status)
         VALUES ($1, $2, $3, $4, 'ACTIVE') RETURNING id",
    )
    .bind(Uuid::now_v7())
    .bind(slug)
    .bind(format!("Customer {slug}"))
    .bind(format!("{slug}@example.com"))
    .fetch_one(db)
    .await
    .expect("seed customer")
}

async fn seed_product(db: &PgPool, title: &str, price: i64, status: &str) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO products (id, slug, sku, title, price, status)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(Uuid::now_v7())
    .bind(title.to_lowercase().replace(' ', "-"))
    .bind(format!("SKU-{title}").to_uppercase().replace(' ', "-"))
    .bind(title)
    .bind(price)
    .bind(status)
    .fetch_one(db)
    .await
    .expect("seed product")
}

fn add_request(slug: &str, product_id: Uuid, variant_id: Option<Uuid>, qty: i32) -> carts::AddToCartRequest {
    carts::AddToCartRequest {
        customer_slug: Some(slug.into()),
        product_id: Some(product_id),
        variant_id,
        quantity: Some(qty),
    }
}

#[sqlx::test]
async fn adding_the_same_pair_twice_yields_one_incremented_line(pool: PgPool) {
    let s = state(pool.clone());
    seed_customer(&pool, "ayu").await;
    let product = seed_product(&pool, "Classic Tee", 10, "PUBLISHED").await;

    carts::add(State(s.clone()), Json(add_request("ayu", product, None, 2)))
        .await
        .expect("first add");
    carts::add(State(s.clone()), Json(add_request("ayu", product, None, 3)))
        .await
        .expect("second add");

    let rows: Vec<(i32, i64, i64)> =
        sqlx::query_as("SELECT quantity, price, total FROM cart_items")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(rows.len(), 1, "same (product, null variant) pair must merge");
    assert_eq!(rows[0], (5, 10, 50)); // total = snapshot price x new quantity
}

#[sqlx::test]
async fn checkout_creates_order_and_clears_cart(pool: PgPool) {
    let s = state(pool.clone());
    seed_customer(&pool, "budi").await;
    let tee = seed_product(&pool, "Classic Tee", 10, "PUBLISHED").await;
    let scarf = seed_product(&pool, "Wool Scarf", 5, "PUBLISHED").await;

    carts::add(State(s.clone()), Json(add_request("budi", tee, None, 2)))
        .await
        .expect("add tee");
    carts::add(State(s.clone()), Json(add_request("budi", scarf, None, 1)))
        .await
        .expect("add scarf");

    let checkout = carts::CustomerSlugRequest {
        customer_slug: Some("budi".into()),
    };
    let (_, Json(resp)) = carts::checkout(State(s.clone()), Json(checkout))
        .await
        .expect("checkout");

    assert_eq!(resp.order.subtotal, 25);
    assert_eq!(resp.order.total_amount, 25);
    assert_eq!(resp.items.len(), 2);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0, "checkout must clear the cart items");
    let carts_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(carts_left, 1, "the cart row survives for reuse");

    // A second checkout sees the emptied cart and rejects it.
    let again = carts::CustomerSlugRequest {
        customer_slug: Some("budi".into()),
    };
    assert!(matches!(
        carts::checkout(State(s), Json(again)).await,
        Err(ApiError::Validation(_))
    ));
}

#[sqlx::test]
async fn deleted_products_never_appear_in_listings(pool: PgPool) {
    let s = state(pool.clone());
    seed_product(&pool, "Visible Tee", 10, "PUBLISHED").await;
    seed_product(&pool, "Ghost Tee", 10, "DELETED").await;

    let params = |search: Option<&str>| products::ProductListParams {
        page: None,
        limit: None,
        search: search.map(Into::into),
        sku: None,
        category: None,
    };

    let Json(page) = products::list(State(s.clone()), Query(params(None)))
        .await
        .expect("list");
    assert_eq!(page.total, 1);
    assert!(page.data.iter().all(|p| p.product.title != "Ghost Tee"));

    // The status filter holds under search too.
    let Json(page) = products::list(State(s), Query(params(Some("Tee"))))
        .await
        .expect("search");
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].product.title, "Visible Tee");
}

fn payload(title: &str, sizes: &[&str]) -> products::ProductPayload {
    products::ProductPayload {
        title: Some(title.into()),
        description: serde_json::json!({}),
        sku: None,
        category_id: None,
        price: Some(100),
        hold_price: None,
        hold_discount: None,
        premium_price: None,
        premium_discount: None,
        status: None,
        variants: sizes
            .iter()
            .map(|size| GroupedVariant {
                size: (*size).into(),
                price: 1000,
                stock: 5,
                ..GroupedVariant::default()
            })
            .collect(),
        media_ids: Vec::new(),
    }
}

#[sqlx::test]
async fn edit_resets_variants_even_after_an_order_references_them(pool: PgPool) {
    let s = state(pool.clone());
    seed_customer(&pool, "citra").await;

    let (_, Json(created)) = products::create(State(s.clone()), Json(payload("Classic Tee", &["S", "M"])))
        .await
        .expect("create product");
    let slug = created.product.slug.clone();
    let variant_id: Uuid = sqlx::query_scalar("SELECT id FROM variants WHERE product_id = $1 LIMIT 1")
        .bind(created.product.id)
        .fetch_one(&pool)
        .await
        .unwrap();

    // Checkout pins an order item to one of the variants.
    carts::add(
        State(s.clone()),
        Json(add_request("citra", created.product.id, Some(variant_id), 1)),
    )
    .await
    .expect("add variant line");
    carts::checkout(
        State(s.clone()),
        Json(carts::CustomerSlugRequest {
            customer_slug: Some("citra".into()),
        }),
    )
    .await
    .expect("checkout");

    // The variant reset must still go through; the order item keeps its
    // price/quantity snapshot and drops the variant reference.
    let Json(edited) = products::edit(
        State(s),
        Path(slug),
        Json(payload("Classic Tee", &["L"])),
    )
    .await
    .expect("edit after checkout");
    assert_eq!(edited.variants.len(), 1);
    assert_eq!(edited.variants[0].size, "L");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM variants WHERE product_id = $1")
        .bind(edited.product.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
    let detached: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM order_items WHERE variant_id IS NULL AND product_id = $1",
    )
    .bind(edited.product.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(detached, 1);
}
