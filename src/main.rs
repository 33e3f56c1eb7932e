//! Toko back-office - e-commerce catalog, carts, orders, media, reports.

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toko_backoffice::{routes, storage::DiskStore, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&std::env::var("DATABASE_URL")?)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match std::env::var("NATS_URL") {
        Ok(url) => match async_nats::connect(&url).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, events disabled");
                None
            }
        },
        Err(_) => None,
    };

    let media_root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".into());
    let public_base = std::env::var("PUBLIC_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:8083/media".into());
    let state = AppState {
        db,
        nats,
        media: Arc::new(DiskStore::new(media_root, public_base)),
    };

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port = std::env::var("PORT").unwrap_or_else(|_| "8083".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("toko-backoffice listening on 0.0.0.0:{port}");
    axum::serve(listener, app).await?;
    Ok(())
}
