use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use partyhall::config::AppConfig;
use partyhall::db;
use partyhall::handlers;
use partyhall::services::catalog::builtin::BuiltinCatalog;
use partyhall::services::catalog::remote::RemoteCatalog;
use partyhall::services::catalog::CatalogSource;
use partyhall::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let catalog: Box<dyn CatalogSource> = match &config.catalog_url {
        Some(url) => {
            tracing::info!("using remote catalog (url: {url})");
            Box::new(RemoteCatalog::new(url.clone())?)
        }
        None => {
            tracing::info!("using built-in catalog");
            Box::new(BuiltinCatalog)
        }
    };

    if config.enforce_daily_capacity {
        tracing::info!(
            capacity = config.daily_guest_capacity,
            "daily guest capacity is enforced at reservation time"
        );
    }

    let (events_tx, _) = broadcast::channel(256);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        catalog,
        events_tx,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/catalog/:plan", get(handlers::catalog::get_catalog))
        .route("/api/quote", post(handlers::bookings::quote))
        .route(
            "/api/bookings",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route(
            "/api/bookings/date/:date",
            get(handlers::bookings::bookings_for_date),
        )
        .route(
            "/api/bookings/:id",
            get(handlers::bookings::get_booking)
                .put(handlers::bookings::update_booking)
                .delete(handlers::bookings::delete_booking),
        )
        .route(
            "/api/bookings/:id/events",
            get(handlers::bookings::booking_events),
        )
        .route(
            "/api/slots/available/:date",
            get(handlers::slots::available_slots),
        )
        .route("/api/slots/:date", get(handlers::slots::slot_grid))
        .route("/api/verify", post(handlers::admin::verify_booking))
        .route("/api/admin/events", get(handlers::admin::events_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
