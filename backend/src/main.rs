use axum::{
    http::Method,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod database;
mod editor;
mod error;
mod handlers;
mod notify;
mod pagination;
mod storage;
mod store;
mod validation;

pub use error::{ApiError, ApiResult, AppError};
pub use pagination::{PaginatedResponse, PaginationMeta, PaginationParams};
pub use validation::Validator;

use notify::{CacheInvalidator, NoopInvalidator, Notifier, TracingNotifier};
use storage::{BlobStore, LocalBlobStore};
use store::{ClientStore, PgClientStore};

pub struct AppState {
    pub db_pool: sqlx::PgPool,
    pub store: Arc<dyn ClientStore>,
    pub storage: Arc<dyn BlobStore>,
    pub notifier: Arc<dyn Notifier>,
    pub invalidator: Arc<dyn CacheInvalidator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    let db_pool = database::create_pool(&config.database_url).await?;

    database::migrate(&db_pool).await?;

    let storage_root = config.storage.root.clone();
    let app_state = Arc::new(AppState {
        db_pool: db_pool.clone(),
        store: Arc::new(PgClientStore::new(db_pool)),
        storage: Arc::new(LocalBlobStore::new(&config.storage)),
        notifier: Arc::new(TracingNotifier),
        invalidator: Arc::new(NoopInvalidator),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(|| async { "FleetDesk API v1.0.0" }))
        .route("/health", get(handlers::health_check))
        .nest(
            "/api/v1/clients",
            handlers::client_routes().merge(handlers::upload_routes()),
        )
        .nest_service("/files", ServeDir::new(storage_root))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    tracing::info!("Server running on {}", config.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
