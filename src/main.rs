//! Gatehouse Server - Visitor Management System
//!
//! Kiosk terminal flow plus an admin REST API, backed by PostgreSQL and
//! Redis.

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{session::SessionService, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("gatehouse_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gatehouse Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Initialize the Redis-backed session store
    let session = SessionService::new(&config.redis.url, config.terminal.session_ttl_seconds)
        .await
        .expect("Failed to connect to Redis");

    tracing::info!("Connected to Redis");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(
        repository,
        config.terminal.clone(),
        config.email.clone(),
        session,
    )
    .await
    .expect("Failed to create services");

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration for the admin API
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Admin API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Visits
        .route("/visits", get(api::visits::list_visits))
        .route("/visits", post(api::visits::create_visit))
        .route("/visits/:id", get(api::visits::get_visit))
        .route("/visits/:id/cancel", post(api::visits::cancel_visit))
        .route("/visits/:id/confirm", post(api::visits::confirm_invitation))
        .route("/visits/:id/visitors", get(api::visits::list_present_visitors))
        .route("/visits/:id/visitors", post(api::visits::add_visitor))
        .route("/visits/:id/checkout", post(api::visits::admin_checkout))
        // PIN lifecycle
        .route("/visits/:id/pin", post(api::visits::generate_pin))
        .route("/visits/:id/pin/extend", post(api::visits::extend_pin))
        .route("/visits/:id/pin/status", get(api::visits::pin_status))
        .with_state(state.clone());

    // Kiosk terminal routes; path segments map 1:1 to step names
    let terminal = Router::new()
        .route("/", get(api::terminal::terminal_home))
        .route("/", post(api::terminal::terminal_post))
        .route("/:step", get(api::terminal::terminal_step))
        .route("/:step/", get(api::terminal::terminal_step))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .nest("/terminal", terminal)
        .merge(openapi)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
