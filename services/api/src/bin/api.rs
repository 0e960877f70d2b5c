//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, RetryPolicy, RetryingEntitySource, SqliteOverlayDirectory},
    config::Config,
    error::ApiError,
    web::{
        live_handler, require_device,
        rest::{
            article_handler, articles_handler, catalog_handler, chapter_handler, clear_search_history_handler,
            complete_chapter_handler, continue_learning_handler,
            course_detail_handler, delete_all_notifications_handler, delete_notification_handler, home_handler,
            logout_handler, mark_all_read_handler, mark_read_handler, notifications_handler, quiz_handler,
            saved_handler, score_quiz_handler, search_handler, search_history_handler, toggle_saved_handler,
            unsave_handler,
        },
        state::AppState,
        ApiDoc,
    },
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::{postgres::PgPoolOptions, sqlite::SqlitePoolOptions};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Content Database & Run Migrations ---
    info!("Connecting to content database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = DbAdapter::new(db_pool);
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Open the Overlay Store ---
    info!("Opening overlay store at {}", config.overlay_database_url);
    let overlay_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.overlay_database_url)
        .await?;
    let overlays = SqliteOverlayDirectory::new(overlay_pool);
    overlays.init_schema().await?;

    // --- 4. Build the Shared AppState ---
    let retry_policy = RetryPolicy {
        max_retries: config.fetch_max_retries,
        base_delay: config.fetch_retry_base_delay,
    };
    let app_state = Arc::new(AppState {
        entities: Arc::new(RetryingEntitySource::new(db_adapter, retry_policy)),
        overlays: Arc::new(overlays),
        config: config.clone(),
    });

    // --- 5. Create the Web Router ---
    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e)))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT, HeaderName::from_static("x-device-id")]);

    // Every route works on the calling device's overlays.
    let device_routes = Router::new()
        .route("/home", get(home_handler))
        .route("/courses", get(catalog_handler))
        .route("/courses/continue", get(continue_learning_handler))
        .route("/courses/{id}", get(course_detail_handler))
        .route("/courses/{id}/quiz", get(quiz_handler))
        .route("/courses/{id}/quiz/score", post(score_quiz_handler))
        .route("/chapters/{id}", get(chapter_handler))
        .route("/chapters/{id}/complete", post(complete_chapter_handler))
        .route("/articles", get(articles_handler))
        .route("/articles/{id}", get(article_handler))
        .route("/saved", get(saved_handler))
        .route("/saved/{course_id}", delete(unsave_handler))
        .route("/saved/{course_id}/toggle", post(toggle_saved_handler))
        .route(
            "/notifications",
            get(notifications_handler).delete(delete_all_notifications_handler),
        )
        .route("/notifications/read", post(mark_all_read_handler))
        .route("/notifications/{id}", delete(delete_notification_handler))
        .route("/notifications/{id}/read", post(mark_read_handler))
        .route("/search", get(search_handler))
        .route(
            "/search/history",
            get(search_history_handler).delete(clear_search_history_handler),
        )
        .route("/logout", post(logout_handler))
        .route("/live", get(live_handler))
        .layer(axum_middleware::from_fn(require_device));

    let api_router = Router::new()
        .merge(device_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
