use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Server,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use axum_todo_tree::{config::Config, db, route::create_router, AppState};

// Entry point of the application
#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    // Connect to the database, creating it on first run
    let pool = match db::connect(&config.database_url).await {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to the database");
            std::process::exit(1);
        }
    };

    if let Err(err) = db::create_schema(&pool).await {
        tracing::error!(error = %err, "failed to create tables");
        std::process::exit(1);
    }

    let app_state = Arc::new(AppState::new(pool, &config));

    // Re-derive levels for rows written without them
    if let Err(err) = db::repair_tree(&app_state.db).await {
        tracing::error!(error = %err, "tree repair failed");
        std::process::exit(1);
    }

    let origin = match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => origin,
        Err(err) => {
            tracing::error!(error = %err, origin = %config.cors_origin, "invalid CORS origin");
            std::process::exit(1);
        }
    };

    // Configure CORS settings for the application
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    let app = create_router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!(
        addr = %config.bind_addr,
        move_policy = ?config.move_policy,
        "server started"
    );

    if let Err(err) = Server::bind(&config.bind_addr)
        .serve(app.into_make_service())
        .await
    {
        tracing::error!(error = %err, "server error");
        std::process::exit(1);
    }
}
