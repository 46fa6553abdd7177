// src/main.rs
use axum::{extract::Extension, middleware, routing::get, Json, Router};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod auth;
mod common;
mod doctor;
mod exercises;
mod logging_middleware;
mod notifications;
mod patient;
mod services;
mod sessions;

#[cfg(test)]
mod test_support;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use auth::{IdentityProvider, LocalIdentityProvider};
use common::{AppConfig, AppState, SharedState};
use notifications::{ConnectionRegistry, NotificationDispatcher};
use services::{Database, LogMailer, Mailer, SesMailer};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let config = AppConfig::from_env()?;
    if config.jwt_secret == "replace_with_strong_secret" {
        warn!("JWT_SECRET is not set; using the insecure default");
    }

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = config.database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    // Run database migrations
    common::migrations::run_migrations(&pool, config.reset_db).await?;

    let db = Database::new(pool.clone());
    match db.orphaned_patient_accounts().await {
        Ok(orphans) if !orphans.is_empty() => {
            for orphan in &orphans {
                warn!(
                    auth_user_id = %orphan.id,
                    email = %common::safe_email_log(&orphan.email),
                    created_at = %orphan.created_at,
                    "Patient identity account has no patient profile"
                );
            }
            warn!(count = orphans.len(), "Orphaned patient accounts need reconciliation");
        }
        Ok(_) => info!("No orphaned patient accounts"),
        Err(e) => warn!(error = %e, "Orphaned account check failed"),
    }

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let identity: Arc<dyn IdentityProvider> = Arc::new(LocalIdentityProvider::new(
        pool.clone(),
        config.jwt_secret.clone(),
        config.token_ttl_hours,
    ));
    info!("Identity provider initialized");

    let mailer: Arc<dyn Mailer> = match &config.ses_from_email {
        Some(from_email) => {
            info!(region = %config.ses_region, "Sending email through SES");
            Arc::new(SesMailer::new(from_email.clone(), config.ses_region.clone()).await)
        }
        None => {
            info!("AWS_SES_FROM_EMAIL not set; emails are logged only");
            Arc::new(LogMailer)
        }
    };

    let registry = ConnectionRegistry::new();
    let dispatcher = NotificationDispatcher::new(db.clone(), registry.clone());
    info!("Notification registry initialized");

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let app_state = AppState {
        db,
        identity,
        mailer,
        registry: registry.clone(),
        dispatcher,
        config: config.clone(),
    };

    let shared = Arc::new(RwLock::new(app_state));
    let app = build_router(shared, &config);

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(registry))
        .await?;

    info!("Server stopped");
    Ok(())
}

// ============================================================================
// ROUTER COMPOSITION
// ============================================================================

pub fn build_router(shared: SharedState, config: &AppConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        // ====================================================================
        // AUTHENTICATION ROUTES
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // CATALOG, DOCTOR AND PATIENT ROUTES
        // ====================================================================
        .merge(exercises::exercises_routes())
        .merge(doctor::doctor_routes())
        .merge(patient::patient_routes())
        .merge(sessions::sessions_routes())
        // ====================================================================
        // LIVE NOTIFICATIONS (WebSocket)
        // ====================================================================
        .merge(notifications::notifications_routes())
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(shared))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Resolves on Ctrl-C or SIGTERM, after closing every notification socket
async fn shutdown_signal(registry: ConnectionRegistry) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    registry.close_all().await;
}
