mod auth;
mod coaching;
mod config;
mod db;
mod errors;
mod insights;
mod models;
mod onboarding;
mod resume;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::db::create_pool;
use crate::resume::export::{ExportOptions, HttpPdfConverter};
use crate::resume::session::{sweep_idle_sessions, SessionStore};
use crate::resume::store::PgResumeStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Career Pilot API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize PDF converter
    let pdf = Arc::new(HttpPdfConverter::new(&config.pdf_converter_url));
    info!("PDF converter: {}", config.pdf_converter_url);

    let export_options = ExportOptions::default();
    info!(
        "Export settings: {:?} (landscape: {}), margins {:?}mm",
        export_options.paper, export_options.landscape, export_options.margins_mm
    );

    let sessions = SessionStore::new();
    tokio::spawn(sweep_idle_sessions(
        sessions.clone(),
        config.session_idle_timeout,
    ));
    info!(
        "Builder sessions expire after {}s idle",
        config.session_idle_timeout.as_secs()
    );

    // Build app state
    let state = AppState {
        resumes: Arc::new(PgResumeStore::new(db.clone())),
        db,
        tokens: TokenVerifier::new(&config.auth_jwt_secret),
        pdf,
        sessions,
        export_options,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web client's domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
