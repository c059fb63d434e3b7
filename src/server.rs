use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::auth::TokenValidator;
use crate::config::AppConfig;
use crate::database::{Datalake, DocumentStore};
use crate::handlers;

/// Everything a handler needs, built once at startup and shared by clone.
#[derive(Clone)]
pub struct AppState {
    pub datalake: Datalake,
    pub validator: Arc<dyn TokenValidator>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        validator: Arc<dyn TokenValidator>,
        config: AppConfig,
    ) -> Self {
        Self {
            datalake: Datalake::new(store),
            validator,
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = state.config.api.clone();

    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/get", post(handlers::fetch_post))
        .route("/latest", post(handlers::latest_post))
        .route("/aggregate", post(handlers::aggregate_post))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(api.max_request_size_bytes))
                .layer(cors_layer(&api.cors_origins)),
        );

    let router = if api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Serve until ctrl-c, over TLS when a certificate and key are configured.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let config = state.config.clone();
    let addr = resolve_addr(&config.server.host, config.server.port).await?;
    let app = router(state);

    match config.tls_paths() {
        Some((cert, key)) => {
            let tls = RustlsConfig::from_pem_file(cert, key)
                .await
                .with_context(|| format!("failed to load TLS material from {}", cert.display()))?;

            let handle = Handle::new();
            tokio::spawn(graceful_tls_shutdown(handle.clone()));

            info!("Listening on https://{}", addr);
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("TLS server failed")?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {}", addr))?;

            info!("Listening on http://{}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("server failed")?;
        }
    }

    info!("Server stopped");
    Ok(())
}

pub async fn resolve_addr(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("failed to resolve {}:{}", host, port))?
        .next()
        .with_context(|| format!("{}:{} resolved to no addresses", host, port))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn graceful_tls_shutdown(handle: Handle) {
    shutdown_signal().await;
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
