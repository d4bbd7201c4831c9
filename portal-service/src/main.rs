use portal_service::{
    build_router,
    config::get_configuration,
    services::{
        metrics::init_metrics, MemoryStore, PgStore, SessionTokens, Store, TokenSessionProvider,
    },
    AppState,
};
use service_core::error::AppError;
use service_core::middleware::rate_limit::{create_ip_rate_limiter, IpRateLimit};
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    let settings = get_configuration()?;

    init_tracing(
        &settings.telemetry.service_name,
        &settings.telemetry.log_level,
        settings.telemetry.otlp_endpoint.as_deref(),
    )?;
    init_metrics()?;

    tracing::info!(
        service = %settings.telemetry.service_name,
        version = env!("CARGO_PKG_VERSION"),
        "Starting portal service"
    );

    let store: Arc<dyn Store> = match &settings.database.url {
        Some(url) => {
            let store = PgStore::connect(
                url,
                settings.database.max_connections,
                settings.database.min_connections,
            )
            .await?;
            store.run_migrations().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("No database url configured; using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let tokens = SessionTokens::new(&settings.session.secret, settings.session.ttl_hours);
    let sessions = Arc::new(TokenSessionProvider::new(tokens.clone(), store.clone()));

    let signin_rate_limit = IpRateLimit {
        limiter: create_ip_rate_limiter(
            settings.rate_limit.signin_attempts,
            settings.rate_limit.signin_window_seconds,
        ),
        trust_forwarded_for: settings.server.trust_forwarded_for,
    };

    let state = AppState {
        store,
        sessions,
        tokens,
        signin_rate_limit,
        secure_cookies: settings.server.secure_cookies,
        allowed_origins: settings.server.allowed_origins.clone(),
    };

    let app = build_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
