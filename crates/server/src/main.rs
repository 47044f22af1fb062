//! Volunteer-hub server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
};
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use volunteer_api::{AppState, auth_middleware, router as api_router};
use volunteer_common::{Config, LocalStorage, StorageBackend};
use volunteer_core::{
    AccountService, AdminService, CertificateService, EventService, EventSweeper,
    RegistrationService, ReportService, ReviewService, spawn_scheduler,
};

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// CORS from the configured origin list; an empty list allows any origin.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "volunteer=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting volunteer-hub server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = volunteer_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    volunteer_db::migrate(&db).await?;
    info!("Migrations completed");

    tokio::fs::create_dir_all(&config.storage.upload_dir).await?;
    tokio::fs::create_dir_all(&config.certificates.output_dir).await?;

    let db = Arc::new(db);
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.storage.upload_dir.clone(),
        config.storage.base_url.clone(),
    ));

    // Initialize services
    let state = AppState {
        account_service: AccountService::new(Arc::clone(&db), Arc::clone(&storage), &config),
        event_service: EventService::new(Arc::clone(&db), Arc::clone(&storage), &config),
        registration_service: RegistrationService::new(Arc::clone(&db)),
        admin_service: AdminService::new(Arc::clone(&db)),
        report_service: ReportService::new(Arc::clone(&db)),
        review_service: ReviewService::new(Arc::clone(&db)),
        certificate_service: CertificateService::new(Arc::clone(&db), &config),
    };

    // Daily sweep of finished events
    let sweep = config.scheduler.enabled.then(|| {
        let every = Duration::from_secs(config.scheduler.sweep_interval_secs.max(60));
        info!(interval_secs = every.as_secs(), "Event sweep scheduled");
        spawn_scheduler(EventSweeper::new(Arc::clone(&db)), every)
    });

    // Build router
    let api = api_router()
        .layer(DefaultBodyLimit::max(
            config.storage.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let app = Router::new()
        .nest("/api", api)
        .nest_service(
            &config.storage.base_url,
            ServeDir::new(&config.storage.upload_dir),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweep) = sweep {
        sweep.abort();
    }
    info!("Server shutdown complete");
    Ok(())
}
