//! hydrophone-api server binary.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hydrophone_api::{build_router, AppState, HostsConfig, Runtime};
use hydrophone_core::{HttpUrlProbe, ServiceState};
use hydrophone_db::{DatabaseHandles, PgDocumentRepository, PoolConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "hydrophone_api=debug,hydrophone_db=debug,hydrophone_core=info,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    // Daily-rotated file output when LOG_FILE is set
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("hydrophone-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = HostsConfig::from_env()?;

    let handles = Arc::new(DatabaseHandles::new(
        &config.db_reader_uri,
        &config.db_writer_uri,
        PoolConfig::default(),
    ));
    let repo = Arc::new(PgDocumentRepository::new(handles));
    repo.ensure_schema().await?;

    let probe = Arc::new(HttpUrlProbe::new()?);
    let runtime = Arc::new(Runtime::new(repo, probe));
    let app = build_router(AppState::new(runtime.clone()));

    let listener = tokio::net::TcpListener::bind(config.listen_address).await?;
    runtime.start();
    info!(
        subsystem = "api",
        component = "server",
        listen_address = %config.listen_address,
        "Serving RPC"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(runtime.clone()))
        .await?;

    runtime.shutdown().await;
    info!(subsystem = "api", component = "server", "Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM, closing the readiness gate first so
/// in-flight requests drain while new ones are refused.
async fn shutdown_signal(runtime: Arc<Runtime>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
    info!(subsystem = "api", component = "server", "Shutdown signal received");
    runtime.gate.set(ServiceState::Unavailable);
}
