//! API server entry point.

use api::config::{Config, LogFormat, ServiceKind};
use api::state::AppState;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            result = signal::ctrl_c() => {
                result.expect("failed to install SIGINT handler");
                tracing::info!("received SIGINT, starting graceful shutdown");
            }
            _ = terminate.recv() => {
                tracing::info!("received SIGTERM, starting graceful shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
        tracing::info!("received SIGINT, starting graceful shutdown");
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env().expect("invalid configuration");
    init_tracing(&config);

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");
    api::routes::metrics::describe();

    let state = AppState::from_config(&config).expect("failed to wire services");

    let sweeper = config.service.serves(ServiceKind::Inventory).then(|| {
        api::spawn_expiry_sweeper(state.inventory.clone(), api::EXPIRY_SWEEP_INTERVAL)
    });

    let app = api::create_app(state, metrics_handle, config.service);

    let addr = config.addr();
    tracing::info!(%addr, service = %config.service, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("server shut down gracefully");
}
