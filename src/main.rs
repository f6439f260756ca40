use std::net::SocketAddr;
use std::time::Duration;

use dotenvy::dotenv;

use campusdesk::logging::{init_tracing, shutdown_tracer};
use campusdesk::metrics::{init_metrics, metrics_app};
use campusdesk::router::init_router;
use campusdesk::state::init_app_state;
use campusdesk_config::ServerConfig;

const RATE_LIMIT_UPKEEP: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let server_config = ServerConfig::from_env();

    let state = match init_app_state().await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = ?e, "Failed to initialise application state");
            shutdown_tracer().await;
            std::process::exit(1);
        }
    };

    if let Some(handle) = init_metrics() {
        let addr = server_config.metrics_addr();
        match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => {
                tracing::info!(%addr, "Metrics server listening");
                tokio::spawn(async move {
                    if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                        tracing::error!(error = %e, "Metrics server stopped");
                    }
                });
            }
            Err(e) => tracing::warn!(%addr, error = %e, "Metrics port unavailable, skipping"),
        }
    }

    let limiters = state.rate_limiters.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_UPKEEP);
        loop {
            interval.tick().await;
            limiters.retain_recent();
        }
    });

    let app = init_router(state);

    let addr = server_config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            shutdown_tracer().await;
            std::process::exit(1);
        }
    };

    tracing::info!("🚀 Server running on http://{}", addr);
    tracing::info!("📚 Swagger UI available at http://{}/swagger-ui", addr);
    tracing::info!("📖 Scalar UI available at http://{}/scalar", addr);

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "Server error");
    }

    shutdown_tracer().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
