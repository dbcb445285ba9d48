//! chartcall API server
//!
//! Hosts the request-forwarding endpoints, the full analysis flow, the
//! catalog, health and metrics. Stateless apart from metrics, so it can be
//! scaled horizontally.

use chartcall::config::Settings;
use chartcall::core::http::start_server;
use chartcall::logging;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let settings = Settings::from_env()?;
    let port = settings.port;
    info!(environment = %settings.environment, "Starting chartcall API server");
    info!(port = port, "HTTP Server: http://0.0.0.0:{}", port);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(settings).await {
            error!(error = %e, "HTTP server error");
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
