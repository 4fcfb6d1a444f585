//! HTTP API server.
//!
//! Routes:
//! - `GET /health`
//! - `GET|POST /api/devices`
//! - `GET|DELETE /api/devices/{address}`
//! - `POST /api/scan`
//! - `POST /api/devices/update` (alias `POST /api/update-all`)
//!
//! Anything else falls through to the static directory when one is set.

mod error;
mod handlers;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use rigfleet_config::Config;
use rigfleet_core::{DeviceTransport, Fleet};

use crate::cli::ServeArgs;
use crate::config;
use crate::error::CliError;

/// Shared handler state.
pub struct AppState<T> {
    pub fleet: Arc<Fleet<T>>,
}

// Manual impl: `T` itself need not be `Clone`.
impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            fleet: Arc::clone(&self.fleet),
        }
    }
}

/// Build the application router.
pub fn router<T: DeviceTransport>(fleet: Arc<Fleet<T>>, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route(
            "/devices",
            get(handlers::list_devices::<T>).post(handlers::add_device::<T>),
        )
        .route("/devices/update", post(handlers::push_settings::<T>))
        .route(
            "/devices/{address}",
            get(handlers::get_device::<T>).delete(handlers::remove_device::<T>),
        )
        .route("/update-all", post(handlers::push_settings::<T>))
        .route("/scan", post(handlers::scan::<T>));

    let mut app = Router::new()
        .route("/health", get(handlers::health::<T>))
        .nest("/api", api)
        .with_state(AppState { fleet });

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run `rigfleet serve` until Ctrl-C or SIGTERM.
pub async fn serve(cfg: &Config, args: ServeArgs) -> Result<(), CliError> {
    let mut cfg = cfg.clone();
    if let Some(listen) = args.listen {
        cfg.server.listen = listen;
    }
    if let Some(dir) = args.static_dir {
        cfg.server.static_dir = Some(dir);
    }
    let addr = cfg.listen_addr()?;

    let fleet = Arc::new(config::open_fleet(&cfg)?);
    let app = router(fleet, cfg.server.static_dir.as_deref());

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| CliError::Server {
            listen: addr.to_string(),
            source,
        })?;
    info!(
        %addr,
        data_dir = %cfg.storage.data_dir.display(),
        static_dir = ?cfg.server.static_dir,
        "rigfleet API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|source| CliError::Server {
            listen: addr.to_string(),
            source,
        })?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl-C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
