//! # API Module
//!
//! The portal's JSON HTTP surface.
//!
//! ```text
//! GET   /health  /contact  /navigation             public
//! POST  /auth/login  /auth/directory  /auth/demo   rate limited
//! POST  /auth/logout                               bearer
//! GET   /dashboard                                 bearer
//! GET   /devices?search&brand&category&sort        bearer
//! GET   /devices/{id}  /devices/{id}/order-form    bearer
//! GET   /orders?status   POST /orders              bearer
//! GET   /profile         PATCH /profile            bearer
//! ```
//!
//! A token starting with `demo.` is served by the demo backend.

pub mod auth;
pub mod handlers;
pub mod state;

pub use state::{AppState, StartupError, load_directory};

use crate::config::Config;
use axum::Router;
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::middleware;
use axum::routing::{get, post};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the router over `state`.
pub fn router(state: AppState) -> Router {
    let auth = Router::new()
        .route("/login", post(handlers::login))
        .route("/directory", post(handlers::directory_login))
        .route("/demo", post(handlers::demo_login))
        .route_layer(middleware::from_fn_with_state(
            state.auth_limiter.clone(),
            auth::rate_limit,
        ))
        .route("/logout", post(handlers::logout));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/contact", get(handlers::contact))
        .route("/navigation", get(handlers::navigation))
        .nest("/auth", auth)
        .route("/dashboard", get(handlers::dashboard))
        .route("/devices", get(handlers::devices))
        .route("/devices/{id}", get(handlers::device_details))
        .route("/devices/{id}/order-form", get(handlers::order_form))
        .route("/orders", get(handlers::orders).post(handlers::place_order))
        .route(
            "/profile",
            get(handlers::profile).patch(handlers::update_profile),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

/// Build the state from `config` and serve until Ctrl-C or SIGTERM.
pub async fn serve(config: Config) -> Result<(), StartupError> {
    let state = AppState::from_config(&config).await?;
    let app = router(state);

    let listener = TcpListener::bind(config.bind).await?;
    info!(address = %config.bind, "portal listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                error!("failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
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
