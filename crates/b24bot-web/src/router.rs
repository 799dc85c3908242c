use std::{net::SocketAddr, sync::Arc};

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use b24bot_core::{
    config::{HANDLER_PATH, INSTALL_PATH},
    errors::Error,
    install::Installer,
    service::RobotService,
    Result,
};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub installer: Arc<Installer>,
    pub robots: Arc<RobotService>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            INSTALL_PATH,
            get(handlers::install::oauth_callback).post(handlers::install::install_event),
        )
        .route(
            HANDLER_PATH,
            get(handlers::robot::ping).post(handlers::robot::invoke),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, build_router(state))
        .await
        .map_err(Error::Io)
}
