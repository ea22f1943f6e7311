pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use vidfront::ChannelRegistry;

use crate::media::StreamStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StreamStore>,
    pub registry: Arc<ChannelRegistry>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/channels", get(routes::channels))
        .route("/stream/{channel}/manifest.mpd", get(routes::dash_manifest))
        .route("/stream/{channel}/index.m3u8", get(routes::hls_master))
        .route("/stream/{channel}/{filename}", get(routes::stream_file))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP server.
pub async fn run_server(
    addr: SocketAddr,
    store: Arc<StreamStore>,
    registry: Arc<ChannelRegistry>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(AppState { store, registry });

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        while !*shutdown_rx.borrow_and_update() {
            if shutdown_rx.changed().await.is_err() {
                break;
            }
        }
    })
    .await?;

    Ok(())
}
