use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use vidfront::ChannelEntry;

use crate::media::SessionKey;
use crate::media::ffmpeg::{self, StreamKind};
use crate::media::files::{
    DASH_MANIFEST, HLS_MASTER, HLS_REENC_INDEX, MIN_MANIFEST_BYTES, is_plain_name,
    is_segment_file, media_type_for,
};
use crate::media::pipeline::wait_for_file;

use super::AppState;

/**
    Identify a client by address and user agent.

    The address is the peer IP, or the first `X-Forwarded-For` hop when
    `trust_forwarded_for` is set.
*/
pub fn client_id(headers: &HeaderMap, peer: IpAddr, trust_forwarded_for: bool) -> String {
    let forwarded = trust_forwarded_for
        .then(|| headers.get("x-forwarded-for"))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let host = match forwarded {
        Some(host) => host.to_string(),
        None => peer.to_string(),
    };
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    format!("{host}|{user_agent}")
}

fn session_for(
    state: &AppState,
    headers: &HeaderMap,
    peer: IpAddr,
    channel: &str,
) -> SessionKey {
    let client = client_id(headers, peer, state.store.config().trust_forwarded_for);
    SessionKey::new(client, channel)
}

/// Root endpoint: service description and running channels.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let running: Vec<serde_json::Value> = state
        .store
        .running_channels()
        .await
        .into_iter()
        .map(|(channel, kind)| serde_json::json!({ "channel": channel, "format": kind.as_str() }))
        .collect();

    (
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        serde_json::json!({
            "service": "vidstream",
            "dash": "/stream/{channel}/manifest.mpd",
            "hls": "/stream/{channel}/index.m3u8",
            "channels": "/channels",
            "running": running,
        })
        .to_string(),
    )
}

#[derive(Serialize)]
struct ChannelList<'a> {
    default: &'a str,
    channels: &'a [ChannelEntry],
}

/// Channel registry used by the player menus.
pub async fn channels(State(state): State<AppState>) -> impl IntoResponse {
    let response = Json(ChannelList {
        default: &state.registry.default_entry().label,
        channels: state.registry.entries(),
    })
    .into_response();
    response
}

/// DASH manifest endpoint. Starts the transcoder on demand.
pub async fn dash_manifest(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    if !is_plain_name(&channel) {
        return Err(StatusCode::NOT_FOUND);
    }

    let session = session_for(&state, &headers, peer.ip(), &channel);
    log::info!("Manifest requested for {} by {}", channel, session.client);

    if state.store.is_flagged(&session).await {
        log::info!(
            "Refusing manifest for {} to flagged client {}",
            channel,
            session.client
        );
        return Err(StatusCode::GONE);
    }

    state.store.ensure_dash(session).await.map_err(|e| {
        log::error!("Failed to start DASH stream for {channel}: {e:#}");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let manifest = state.store.channel_dir(&channel).join(DASH_MANIFEST);
    if !wait_for_file(&manifest, MIN_MANIFEST_BYTES, state.store.config().manifest_wait).await {
        log::warn!("Manifest for {channel} not ready in time");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    serve_file(&manifest, media_type_for(DASH_MANIFEST)).await
}

/// HLS master playlist endpoint. Starts the dual-variant transcoder on demand.
pub async fn hls_master(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<Response, StatusCode> {
    if !is_plain_name(&channel) {
        return Err(StatusCode::NOT_FOUND);
    }

    state.store.ensure_hls(&channel).await.map_err(|e| {
        log::error!("Failed to start HLS stream for {channel}: {e:#}");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let dir = state.store.channel_dir(&channel);
    let master = dir.join(HLS_MASTER);
    let base = ffmpeg::channel_base(&state.store.config().public_base, &channel);
    tokio::fs::write(&master, ffmpeg::master_playlist(&base))
        .await
        .map_err(|e| {
            log::error!("Failed to write {}: {}", master.display(), e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let variant = dir.join(HLS_REENC_INDEX);
    if !wait_for_file(&variant, MIN_MANIFEST_BYTES, state.store.config().manifest_wait).await {
        log::warn!(
            "{} playlist for {} not ready in time",
            StreamKind::Hls.as_str(),
            channel
        );
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    serve_file(&master, media_type_for(HLS_MASTER)).await
}

/// Segment and variant playlist endpoint.
pub async fn stream_file(
    State(state): State<AppState>,
    Path((channel, filename)): Path<(String, String)>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    if !is_plain_name(&channel) || !is_plain_name(&filename) {
        return Err(StatusCode::NOT_FOUND);
    }

    let path = state.store.channel_dir(&channel).join(&filename);
    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        log::debug!("Requested file not found: {}", path.display());
        return Err(StatusCode::NOT_FOUND);
    }

    if is_segment_file(&filename) {
        let session = session_for(&state, &headers, peer.ip(), &channel);
        state.store.record_segment_request(session).await;
    }

    serve_file(&path, media_type_for(&filename)).await
}

async fn serve_file(path: &std::path::Path, content_type: &str) -> Result<Response, StatusCode> {
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StatusCode::NOT_FOUND
        } else {
            log::error!("Error opening file {}: {}", path.display(), e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
