use std::net::SocketAddr;

use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use shared::protocol::{
    DeviceStatus, RpcCommand, RpcResponse, INDEX_ROUTE, RPC_ROUTE, STATUS_ROUTE,
};
use tokio::time::sleep;
use tracing::{info, trace};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
mod player;

use api::{handle_rpc, render_index, RpcEnvelope, RpcRejection};
use app_state::AppState;
use config::load_settings;
use player::SequencePlayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings()?;
    let player = SequencePlayer::new(settings.default_sequence, settings.default_speed);
    let default = player.default_status();
    info!(
        sequence_id = default.sequence_id.0,
        speed = default.speed,
        "read default sequence"
    );

    let state = AppState::new(player);
    tokio::spawn(run_playback(state.clone()));

    let app = build_router(state);
    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "device listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(INDEX_ROUTE, get(index))
        .route(STATUS_ROUTE, get(status))
        .route(RPC_ROUTE, post(rpc))
        .with_state(state)
}

/// Emits one frame per speed interval. A restart notification cuts the current delay short
/// so a new sequence begins immediately.
async fn run_playback(state: AppState) {
    loop {
        let (frame, delay) = {
            let mut player = state.player.lock().await;
            (player.next_frame(), player.frame_delay())
        };
        trace!(pins = %format!("{:08b}", frame.0), "frame");

        tokio::select! {
            _ = sleep(delay) => {}
            _ = state.restart.notified() => {}
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let player = state.player.lock().await;
    Html(render_index(player.catalog()))
}

async fn status(State(state): State<AppState>) -> Json<DeviceStatus> {
    Json(state.player.lock().await.status())
}

async fn rpc(
    State(state): State<AppState>,
    Json(envelope): Json<RpcEnvelope>,
) -> Result<Json<RpcResponse>, RpcRejection> {
    let restarts_playback = envelope
        .command
        .as_ref()
        .and_then(|command| command.as_str())
        == Some(RpcCommand::SetSequence.as_str());
    let response = {
        let mut player = state.player.lock().await;
        handle_rpc(&mut player, envelope)?
    };
    if restarts_playback {
        state.restart.notify_one();
    }
    Ok(Json(response))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
