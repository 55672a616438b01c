//! WebSocket upgrade handler and per-connection supervision

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::{AppState, ConnectionSlot};
use crate::game::{OutboundRx, Session, SessionError};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    // Reserve before upgrading so concurrent handshakes cannot overshoot
    let max = state.config.max_connections;
    let Some(slot) = ConnectionSlot::try_acquire(&state.ws_connections, max) else {
        warn!(max, "Connection limit reached, refusing upgrade");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, slot))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, _slot: ConnectionSlot) {
    let (ws_sink, mut ws_stream) = socket.split();

    let (session, outbound_rx) = Session::join(state.arena.clone());
    let connection_id = session.connection_id();
    info!(connection_id = %connection_id, "New WebSocket connection");

    // Writer task: outbound queue -> WebSocket
    let mut writer_handle = tokio::spawn(write_loop(connection_id, ws_sink, outbound_rx));

    let rate_limiter = ConnectionRateLimiter::new(state.config.input_rate_limit);

    tokio::select! {
        _ = read_loop(&session, &mut ws_stream, &rate_limiter) => {}
        _ = &mut writer_handle => {
            debug!(connection_id = %connection_id, "Writer stopped, closing session");
        }
    }

    // Transport is done either way; cleanup runs once even if drop follows
    session.leave();
    writer_handle.abort();

    info!(connection_id = %connection_id, "WebSocket connection closed");
}

/// Reader loop: WebSocket -> session
async fn read_loop(
    session: &Session,
    ws_stream: &mut SplitStream<WebSocket>,
    rate_limiter: &ConnectionRateLimiter,
) {
    let connection_id = session.connection_id();

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(connection_id = %connection_id, "Rate limited input message");
                    continue;
                }

                let msg = match ClientMsg::decode(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(connection_id = %connection_id, error = %e, "Failed to parse client message");
                        continue;
                    }
                };

                let kind = msg.kind();
                match session.handle(msg) {
                    Ok(()) => {}
                    Err(SessionError::Closed) => break,
                    Err(e) => {
                        debug!(connection_id = %connection_id, event = kind, error = %e, "Dropped client event");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(connection_id = %connection_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(connection_id = %connection_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }
}

/// Writer loop: outbound queue -> WebSocket
async fn write_loop(
    connection_id: Uuid,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut outbound_rx: OutboundRx,
) {
    loop {
        match outbound_rx.recv().await {
            Ok(msg) => {
                if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                    debug!(connection_id = %connection_id, error = %e, "WebSocket send failed");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    connection_id = %connection_id,
                    lagged_count = n,
                    "Client lagged, dropped {} oldest events", n
                );
                // Keep going - the client catches up from newer events
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(connection_id = %connection_id, "Outbound queue closed");
                break;
            }
        }
    }
}

/// Failures writing to a client socket
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to encode server message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("websocket send failed: {0}")]
    Transport(#[from] axum::Error),
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), SendError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
