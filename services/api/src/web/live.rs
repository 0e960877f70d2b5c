//! services/api/src/web/live.rs
//!
//! This is the main entry point and control loop for a live WebSocket connection.
//! Searches are debounced and screen refreshes are sequenced so that a slow, stale
//! response never overwrites a newer one.

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    screens::{self, Screen, SearchResultView},
    state::{AppState, LiveSession},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use learning_overlay_core::ports::PortResult;
use learning_overlay_core::sequence::{RequestSequencer, RequestTicket};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn live_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, device_id))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, device_id: Uuid) {
    info!(%device_id, "Live connection established");

    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));
    let mut session = LiveSession::new(device_id);

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                handle_text_message(text.as_str(), &app_state, &mut session, &ws_sender).await;
            }
            Ok(Message::Close(_)) => {
                info!(%device_id, "Client sent close message.");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(%device_id, "Live connection failed: {}", e);
                break;
            }
        }
    }

    // Pending searches and refreshes must not outlive the socket.
    session.connection.cancel();
    info!(%device_id, "Live connection closed.");
}

async fn handle_text_message(text: &str, app_state: &Arc<AppState>, session: &mut LiveSession, ws_sender: &WsSender) {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            send_frame(
                ws_sender,
                &ServerMessage::Error {
                    message: format!("Invalid message: {}", e),
                },
            )
            .await;
            return;
        }
    };

    match client_msg {
        ClientMessage::Search { query } => {
            let token = session.restart_search();
            let sequencer = session.search_sequencer.clone();
            let ticket = sequencer.issue();
            let app_state = app_state.clone();
            let ws_sender = ws_sender.clone();
            let device_id = session.device_id;
            tokio::spawn(async move {
                let delay = app_state.config.search_debounce;
                let outcome = debounced_search(&app_state, device_id, &query, token, &sequencer, ticket, delay).await;
                let msg = match outcome {
                    Some(Ok(hits)) => ServerMessage::SearchResults { query, hits },
                    Some(Err(e)) => {
                        error!("Search for '{}' failed: {:?}", query, e);
                        ServerMessage::Error { message: e.to_string() }
                    }
                    None => {
                        debug!(query = %query, "search superseded");
                        return;
                    }
                };
                send_current(&ws_sender, &sequencer, ticket, &msg).await;
            });
        }
        ClientMessage::Refresh { screen } => {
            let sequencer = session.sequencer_for(screen);
            let ticket = sequencer.issue();
            let connection = session.connection.clone();
            let app_state = app_state.clone();
            let ws_sender = ws_sender.clone();
            let device_id = session.device_id;
            tokio::spawn(async move {
                refresh_screen(&app_state, device_id, screen, &sequencer, ticket, connection, &ws_sender).await;
            });
        }
    }
}

//=========================================================================================
// Debounced Search
//=========================================================================================

/// Waits for `delay` unless `token` is cancelled first. Returns whether the delay
/// elapsed.
pub async fn debounce(token: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Runs a search once the input has been quiet for `delay`.
///
/// `ticket` must be issued when the query arrives. Returns `None` when a newer query
/// superseded this one, either during the quiet period or while the search was running.
pub async fn debounced_search(
    app_state: &AppState,
    device_id: Uuid,
    query: &str,
    token: CancellationToken,
    sequencer: &RequestSequencer,
    ticket: RequestTicket,
    delay: Duration,
) -> Option<PortResult<Vec<SearchResultView>>> {
    if !debounce(&token, delay).await {
        return None;
    }

    let store = app_state.store_for(device_id);
    let result = tokio::select! {
        _ = token.cancelled() => return None,
        result = screens::run_search(app_state.entities.as_ref(), store.as_ref(), query) => result,
    };
    sequencer.accept(ticket, result)
}

//=========================================================================================
// Screen Refresh
//=========================================================================================

/// Loads `screen` and builds the message for it.
///
/// Returns `None` when a newer refresh of the screen was issued while this one was
/// loading. Errors of superseded refreshes are as stale as their payloads.
pub async fn refresh_step(
    app_state: &AppState,
    device_id: Uuid,
    screen: Screen,
    sequencer: &RequestSequencer,
    ticket: RequestTicket,
) -> Option<ServerMessage> {
    let store = app_state.store_for(device_id);
    let result = screens::load_screen(app_state.entities.as_ref(), store.as_ref(), screen, app_state.home_limits()).await;

    let msg = match result {
        Ok(payload) => ServerMessage::Screen {
            seq: ticket.value(),
            screen,
            payload,
        },
        Err(e) => {
            if sequencer.is_current(ticket) {
                error!("Refresh of {:?} failed: {:?}", screen, e);
            }
            ServerMessage::Error { message: e.to_string() }
        }
    };
    let accepted = sequencer.accept(ticket, msg);
    if accepted.is_none() {
        debug!(?screen, seq = ticket.value(), "stale refresh dropped");
    }
    accepted
}

async fn refresh_screen(
    app_state: &AppState,
    device_id: Uuid,
    screen: Screen,
    sequencer: &RequestSequencer,
    ticket: RequestTicket,
    connection: CancellationToken,
    ws_sender: &WsSender,
) {
    let step = tokio::select! {
        _ = connection.cancelled() => return,
        step = refresh_step(app_state, device_id, screen, sequencer, ticket) => step,
    };
    if let Some(msg) = step {
        send_current(ws_sender, sequencer, ticket, &msg).await;
    }
}

/// Sends `message` unless `ticket` was superseded.
///
/// The check runs while the sender is locked, so a frame that passes it always goes out
/// before any frame of a newer ticket.
async fn send_current(ws_sender: &WsSender, sequencer: &RequestSequencer, ticket: RequestTicket, message: &ServerMessage) {
    let Some(json) = encode(message) else { return };
    let mut sender = ws_sender.lock().await;
    if !sequencer.is_current(ticket) {
        debug!(seq = ticket.value(), "superseded before sending");
        return;
    }
    if sender.send(Message::Text(json.into())).await.is_err() {
        error!("Failed to send message to the live client.");
    }
}

/// Serializes and sends one message.
async fn send_frame(ws_sender: &WsSender, message: &ServerMessage) {
    let Some(json) = encode(message) else { return };
    if ws_sender.lock().await.send(Message::Text(json.into())).await.is_err() {
        error!("Failed to send message to the live client.");
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    serde_json::to_string(message)
        .map_err(|e| error!("Failed to serialize server message: {}", e))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn debounce_elapses_without_cancellation() {
        let token = CancellationToken::new();
        assert!(debounce(&token, Duration::from_millis(300)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_interrupts_the_quiet_period() {
        let token = CancellationToken::new();
        let waiting = tokio::spawn({
            let token = token.clone();
            async move { debounce(&token, Duration::from_secs(10)).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        assert!(!waiting.await.unwrap());
    }
}
