use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use backend_application::queries::stats_queries;
use backend_application::AppState;
use backend_domain::ScanCounters;

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn get_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ScanCounters>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let counters = stats_queries::get_scan_stats(&state).await?;
    Ok(Json(counters))
}

pub async fn stream_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(ws.on_upgrade(move |socket| handle_stats_socket(socket, state)))
}

/// Sends the current counters, then every update until either side hangs up.
async fn handle_stats_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.stats_hub.subscribe();
    debug!(
        subscribers = state.stats_hub.subscriber_count(),
        "stats stream opened"
    );

    match stats_queries::get_scan_stats(&state).await {
        Ok(counters) => {
            if send_counters(&mut sender, &counters).await.is_err() {
                return;
            }
        }
        Err(err) => warn!("initial stats snapshot failed: {}", err),
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(counters) => {
                    if send_counters(&mut sender, &counters).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "stats subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

async fn send_counters(
    sender: &mut SplitSink<WebSocket, Message>,
    counters: &ScanCounters,
) -> Result<(), ()> {
    let payload = serde_json::to_string(counters).map_err(|_| ())?;
    sender.send(Message::Text(payload)).await.map_err(|_| ())
}
