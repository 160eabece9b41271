//! Live verdict stream
//!
//! Every verdict served by `/predict/` is pushed to connected dashboards
//! as `{"intrusion": 0|1}`. Slow clients skip what they missed.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;

use crate::models::PredictResponse;
use crate::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let verdicts = state.verdicts.subscribe();
    tracing::debug!("Dashboard connected ({} subscribers)", state.verdicts.receiver_count());

    let (outgoing, incoming) = socket.split();
    pump(outgoing, incoming, verdicts, state.shutdown.clone()).await;

    tracing::debug!("Dashboard disconnected");
}

/// Forward verdicts until the client leaves, the channel closes or shutdown
pub(crate) async fn pump<Tx, Rx>(
    mut outgoing: Tx,
    mut incoming: Rx,
    mut verdicts: broadcast::Receiver<PredictResponse>,
    mut shutdown: watch::Receiver<bool>,
) where
    Tx: Sink<Message> + Unpin,
    Rx: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        tokio::select! {
            verdict = next_verdict(&mut verdicts) => {
                let Some(v) = verdict else { break };
                let Ok(json) = serde_json::to_string(&v) else { continue };
                if outgoing.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            msg = incoming.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Clients only listen
                    Some(Ok(_)) => {}
                }
            }
            _ = shutdown_requested(&mut shutdown) => {
                let _ = outgoing.send(Message::Close(None)).await;
                break;
            }
        }
    }
}

/// Next verdict, skipping over anything a slow client missed
///
/// `None` once the channel is closed.
async fn next_verdict(verdicts: &mut broadcast::Receiver<PredictResponse>) -> Option<PredictResponse> {
    loop {
        match verdicts.recv().await {
            Ok(v) => return Some(v),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Dashboard lagged, skipped {} verdicts", skipped);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

/// Resolves once shutdown is set; never resolves if the sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
