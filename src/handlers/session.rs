//! Viewer session WebSocket handler.
//!
//! Each connection is one session: it attaches to the view registry on open,
//! forwards every render command from its queue to the browser as JSON and
//! detaches when either side closes.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::dispatch::{SessionQueue, SessionReceiver};
use crate::state::SharedState;

/// Handler for the /ws endpoint.
#[instrument(skip(ws, state))]
pub async fn session_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    debug!("Processing /ws upgrade");
    ws.on_upgrade(|socket| run_session(socket, state))
}

async fn run_session(socket: WebSocket, state: SharedState) {
    let (queue, rx) = SessionQueue::channel();
    let id = state.attach_session(queue);

    let (sink, mut inbound) = socket.split();
    let forward = forward_commands(sink, rx);
    let watch_close = async {
        while let Some(message) = inbound.next().await {
            match message {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    };

    tokio::select! {
        _ = forward => debug!("{} render queue ended", id),
        _ = watch_close => debug!("{} closed by client", id),
    }

    state.detach_session(id);
    info!("{} ended", id);
}

/// Drains the session queue onto the socket until either fails.
async fn forward_commands<S>(mut sink: S, mut rx: SessionReceiver)
where
    S: SinkExt<Message> + Unpin,
{
    while let Some(command) = rx.recv().await {
        let json = match command.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Render command serialization error: {}", e);
                continue;
            }
        };
        if sink.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}
