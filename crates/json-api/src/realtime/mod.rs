//! Realtime stock event channel.
//!
//! A websocket route that forwards hub broadcasts to every connected
//! client. The channel is notification-only: no client-to-server stock
//! commands exist, and incoming frames other than close are discarded.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use salvo::{
    prelude::*,
    websocket::{Message, WebSocket, WebSocketUpgrade},
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use stockroom_app::events::EventHub;

use crate::{extensions::*, state::State};

/// Realtime Events Handler
///
/// Upgrades the connection and streams named stock events as JSON frames.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<(), StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let hub = Arc::clone(&state.events);

    WebSocketUpgrade::new()
        .upgrade(req, res, move |ws| serve_client(ws, hub))
        .await
}

async fn serve_client(ws: WebSocket, hub: Arc<EventHub>) {
    let mut events = hub.subscribe();
    let (mut sink, mut incoming) = ws.split();

    let connected = hub.client_connected();

    info!(connected, "realtime client connected");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let Ok(frame) = serde_json::to_string(&event) else {
                        continue;
                    };

                    if sink.send(Message::text(frame)).await.is_err() {
                        break;
                    }
                }
                // A slow client skipped ahead; it reconciles via pull sync.
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "realtime client lagged behind event stream");
                }
                Err(RecvError::Closed) => break,
            },
            frame = incoming.next() => match frame {
                Some(Ok(frame)) if !frame.is_close() => {
                    // Notification-only channel; inbound frames are ignored.
                }
                _ => break,
            },
        }
    }

    let connected = hub.client_disconnected();

    info!(connected, "realtime client disconnected");
}
