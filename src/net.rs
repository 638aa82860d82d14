use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::GameSession;
use crate::state::SharedGameState;

pub async fn start_websocket_server(
    listener: TcpListener,
    state: Arc<Mutex<SharedGameState>>,
    session: Arc<Mutex<GameSession>>,
) {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "websocket listening");
    }

    loop {
        let (raw, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(%err, "accept failed");
                continue;
            }
        };
        debug!(%peer, "tcp connection");

        tokio::spawn(handle_connection(
            raw,
            Arc::clone(&state),
            Arc::clone(&session),
        ));
    }
}

async fn handle_connection(
    raw: TcpStream,
    state: Arc<Mutex<SharedGameState>>,
    session: Arc<Mutex<GameSession>>,
) {
    let ws = match accept_async(raw).await {
        Ok(ws) => ws,
        Err(err) => {
            warn!(%err, "websocket handshake failed");
            return;
        }
    };
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) Outgoing message channel
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let client_id = state.lock().await.register_client(tx.clone());
    info!(%client_id, "client connected");

    // -------------------------------
    // 2) Send-loop task
    // -------------------------------
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    send_json(
        &tx,
        &ServerMessage::Welcome {
            client_id: client_id.to_string(),
        },
    );

    // -------------------------------
    // 3) Receive loop
    // -------------------------------
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(err) => {
                debug!(%client_id, %err, "read error");
                break;
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let parsed = match ClientMessage::from_json(&text) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(%client_id, %err, "dropping malformed client message");
                continue;
            }
        };

        match parsed {
            ClientMessage::Ping => send_json(&tx, &ServerMessage::Pong),
            ClientMessage::Key { key, pressed } => {
                session.lock().await.handle_key(&key, pressed);
            }
            ClientMessage::Start => session.lock().await.start(),
            ClientMessage::Restart => session.lock().await.restart(),
            ClientMessage::Pause => session.lock().await.toggle_pause(),
        }
    }

    info!(%client_id, "client disconnected");
    state.lock().await.remove_client(&client_id);
    send_task.abort();
}

fn send_json(tx: &mpsc::UnboundedSender<String>, message: &ServerMessage) {
    match serde_json::to_string(message) {
        Ok(json) => {
            let _ = tx.send(json);
        }
        Err(err) => warn!(%err, "failed to serialize server message"),
    }
}
