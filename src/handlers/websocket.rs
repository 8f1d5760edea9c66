use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use log::{debug, error, info};
use tokio::sync::mpsc;
use uuid::Uuid;
use warp::ws::WebSocket;

use crate::core::message_handler::MessageHandler;
use crate::core::server::SharedChatServer;

// Handle a WebSocket connection
pub async fn handle_ws_client(ws: WebSocket, server: SharedChatServer) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (tx, rx) = mpsc::unbounded_channel();

    // Spawn a task to forward messages from our channel to the WebSocket
    tokio::task::spawn(async move {
        let mut rx = rx;
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_tx.send(message).await {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    // Generate a unique client ID
    let client_id = Uuid::new_v4().to_string();

    if let Err(e) = server.register_connection(client_id.clone(), tx).await {
        error!("Failed to register client {}: {}", client_id, e);
        return;
    }
    info!("Client connected: {}", client_id);
    info!("Current connections: {}", server.connection_count().await);

    let handler = MessageHandler::new(server.clone());

    // Handle incoming messages
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(msg) => {
                if msg.is_close() {
                    break;
                }
                // Only process text messages
                if let Ok(text) = msg.to_str() {
                    if let Err(e) = handler.handle_client_message(&client_id, text).await {
                        debug!("Frame from {} not processed: {}", client_id, e);
                    }
                }
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
        }
    }

    // Client disconnected
    match server.disconnect(&client_id).await {
        Ok(()) => {
            info!("Client disconnected: {}", client_id);
            info!("Current connections: {}", server.connection_count().await);
        }
        Err(e) => error!("Error unregistering client {}: {}", client_id, e),
    }
}
