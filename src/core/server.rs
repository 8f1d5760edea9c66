//! Integrated server service that owns the chat state behind one lock

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use warp::ws::Message as WsMessage;

use crate::config::ServerConfig;
use crate::core::scheduler;
use crate::core::state::{ChatState, ServerStats};
use crate::error::Result;

/// Shares one `ChatState` between connection handlers and the shuffle timer.
///
/// Every mutation and every membership read that drives a delivery goes
/// through `lock()`, so a shuffle can never interleave with a broadcast.
pub struct ChatServer {
    state: Mutex<ChatState>,
    config: ServerConfig,
}

impl ChatServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            state: Mutex::new(ChatState::new(&config)),
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Exclusive access to the chat state
    pub async fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().await
    }

    /// Register a new transport connection
    pub async fn register_connection(
        &self,
        client_id: String,
        sender: mpsc::UnboundedSender<WsMessage>,
    ) -> Result<()> {
        self.lock().await.register(client_id, sender)
    }

    /// Remove a connection, notifying its roommates
    pub async fn disconnect(&self, client_id: &str) -> Result<()> {
        self.lock().await.disconnect(client_id)
    }

    /// Run one shuffle lap
    pub async fn shuffle(&self) {
        self.lock().await.shuffle();
    }

    pub async fn stats(&self) -> ServerStats {
        self.lock().await.stats()
    }

    /// Get connection count
    pub async fn connection_count(&self) -> usize {
        self.lock().await.sessions().client_count()
    }

    /// Start the periodic shuffle
    pub fn start_shuffle_task(self: Arc<Self>) -> JoinHandle<()> {
        scheduler::start_shuffle_task(self)
    }
}

// Shared reference to the chat server
pub type SharedChatServer = Arc<ChatServer>;
