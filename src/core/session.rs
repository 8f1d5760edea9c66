use std::collections::HashMap;

use tokio::sync::mpsc;
use warp::ws::Message as WsMessage;

use crate::core::connection::Connection;
use crate::error::{Result, TriadError};

/// Registry of connected clients, keyed by session id
pub struct SessionManager {
    connections: HashMap<String, Connection>,
    // nickname -> session id, kept in step with `connections`
    nicknames: HashMap<String, String>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            nicknames: HashMap::new(),
        }
    }

    // Register a new client connection
    pub fn register(&mut self, id: String, sender: mpsc::UnboundedSender<WsMessage>) -> Result<()> {
        if self.connections.contains_key(&id) {
            return Err(TriadError::DuplicateSession(id));
        }
        let connection = Connection::with_id(id.clone(), sender);
        self.connections.insert(id, connection);
        Ok(())
    }

    // Remove a client connection, handing back its final state
    pub fn unregister(&mut self, id: &str) -> Result<Connection> {
        let connection = self
            .connections
            .remove(id)
            .ok_or_else(|| TriadError::SessionNotFound(id.to_string()))?;
        if let Some(nickname) = &connection.nickname {
            self.nicknames.remove(nickname);
        }
        Ok(connection)
    }

    pub fn get(&self, id: &str) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Connection> {
        self.connections.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.connections.values_mut()
    }

    /// Snapshot of all session ids
    pub fn ids(&self) -> Vec<String> {
        self.connections.keys().cloned().collect()
    }

    /// Give a client its nickname; fails when another client already holds it
    pub fn assign_nickname(&mut self, id: &str, nickname: &str) -> Result<()> {
        if self.is_nickname_taken(nickname) {
            return Err(TriadError::NicknameTaken(nickname.to_string()));
        }
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| TriadError::SessionNotFound(id.to_string()))?;
        if let Some(previous) = connection.nickname.replace(nickname.to_string()) {
            self.nicknames.remove(&previous);
        }
        self.nicknames.insert(nickname.to_string(), id.to_string());
        Ok(())
    }

    pub fn is_nickname_taken(&self, nickname: &str) -> bool {
        self.nicknames.contains_key(nickname)
    }

    /// Session id of the client holding `nickname`
    pub fn resolve_nickname(&self, nickname: &str) -> Option<&str> {
        self.nicknames.get(nickname).map(String::as_str)
    }

    /// nickname -> session id built by scanning every connection
    pub fn nickmap(&self) -> HashMap<String, String> {
        self.connections
            .values()
            .filter_map(|c| c.nickname.clone().map(|nick| (nick, c.id.clone())))
            .collect()
    }

    // Get current clients count
    pub fn client_count(&self) -> usize {
        self.connections.len()
    }
}
