//! Connected client state
//! Holds everything the chat core tracks about a single WebSocket connection

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use warp::ws::Message;

/// Per-client activity counters, shown alongside join/depart notices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientDetails {
    /// Number of comments and private messages sent
    pub lines: u64,
    /// Total words across those messages
    pub words: u64,
    /// Number of shuffles this client took part in
    pub resync: u64,
    /// When the transport connection was opened
    pub session: DateTime<Utc>,
    /// When the client registered a nickname
    pub connected: Option<DateTime<Utc>>,
}

impl ClientDetails {
    fn new() -> Self {
        Self {
            lines: 0,
            words: 0,
            resync: 0,
            session: Utc::now(),
            connected: None,
        }
    }

    /// Record one outgoing message
    pub fn record_message(&mut self, message: &str) {
        self.lines += 1;
        self.words += message.split_whitespace().count() as u64;
    }
}

/// Public view of a client, safe to hand to other clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub nickname: String,
    pub avatar: Option<String>,
    pub slug: Option<String>,
    pub rooms: Vec<String>,
}

/// Represents the state of a single connected client
pub struct Connection {
    pub id: String,
    pub sender: mpsc::UnboundedSender<Message>,
    /// Unique among named clients; immutable once set
    pub nickname: Option<String>,
    pub slug: Option<String>,
    pub avatar: Option<String>,
    /// Rooms currently joined, zero or one between shuffles
    pub rooms: Vec<String>,
    /// Nicknames whose private messages are refused
    pub blacklist: HashSet<String>,
    pub details: ClientDetails,
}

impl Connection {
    /// Create a connection record for a transport-assigned session id
    pub fn with_id(id: String, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id,
            sender,
            nickname: None,
            slug: None,
            avatar: None,
            rooms: Vec::new(),
            blacklist: HashSet::new(),
            details: ClientDetails::new(),
        }
    }

    /// Send a text message through this connection
    pub fn send_text(&self, text: &str) -> bool {
        match self.sender.send(Message::text(text)) {
            Ok(_) => true,
            Err(_) => {
                warn!("Failed to send message to client {}", self.id);
                false
            }
        }
    }

    /// Serialize and send a JSON record
    pub fn send_json(&self, value: &Value) -> bool {
        self.send_text(&value.to_string())
    }

    /// True when any of our rooms is in `rooms`
    pub fn shares_room(&self, rooms: &[String]) -> bool {
        self.rooms.iter().any(|room| rooms.contains(room))
    }

    pub fn is_named(&self) -> bool {
        self.nickname.is_some()
    }

    /// Public profile, only available once a nickname is registered
    pub fn profile(&self) -> Option<PublicProfile> {
        self.nickname.as_ref().map(|nickname| PublicProfile {
            nickname: nickname.clone(),
            avatar: self.avatar.clone(),
            slug: self.slug.clone(),
            rooms: self.rooms.clone(),
        })
    }
}
