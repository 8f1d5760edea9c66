//! Shared chat state and the operations that mutate it
//!
//! `ChatState` owns the connection registry, the room allocator and the
//! shuffle clock. It is only ever reached through the single lock held by
//! [`ChatServer`](crate::core::server::ChatServer), so every operation here
//! runs to completion without interleaving.

use chrono::Utc;
use log::{debug, error, info, warn};
use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use warp::ws::Message as WsMessage;

use crate::config::ServerConfig;
use crate::constants::MIN_MESSAGE_LENGTH;
use crate::core::broadcast::{publish, roommates};
use crate::core::connection::PublicProfile;
use crate::core::filter::MessageFilter;
use crate::core::message_types::ServerMessage;
use crate::core::private::{blacklist, route_private, PrivateRoute};
use crate::core::registration::{
    avatar_url, check_nickname_length, is_valid_email, normalize_nickname, slugify,
    validate_nickname, ACCOUNT_INCOMPLETE, EMAIL_INVALID, NICKNAME_TAKEN,
};
use crate::core::room::RoomManager;
use crate::core::scheduler::ShuffleClock;
use crate::core::session::SessionManager;
use crate::core::tiers::Tier;
use crate::error::{Result, TriadError};
use crate::security::decode_html;

pub const SHUFFLE_MESSAGE: &str = "Shuffling the rooms";

/// Snapshot served on the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ServerStats {
    pub rooms: usize,
    pub users: usize,
    pub laps: u64,
    pub connections: usize,
    pub timeleft: u64,
}

pub struct ChatState {
    sessions: SessionManager,
    rooms: RoomManager,
    clock: ShuffleClock,
    avatar_size: u32,
}

impl ChatState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            sessions: SessionManager::new(),
            rooms: RoomManager::new(),
            clock: ShuffleClock::new(config.shuffle_interval),
            avatar_size: config.avatar_size,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub fn timeleft(&self) -> u64 {
        self.clock.timeleft()
    }

    pub fn stats(&self) -> ServerStats {
        let counts = self.rooms.counts();
        ServerStats {
            rooms: counts.rooms,
            users: counts.users,
            laps: counts.laps,
            connections: self.sessions.client_count(),
            timeleft: self.timeleft(),
        }
    }

    /// Add a freshly connected client; it has no nickname and no room yet
    pub fn register(&mut self, id: String, sender: mpsc::UnboundedSender<WsMessage>) -> Result<()> {
        self.sessions.register(id, sender)
    }

    /// Tell roommates the client left, release its room and forget it
    pub fn disconnect(&mut self, id: &str) -> Result<()> {
        let client = self
            .sessions
            .get(id)
            .ok_or_else(|| TriadError::SessionNotFound(id.to_string()))?;

        if !client.rooms.is_empty() {
            if let Some(profile) = client.profile() {
                let notice = ServerMessage::UserDepart {
                    profile,
                    details: client.details.clone(),
                };
                let rooms = client.rooms.clone();
                self.publish_from(id, &rooms, &notice);
            }
        }

        if let Some(client) = self.sessions.get_mut(id) {
            self.rooms.unsubscribe(client);
        }
        self.sessions.unregister(id)?;
        Ok(())
    }

    /// Filter `message` against the recipient's own state and send it
    pub fn emit(&self, recipient: &str, message: &ServerMessage) -> bool {
        let Some(client) = self.sessions.get(recipient) else {
            return false;
        };
        let value = MessageFilter::render(message.to_value(), Some(client), self.timeleft());
        client.send_json(&value)
    }

    /// Filter `message` against the sender's state and publish it to `rooms`
    pub fn publish_from(&self, sender: &str, rooms: &[String], message: &ServerMessage) -> usize {
        let value = MessageFilter::render(
            message.to_value(),
            self.sessions.get(sender),
            self.timeleft(),
        );
        publish(&self.sessions, sender, rooms, &value.to_string())
    }

    /// Send the generic malformed-input notice
    pub fn reject(&self, recipient: &str, reason: &str) {
        self.emit(recipient, &ServerMessage::unicorn(reason));
    }

    /// Register a nickname, assign a room and announce the newcomer
    pub fn create_account(
        &mut self,
        id: &str,
        nickname: Option<Value>,
        email: Option<Value>,
    ) -> Result<()> {
        let client = self
            .sessions
            .get(id)
            .ok_or_else(|| TriadError::SessionNotFound(id.to_string()))?;
        if client.is_named() {
            debug!("Client {} already has a nickname, ignoring account:create", id);
            return Ok(());
        }

        let (nickname, email) = match (nickname, email) {
            (Some(Value::String(n)), Some(Value::String(e)))
                if !n.trim().is_empty() && !e.trim().is_empty() =>
            {
                (normalize_nickname(&n), e)
            }
            _ => {
                self.emit(id, &account_rejected(ACCOUNT_INCOMPLETE));
                return Ok(());
            }
        };

        if let Err(reason) = validate_nickname(&nickname, |n| self.sessions.is_nickname_taken(n)) {
            self.emit(id, &account_rejected(reason));
            return Ok(());
        }
        if !is_valid_email(&email) {
            self.emit(id, &account_rejected(EMAIL_INVALID));
            return Ok(());
        }

        self.sessions.assign_nickname(id, &nickname)?;
        let client = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| TriadError::SessionNotFound(id.to_string()))?;
        let slug = slugify(&decode_html(&nickname));
        let avatar = avatar_url(&email, self.avatar_size);
        client.slug = Some(slug.clone());
        client.avatar = Some(avatar.clone());
        client.details.connected = Some(Utc::now());
        let assignment = self.rooms.subscribe(client)?;

        info!("Client {} registered as '{}' in room {}", id, nickname, assignment.room);

        let created = ServerMessage::AccountCreated {
            validates: true,
            message: None,
            roommates: Some(roommates(&self.sessions, id)),
            avatar: Some(avatar),
            slug: Some(slug),
        };
        self.emit(id, &created);
        self.announce_join(id);
        Ok(())
    }

    /// Live validation echo for a single form field
    pub fn validate_check(&self, id: &str, field: Option<Value>, value: Option<Value>) {
        let field = field.map(value_to_string).unwrap_or_default();
        let raw_value = value.map(value_to_string).unwrap_or_default();

        let response = match field.as_str() {
            "nickname" => {
                let nickname = normalize_nickname(&raw_value);
                match check_nickname_length(&nickname) {
                    Err(reason) => ServerMessage::CheckNickname {
                        validates: false,
                        message: Some(reason.to_string()),
                        field: field.clone(),
                        value: nickname,
                        nickname: None,
                    },
                    Ok(()) => {
                        let validates = !self.sessions.is_nickname_taken(&nickname);
                        ServerMessage::CheckNickname {
                            validates,
                            message: (!validates).then(|| NICKNAME_TAKEN.to_string()),
                            field: field.clone(),
                            value: raw_value,
                            nickname: Some(nickname),
                        }
                    }
                }
            }
            "email" => {
                if is_valid_email(&raw_value) {
                    ServerMessage::CheckEmail {
                        validates: true,
                        message: None,
                        gravatar: Some(avatar_url(&raw_value, self.avatar_size)),
                        field: field.clone(),
                        value: raw_value,
                    }
                } else {
                    ServerMessage::CheckEmail {
                        validates: false,
                        message: Some(EMAIL_INVALID.to_string()),
                        gravatar: None,
                        field: field.clone(),
                        value: raw_value,
                    }
                }
            }
            other => {
                debug!("Ignoring validation request for unknown field '{}'", other);
                return;
            }
        };

        self.emit(id, &response);
    }

    /// Relay a chat line to the sender's current rooms
    pub fn comment(&mut self, id: &str, message: String) -> Result<()> {
        let client = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| TriadError::SessionNotFound(id.to_string()))?;
        client.details.record_message(&message);

        if client.rooms.is_empty() || message.chars().count() < MIN_MESSAGE_LENGTH {
            debug!("Dropping comment from {} (no room or too short)", id);
            return Ok(());
        }

        let rooms = client.rooms.clone();
        let comment = ServerMessage::Comment {
            message,
            nickname: client.nickname.clone().unwrap_or_default(),
            rooms: rooms.clone(),
            time: Utc::now(),
        };
        let delivered = self.publish_from(id, &rooms, &comment);
        debug!("Comment from {} delivered to {} clients", id, delivered);
        Ok(())
    }

    /// Deliver a private message by nickname, honouring the recipient's blacklist
    pub fn private_message(&mut self, id: &str, to: Option<String>, message: String) -> Result<()> {
        let client = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| TriadError::SessionNotFound(id.to_string()))?;
        client.details.record_message(&message);

        let Some(from) = client.nickname.clone() else {
            debug!("Unnamed client {} tried to send a private message", id);
            return Ok(());
        };
        if message.chars().count() < MIN_MESSAGE_LENGTH {
            return Ok(());
        }

        let to = to.map(|t| normalize_nickname(&t));
        match route_private(&self.sessions, id, to.as_deref()) {
            PrivateRoute::Ignored => {}
            PrivateRoute::UnknownRecipient => {
                debug!("Private message from {} to unknown nickname dropped", from);
            }
            PrivateRoute::Blacklisted => {
                info!("Private message from '{}' refused by blacklist", from);
                self.emit(
                    id,
                    &ServerMessage::Error {
                        message: "Blacklisted".to_string(),
                    },
                );
            }
            PrivateRoute::Deliver(target) => {
                let private = ServerMessage::Private {
                    message,
                    from,
                    time: Utc::now(),
                };
                let value =
                    MessageFilter::render(private.to_value(), self.sessions.get(id), self.timeleft());
                if let Some(recipient) = self.sessions.get(&target) {
                    recipient.send_json(&value);
                }
            }
        }
        Ok(())
    }

    /// Add a nickname to the sender's own blacklist
    pub fn blacklist(&mut self, id: &str, nickname: &str) -> Result<()> {
        let nickname = normalize_nickname(nickname);
        if nickname.is_empty() {
            self.reject(id, "Incorrect message format");
            return Ok(());
        }

        let client = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| TriadError::SessionNotFound(id.to_string()))?;
        if !blacklist(client, &nickname) {
            debug!("'{}' already on the blacklist of {}", nickname, id);
        }

        self.emit(
            id,
            &ServerMessage::Notice {
                message: format!("Successfully blacklisted {}", nickname),
            },
        );
        Ok(())
    }

    /// Timer entry point: rearm the clock, count the lap, re-pack every room
    pub fn shuffle(&mut self) {
        self.clock.rearm();
        let lap = self.rooms.record_lap();
        info!(
            "Shuffle lap {}: re-packing {} connections",
            lap,
            self.sessions.client_count()
        );
        self.reset();
    }

    /// Clear all rooms and re-subscribe every named client in random order.
    /// Every connection, named or not, is told about the shuffle.
    pub fn reset(&mut self) {
        self.rooms.clear();

        let mut order = self.sessions.ids();
        order.shuffle(&mut rand::thread_rng());

        for client in self.sessions.iter_mut() {
            client.rooms.clear();
        }

        for id in &order {
            let Some(client) = self.sessions.get_mut(id) else {
                continue;
            };
            if !client.is_named() {
                // still on the sign-up form, only the countdown changed
                self.emit(id, &shuffle_notice(None));
                continue;
            }

            let assignment = match self.rooms.subscribe(client) {
                Ok(assignment) => assignment,
                Err(e) => {
                    error!("Failed to assign a room to {} during shuffle: {}", id, e);
                    continue;
                }
            };
            client.details.resync += 1;

            let mates = (assignment.tier >= Tier::Two).then(|| roommates(&self.sessions, id));
            self.emit(id, &shuffle_notice(mates));

            if assignment.joined_existing {
                self.announce_join(id);
            }
        }

        let counts = self.rooms.counts();
        debug!("Shuffle done: {} users in {} rooms", counts.users, counts.rooms);
    }

    // Let the client's roommates know it arrived
    fn announce_join(&self, id: &str) {
        let Some(client) = self.sessions.get(id) else {
            warn!("Cannot announce unknown client {}", id);
            return;
        };
        let Some(profile) = client.profile() else {
            return;
        };
        let notice = ServerMessage::UserJoin {
            profile,
            details: client.details.clone(),
        };
        self.publish_from(id, &client.rooms, &notice);
    }
}

fn shuffle_notice(roommates: Option<Vec<PublicProfile>>) -> ServerMessage {
    ServerMessage::Announcement {
        message: SHUFFLE_MESSAGE.to_string(),
        reset: true,
        roommates,
    }
}

fn account_rejected(reason: &str) -> ServerMessage {
    ServerMessage::AccountCreated {
        validates: false,
        message: Some(reason.to_string()),
        roommates: None,
        avatar: None,
        slug: None,
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
