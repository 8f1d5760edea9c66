//! Message handler: raw frames to typed chat operations

use log::{debug, warn};
use serde_json::Value;

use crate::core::filter::MessageFilter;
use crate::core::message_types::ClientMessage;
use crate::core::server::SharedChatServer;
use crate::error::{Result, TriadError};

/// Event names that are never accepted from a client
const RESERVED_TYPES: &[&str] = &["message", "connect", "disconnect"];

/// Handles incoming client messages and routes them appropriately
pub struct MessageHandler {
    server: SharedChatServer,
    max_message_size: usize,
}

impl MessageHandler {
    pub fn new(server: SharedChatServer) -> Self {
        let max_message_size = server.config().max_message_size;
        Self {
            server,
            max_message_size,
        }
    }

    /// Process a client frame. Any failure is answered with an `unicorn`
    /// rejection for the sender and handed back for logging.
    pub async fn handle_client_message(&self, sender_id: &str, message_text: &str) -> Result<()> {
        let result = self.process(sender_id, message_text).await;
        if let Err(e) = &result {
            warn!("Rejected frame from {}: {}", sender_id, e);
            self.server.lock().await.reject(sender_id, e.client_message());
        }
        result
    }

    async fn process(&self, sender_id: &str, message_text: &str) -> Result<()> {
        if message_text.len() > self.max_message_size {
            return Err(TriadError::MessageTooLarge(message_text.len()));
        }

        let mut raw: Value = serde_json::from_str(message_text)
            .map_err(|e| TriadError::MessageParseError(format!("Invalid JSON: {}", e)))?;
        check_event_type(&raw)?;

        let mut state = self.server.lock().await;
        let timeleft = state.timeleft();
        MessageFilter::apply(&mut raw, state.sessions().get(sender_id), timeleft);

        let message: ClientMessage = serde_json::from_value(raw)
            .map_err(|e| TriadError::MessageParseError(e.to_string()))?;
        debug!("Handling {:?} from {}", message, sender_id);

        match message {
            ClientMessage::AccountCreate { nickname, email } => {
                state.create_account(sender_id, nickname, email)
            }
            ClientMessage::ValidateCheck { field, value } => {
                state.validate_check(sender_id, field, value);
                Ok(())
            }
            ClientMessage::Comment { message } => state.comment(sender_id, message),
            ClientMessage::Private { to, message } => state.private_message(sender_id, to, message),
            ClientMessage::Blacklist { blacklist } => state.blacklist(sender_id, &blacklist),
        }
    }
}

// The record must be an object with a string `type` that is not reserved
fn check_event_type(raw: &Value) -> Result<()> {
    let kind = raw
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| TriadError::MessageParseError("Missing message type".to_string()))?;

    if RESERVED_TYPES.iter().any(|reserved| kind.contains(reserved)) {
        return Err(TriadError::MessageParseError(format!(
            "Reserved message type: {}",
            kind
        )));
    }
    Ok(())
}
