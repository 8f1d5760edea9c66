//! Message types exchanged with clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::connection::{ClientDetails, PublicProfile};

/// Client-to-server message types
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Register a nickname and join the chat
    #[serde(rename = "account:create")]
    AccountCreate {
        nickname: Option<Value>,
        email: Option<Value>,
    },

    /// Live validation of a single form field
    #[serde(rename = "validate:check")]
    ValidateCheck {
        field: Option<Value>,
        value: Option<Value>,
    },

    /// Chat line for the sender's current rooms
    #[serde(rename = "comment")]
    Comment { message: String },

    /// Directed message to a nickname
    #[serde(rename = "private")]
    Private { to: Option<String>, message: String },

    /// Refuse private messages from a nickname
    #[serde(rename = "blacklist")]
    Blacklist { blacklist: String },
}

/// Server-to-client message types
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "check:nickname")]
    CheckNickname {
        validates: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        field: String,
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        nickname: Option<String>,
    },

    #[serde(rename = "check:email")]
    CheckEmail {
        validates: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        gravatar: Option<String>,
        field: String,
        value: String,
    },

    #[serde(rename = "account:created")]
    AccountCreated {
        validates: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        roommates: Option<Vec<PublicProfile>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        avatar: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        slug: Option<String>,
    },

    #[serde(rename = "comment")]
    Comment {
        message: String,
        nickname: String,
        rooms: Vec<String>,
        time: DateTime<Utc>,
    },

    #[serde(rename = "private")]
    Private {
        message: String,
        from: String,
        time: DateTime<Utc>,
    },

    #[serde(rename = "user:join")]
    UserJoin {
        #[serde(flatten)]
        profile: PublicProfile,
        details: ClientDetails,
    },

    #[serde(rename = "user:depart")]
    UserDepart {
        #[serde(flatten)]
        profile: PublicProfile,
        details: ClientDetails,
    },

    /// Sent to every named client after a shuffle
    #[serde(rename = "announcement")]
    Announcement {
        message: String,
        reset: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        roommates: Option<Vec<PublicProfile>>,
    },

    #[serde(rename = "notice")]
    Notice { message: String },

    #[serde(rename = "error")]
    Error { message: String },

    /// Malformed input
    #[serde(rename = "unicorn")]
    Unicorn { message: String },
}

impl ServerMessage {
    pub fn unicorn(message: &str) -> Self {
        Self::Unicorn {
            message: message.to_string(),
        }
    }

    /// Convert to the loose JSON record the filter works on
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            log::error!("Failed to serialize server message: {}", e);
            Value::Null
        })
    }
}
