//! Message filter applied to every record entering or leaving the core

use serde_json::{Map, Value};

use crate::core::connection::Connection;
use crate::security::{contains_xss_patterns, sanitize_text};

/// Fields holding client supplied text
const SANITIZED_FIELDS: &[&str] = &["nickname", "message", "value"];

/// Stamps, fills and sanitizes message records
pub struct MessageFilter;

impl MessageFilter {
    /// Apply the filter in place.
    ///
    /// `client` is the connection whose state fills absent `rooms` and
    /// `nickname` fields. Non-object values are left untouched.
    pub fn apply(message: &mut Value, client: Option<&Connection>, timeleft: u64) {
        let Some(map) = message.as_object_mut() else {
            return;
        };

        map.insert("timeleft".to_string(), Value::from(timeleft));

        if let Some(client) = client {
            if is_absent(map, "rooms") {
                map.insert("rooms".to_string(), Value::from(client.rooms.clone()));
            }
            if is_absent(map, "nickname") {
                if let Some(nickname) = &client.nickname {
                    map.insert("nickname".to_string(), Value::from(nickname.clone()));
                }
            }
        }

        for field in SANITIZED_FIELDS {
            if let Some(Value::String(text)) = map.get_mut(*field) {
                if contains_xss_patterns(text) {
                    log::warn!(
                        "Neutralized markup in '{}' from {}",
                        field,
                        client.map(|c| c.id.as_str()).unwrap_or("server")
                    );
                }
                *text = sanitize_text(text);
            }
        }
    }

    /// Filter and serialize in one step
    pub fn render(mut message: Value, client: Option<&Connection>, timeleft: u64) -> Value {
        Self::apply(&mut message, client, timeleft);
        message
    }
}

fn is_absent(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).map_or(true, Value::is_null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn named(nickname: &str, rooms: &[&str]) -> Connection {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut conn = Connection::with_id("c1".to_string(), tx);
        conn.nickname = Some(nickname.to_string());
        conn.rooms = rooms.iter().map(|r| r.to_string()).collect();
        conn
    }

    #[test]
    fn test_fills_absent_fields_from_client() {
        let client = named("bob", &["R1"]);
        let out = MessageFilter::render(json!({"type": "comment", "message": " hi "}), Some(&client), 1500);
        assert_eq!(out["timeleft"], 1500);
        assert_eq!(out["rooms"], json!(["R1"]));
        assert_eq!(out["nickname"], "bob");
        assert_eq!(out["message"], "hi");
    }

    #[test]
    fn test_keeps_present_fields() {
        let client = named("bob", &["R1"]);
        let out = MessageFilter::render(
            json!({"nickname": "alice", "rooms": ["R9"]}),
            Some(&client),
            0,
        );
        assert_eq!(out["nickname"], "alice");
        assert_eq!(out["rooms"], json!(["R9"]));
    }

    #[test]
    fn test_sanitizes_text_fields_only() {
        let out = MessageFilter::render(
            json!({"message": "<b>x</b>", "value": "<i>", "other": "<u>"}),
            None,
            0,
        );
        assert_eq!(out["message"], "&lt;b&gt;x&lt;&#x2f;b&gt;");
        assert_eq!(out["value"], "&lt;i&gt;");
        assert_eq!(out["other"], "<u>");
        assert!(out.get("rooms").is_none());
    }

    #[test]
    fn test_filter_twice_is_stable() {
        let client = named("bob", &["R1"]);
        let once = MessageFilter::render(json!({"message": " <script>&amp; "}), Some(&client), 10);
        let twice = MessageFilter::render(once.clone(), Some(&client), 10);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_object_untouched() {
        let out = MessageFilter::render(json!("text"), None, 5);
        assert_eq!(out, json!("text"));
    }
}
