//! Private messaging and per-client blacklists

use crate::core::connection::Connection;
use crate::core::session::SessionManager;

/// Where a private message should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateRoute {
    /// No target, or the sender addressed itself
    Ignored,
    /// Nobody holds that nickname; dropped without telling the sender
    UnknownRecipient,
    /// The recipient blacklisted the sender
    Blacklisted,
    /// Deliver to this session id
    Deliver(String),
}

/// Resolve the recipient of a private message from `sender_id` to `to`
pub fn route_private(sessions: &SessionManager, sender_id: &str, to: Option<&str>) -> PrivateRoute {
    let Some(to) = to else {
        return PrivateRoute::Ignored;
    };
    let sender_nickname = sessions.get(sender_id).and_then(|c| c.nickname.as_deref());
    if sender_nickname == Some(to) {
        return PrivateRoute::Ignored;
    }

    let resolved = sessions.resolve_nickname(to);
    debug_assert_eq!(
        resolved,
        sessions.nickmap().get(to).map(String::as_str),
        "nickname index out of step with the registry"
    );
    let Some(target) = resolved.and_then(|id| sessions.get(id)) else {
        return PrivateRoute::UnknownRecipient;
    };

    if let Some(nickname) = sender_nickname {
        if target.blacklist.contains(nickname) {
            return PrivateRoute::Blacklisted;
        }
    }

    PrivateRoute::Deliver(target.id.clone())
}

/// Add `nickname` to the client's own blacklist. Returns false if it was
/// already listed.
pub fn blacklist(client: &mut Connection, nickname: &str) -> bool {
    client.blacklist.insert(nickname.to_string())
}
