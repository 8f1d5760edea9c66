//! Room-aware delivery and roommate lookup

use crate::core::connection::PublicProfile;
use crate::core::session::SessionManager;

/// Deliver `payload` to every client, other than the sender, that holds at
/// least one of `rooms`. Best effort: returns how many sends succeeded.
pub fn publish(sessions: &SessionManager, sender_id: &str, rooms: &[String], payload: &str) -> usize {
    if rooms.is_empty() {
        return 0;
    }

    let mut delivered = 0;
    for client in sessions.iter() {
        // Don't send the message back to its sender
        if client.id == sender_id || !client.shares_room(rooms) {
            continue;
        }
        if client.send_text(payload) {
            delivered += 1;
        }
    }

    log::trace!("Published to {} clients in {:?}", delivered, rooms);
    delivered
}

/// Public profiles of every other named client sharing a room with `client_id`
pub fn roommates(sessions: &SessionManager, client_id: &str) -> Vec<PublicProfile> {
    let Some(client) = sessions.get(client_id) else {
        return Vec::new();
    };

    sessions
        .iter()
        .filter(|mate| mate.id != client_id && mate.shares_room(&client.rooms))
        .filter_map(|mate| mate.profile())
        .collect()
}
