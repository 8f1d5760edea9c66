//! Room allocator
//!
//! Packs named clients into rooms of up to three. A joining client always
//! completes an almost-full room before a half-empty one, and a new room is
//! only opened when no partially filled room is eligible.

use rand::Rng;
use serde::Serialize;

use crate::constants::{MAX_ROOM_ID_ATTEMPTS, ROOM_ID_PATTERN};
use crate::core::connection::Connection;
use crate::core::tiers::{RoomTiers, Tier};
use crate::error::{Result, TriadError};

/// Aggregate counters exposed to stats and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoomCounts {
    /// Rooms with at least one occupant
    pub rooms: usize,
    /// Client memberships; one per client between shuffles
    pub users: usize,
    /// Shuffles performed since start
    pub laps: u64,
}

/// Result of a successful subscribe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub room: String,
    /// Tier of the room after the client joined
    pub tier: Tier,
    /// True when the room already had occupants
    pub joined_existing: bool,
}

/// Manages the tier lists and counters for every active room
#[derive(Debug, Default)]
pub struct RoomManager {
    tiers: RoomTiers,
    counts: RoomCounts,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign one room to `client` and record it in `client.rooms`
    pub fn subscribe(&mut self, client: &mut Connection) -> Result<Assignment> {
        let held = &client.rooms;
        let existing = self
            .tiers
            .first_eligible(Tier::Two, |room| !held.iter().any(|r| r == room))
            .or_else(|| {
                self.tiers
                    .first_eligible(Tier::One, |room| !held.iter().any(|r| r == room))
            })
            .cloned();

        let joined_existing = existing.is_some();
        let room = match existing {
            Some(room) => room,
            None => {
                let room = self.generate_room_id()?;
                self.counts.rooms += 1;
                room
            }
        };

        let tier = self.promote(&room);
        client.rooms.push(room.clone());
        self.counts.users += 1;

        log::debug!(
            "Client {} subscribed to room {} ({} occupants)",
            client.id,
            room,
            tier.occupants()
        );

        Ok(Assignment {
            room,
            tier,
            joined_existing,
        })
    }

    /// Release every room `client` holds
    pub fn unsubscribe(&mut self, client: &mut Connection) {
        let released = client.rooms.len();
        for room in client.rooms.drain(..) {
            self.degrade(&room);
        }
        self.counts.users = self.counts.users.saturating_sub(released);
    }

    /// Move a room up one tier after a join
    pub fn promote(&mut self, room: &str) -> Tier {
        self.tiers.promote(room)
    }

    /// Move a room down one tier after a departure, deleting it when empty
    pub fn degrade(&mut self, room: &str) {
        let was_present = self.tiers.contains(room);
        if self.tiers.degrade(room).is_none() && was_present {
            self.counts.rooms = self.counts.rooms.saturating_sub(1);
            log::debug!("Room {} closed", room);
        }
    }

    /// Drop every room and zero the room/user counters; laps are kept
    pub fn clear(&mut self) {
        self.tiers.clear();
        self.counts.rooms = 0;
        self.counts.users = 0;
    }

    pub fn record_lap(&mut self) -> u64 {
        self.counts.laps += 1;
        self.counts.laps
    }

    pub fn counts(&self) -> RoomCounts {
        self.counts
    }

    pub fn tiers(&self) -> &RoomTiers {
        &self.tiers
    }

    pub fn tier_of(&self, room: &str) -> Option<Tier> {
        self.tiers.tier_of(room)
    }

    // Random upper-case hex id, retried until it does not clash with a live room
    fn generate_room_id(&self) -> Result<String> {
        let mut rng = rand::thread_rng();
        for _ in 0..MAX_ROOM_ID_ATTEMPTS {
            let id: String = ROOM_ID_PATTERN
                .chars()
                .map(|c| {
                    let r: u32 = rng.gen_range(0..16);
                    let v = if c == 'x' { r } else { (r & 0x3) | 0x8 };
                    // v < 16 so the digit always exists
                    std::char::from_digit(v, 16).unwrap_or('0').to_ascii_uppercase()
                })
                .collect();
            if !self.tiers.contains(&id) {
                return Ok(id);
            }
        }
        log::error!("Exhausted {} attempts generating a room id", MAX_ROOM_ID_ATTEMPTS);
        Err(TriadError::NoCapacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn client(id: &str) -> Connection {
        let (tx, _rx) = mpsc::unbounded_channel();
        Connection::with_id(id.to_string(), tx)
    }

    #[test]
    fn test_room_id_shape() {
        let manager = RoomManager::new();
        let id = manager.generate_room_id().unwrap();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        // 'y' positions carry the 10xx variant bits
        for pos in [8, 12] {
            let digit = id.chars().nth(pos).unwrap().to_digit(16).unwrap();
            assert!((8..=11).contains(&digit));
        }
    }

    #[test]
    fn test_client_cannot_rejoin_own_room() {
        let mut manager = RoomManager::new();
        let mut x = client("x");
        let first = manager.subscribe(&mut x).unwrap();
        let second = manager.subscribe(&mut x).unwrap();
        assert_ne!(first.room, second.room);
        assert!(!second.joined_existing);
        assert_eq!(manager.counts().rooms, 2);
    }

    #[test]
    fn test_unsubscribe_without_rooms_is_noop() {
        let mut manager = RoomManager::new();
        let mut x = client("x");
        manager.unsubscribe(&mut x);
        assert_eq!(manager.counts(), RoomCounts::default());
    }

    #[test]
    fn test_degrade_unknown_room_keeps_counters() {
        let mut manager = RoomManager::new();
        let mut x = client("x");
        manager.subscribe(&mut x).unwrap();
        manager.degrade("NOT-A-ROOM");
        assert_eq!(manager.counts().rooms, 1);
    }

    #[test]
    fn test_clear_keeps_laps() {
        let mut manager = RoomManager::new();
        let mut x = client("x");
        manager.subscribe(&mut x).unwrap();
        manager.record_lap();
        manager.clear();
        let counts = manager.counts();
        assert_eq!((counts.rooms, counts.users, counts.laps), (0, 0, 1));
        assert_eq!(manager.tiers().room_count(), 0);
    }
}
