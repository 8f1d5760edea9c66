//! Room capacity tiers
//!
//! Rooms are not stored as objects. A room exists while its id sits in
//! exactly one of three ordered lists, one per occupant count.

use serde::Serialize;

use crate::constants::ROOM_CAPACITY;

/// Occupancy class of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Tier {
    One,
    Two,
    Three,
}

impl Tier {
    pub fn occupants(self) -> usize {
        match self {
            Tier::One => 1,
            Tier::Two => 2,
            Tier::Three => ROOM_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RoomTiers {
    one: Vec<String>,
    two: Vec<String>,
    three: Vec<String>,
}

impl RoomTiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tier_of(&self, room: &str) -> Option<Tier> {
        if self.one.iter().any(|r| r == room) {
            Some(Tier::One)
        } else if self.two.iter().any(|r| r == room) {
            Some(Tier::Two)
        } else if self.three.iter().any(|r| r == room) {
            Some(Tier::Three)
        } else {
            None
        }
    }

    pub fn contains(&self, room: &str) -> bool {
        self.tier_of(room).is_some()
    }

    pub fn rooms(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::One => &self.one,
            Tier::Two => &self.two,
            Tier::Three => &self.three,
        }
    }

    /// First room in `tier` accepted by `eligible`, in insertion order
    pub fn first_eligible<F>(&self, tier: Tier, eligible: F) -> Option<&String>
    where
        F: Fn(&str) -> bool,
    {
        self.rooms(tier).iter().find(|room| eligible(room.as_str()))
    }

    /// Move a room one tier up; an unknown room enters tier one.
    /// Returns the tier the room ends up in.
    pub fn promote(&mut self, room: &str) -> Tier {
        if take(&mut self.one, room) {
            self.two.push(room.to_string());
            Tier::Two
        } else if take(&mut self.two, room) {
            self.three.push(room.to_string());
            Tier::Three
        } else if self.three.iter().any(|r| r == room) {
            // already full, nothing above tier three
            Tier::Three
        } else {
            self.one.push(room.to_string());
            Tier::One
        }
    }

    /// Move a room one tier down; a tier-one room is deleted.
    /// Returns the new tier, `None` when the room no longer exists.
    pub fn degrade(&mut self, room: &str) -> Option<Tier> {
        if take(&mut self.one, room) {
            None
        } else if take(&mut self.two, room) {
            self.one.push(room.to_string());
            Some(Tier::One)
        } else if take(&mut self.three, room) {
            self.two.push(room.to_string());
            Some(Tier::Two)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.one.clear();
        self.two.clear();
        self.three.clear();
    }

    /// Number of rooms across all tiers
    pub fn room_count(&self) -> usize {
        self.one.len() + self.two.len() + self.three.len()
    }

    /// Sum of occupant counts across all tiers
    pub fn occupant_count(&self) -> usize {
        self.one.len() + 2 * self.two.len() + 3 * self.three.len()
    }
}

fn take(list: &mut Vec<String>, room: &str) -> bool {
    match list.iter().position(|r| r == room) {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}
