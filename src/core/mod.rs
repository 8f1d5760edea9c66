//! Core functionality for the chat server

pub mod broadcast;
pub mod connection;
pub mod filter;
pub mod message_handler;
pub mod message_types;
pub mod private;
pub mod registration;
pub mod room;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod state;
pub mod tiers;

// Re-export main components for convenience
pub use connection::{ClientDetails, Connection, PublicProfile};
pub use filter::MessageFilter;
pub use message_handler::MessageHandler;
pub use message_types::{ClientMessage, ServerMessage};
pub use room::{Assignment, RoomCounts, RoomManager};
pub use server::{ChatServer, SharedChatServer};
pub use session::SessionManager;
pub use state::{ChatState, ServerStats};
pub use tiers::{RoomTiers, Tier};
