//! Triad Chat - real-time chat that groups anonymous users into rooms of three
//!
//! This library provides the room allocator, the periodic shuffle, the
//! message filter and the room-aware delivery engine, plus the warp routes
//! that expose them over WebSocket.

pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;
pub mod security;

// Re-export main components
pub use config::*;
pub use constants::*;
