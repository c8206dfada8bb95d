//! Real-time playback synchronization server.
//!
//! Keeps every member of a room on the same playback position by fanning out
//! sync events over WebSocket or Server-Sent Events.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
