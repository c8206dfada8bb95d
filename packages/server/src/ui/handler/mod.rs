//! HTTP / WebSocket / SSE handlers.

mod http;
mod sse;
mod websocket;

pub use http::{
    get_protocol, get_room_members, health_check, query_playback, switch_item, update_pause,
    update_time,
};
pub use sse::sse_handler;
pub use websocket::websocket_handler;
