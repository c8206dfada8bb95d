//! Data Transfer Objects
//!
//! ワイヤ形式（HTTP / WebSocket / SSE）の型と、ドメインモデルとの変換。

pub mod conversion;
pub mod http;
pub mod sse;
pub mod websocket;
