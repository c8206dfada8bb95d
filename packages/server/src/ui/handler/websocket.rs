//! WebSocket connection handler.
//!
//! 識別子はアップグレード後の `auth` フレームで受け取るため、ここでは検証しない。

use std::sync::Arc;

use axum::{
    extract::{State, ws::WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{infrastructure::transport::ActiveTransport, ui::state::AppState};

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let ActiveTransport::WebSocket(adapter) = &state.transport else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let adapter = adapter.clone();
    ws.on_upgrade(move |socket| adapter.serve(socket))
}
