//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::ServerConfig, infrastructure::transport::ActiveTransport};

use super::{
    handler::{
        get_protocol, get_room_members, health_check, query_playback, sse_handler, switch_item,
        update_pause, update_time, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Build the application router
///
/// 有効なトランスポートのエンドポイント（`/ws` または `/sse/connect`）だけを公開する。
pub fn router(state: Arc<AppState>) -> Router {
    let transport_routes = match &state.transport {
        ActiveTransport::WebSocket(_) => Router::new().route("/ws", get(websocket_handler)),
        ActiveTransport::Sse(_) => Router::new().route("/sse/connect", get(sse_handler)),
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/sync/updateTime", post(update_time))
        .route("/api/sync/updatePause", post(update_pause))
        .route("/api/sync/query", get(query_playback))
        .route("/api/sync/protocol", get(get_protocol))
        .route("/api/playlist/switch", post(switch_item))
        .route("/api/room/members", get(get_room_members))
        .merge(transport_routes)
        .with_state(state)
}

/// Playback sync server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(app_state, &config);
/// server.run(config.host.clone(), config.port).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    cors: CorsLayer,
    shutdown_timeout: Duration,
}

impl Server {
    /// Create a new Server instance
    pub fn new(state: AppState, config: &ServerConfig) -> Self {
        Self {
            state: Arc::new(state),
            cors: config.cors_layer(),
            shutdown_timeout: config.shutdown_timeout,
        }
    }

    /// Run the server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Sync server listening on {}", listener.local_addr()?);
        match &self.state.transport {
            ActiveTransport::WebSocket(_) => tracing::info!("Connect to: ws://{}/ws", bind_addr),
            ActiveTransport::Sse(_) => {
                tracing::info!("Connect to: http://{}/sse/connect", bind_addr)
            }
        }
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        let fanout = self.state.fanout.clone();
        let timeout = self.shutdown_timeout;
        self.serve(listener, shutdown_signal(fanout, timeout))
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state)
            .layer(self.cors)
            .layer(TraceLayer::new_for_http());

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
