//! Graceful shutdown.

use std::{sync::Arc, time::Duration};

use crate::usecase::SyncFanout;

/// Ctrl+C / SIGTERM を待ち、有効なアダプタの全接続を閉じる
///
/// 長寿命の WebSocket / SSE 接続が残っていると axum の graceful shutdown が終わらないため、
/// axum に制御を返す前にアダプタを停止する。停止は `timeout` で打ち切る。
pub(super) async fn shutdown_signal(fanout: Arc<SyncFanout>, timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }

    if tokio::time::timeout(timeout, fanout.stop()).await.is_err() {
        tracing::warn!(
            "Closing sync connections did not finish within {:?}, continuing shutdown",
            timeout
        );
    }
}
