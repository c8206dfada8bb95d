//! トランスポートアダプタの実装
//!
//! ## 実装
//!
//! - `websocket`: 永続ソケット。接続後に `auth` フレームで識別子をバインドする
//! - `sse`: 単方向ストリーム。接続時のクエリで識別子を受け取る
//!
//! どちらのアダプタも自分専用の `ConnectionRegistry` を持つ。
//! プロセスで有効なアダプタは起動時に `build_transport` で 1 つだけ選ぶ。

pub mod sse;
pub mod websocket;

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{RoomId, RoomStore, SyncAdapter, SyncProtocol, TransportError, UserId},
    infrastructure::registry::{ConnectionHandle, ConnectionRegistry},
};

pub use sse::{SseAdapter, SseEventStream, SseFrame, SseStream};
pub use websocket::WebSocketAdapter;

/// SSE のハートビート間隔のデフォルト
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// アダプタ生成時のオプション
#[derive(Debug, Clone, Copy)]
pub struct TransportOptions {
    /// SSE のコメント行ハートビートの間隔
    pub heartbeat_interval: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

/// 起動時に選ばれた具体的なアダプタ
///
/// ルーティング（`/ws` か `/sse/connect` か）のために具体型を保持する。
/// それ以外の呼び出しは `adapter()` の trait オブジェクト経由で行う。
#[derive(Clone)]
pub enum ActiveTransport {
    WebSocket(Arc<WebSocketAdapter>),
    Sse(Arc<SseAdapter>),
}

impl ActiveTransport {
    pub fn adapter(&self) -> Arc<dyn SyncAdapter> {
        match self {
            Self::WebSocket(adapter) => adapter.clone(),
            Self::Sse(adapter) => adapter.clone(),
        }
    }

    pub fn protocol(&self) -> SyncProtocol {
        match self {
            Self::WebSocket(_) => SyncProtocol::WebSocket,
            Self::Sse(_) => SyncProtocol::Sse,
        }
    }
}

/// プロトコルに応じたアダプタを作成して起動する
pub async fn build_transport(
    protocol: SyncProtocol,
    store: Arc<dyn RoomStore>,
    options: TransportOptions,
) -> Result<ActiveTransport, TransportError> {
    tracing::info!("Creating adapter for protocol: {}", protocol);

    let transport = match protocol {
        SyncProtocol::WebSocket => ActiveTransport::WebSocket(Arc::new(WebSocketAdapter::new(store))),
        SyncProtocol::Sse => ActiveTransport::Sse(Arc::new(SseAdapter::new(
            store,
            options.heartbeat_interval,
        ))),
    };
    transport.adapter().start().await?;

    Ok(transport)
}

/// 配信対象のハンドルへエンコード済みフレームを送る
///
/// 1 接続の失敗は警告ログだけ残して次へ進む。戻り値は送信できた数。
fn deliver(
    protocol: SyncProtocol,
    room_id: RoomId,
    targets: Vec<(UserId, ConnectionHandle)>,
    frame: &str,
) -> usize {
    let mut delivered = 0;
    for (user_id, handle) in targets {
        match handle.push(frame.to_string()) {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(
                "Failed to push {} frame to user {} in room {}: {}",
                protocol,
                user_id,
                room_id,
                e
            ),
        }
    }
    delivered
}

/// 全接続を閉じてオフラインに更新し、レジストリを空にする
///
/// 個々の接続のエラーはログに残し、残りの接続の処理を続ける。
async fn release_all(
    protocol: SyncProtocol,
    registry: &ConnectionRegistry,
    store: &dyn RoomStore,
) -> usize {
    let connections = registry.drain().await;
    let count = connections.len();

    for connection in connections {
        if let Err(e) = connection.handle.close() {
            tracing::warn!(
                "Failed to close {} connection of user {} in room {}: {}",
                protocol,
                connection.user_id,
                connection.room_id,
                e
            );
        }
        if let Err(e) = store
            .set_member_online(connection.room_id, connection.user_id, false)
            .await
        {
            tracing::warn!(
                "Failed to mark user {} offline in room {}: {}",
                connection.user_id,
                connection.room_id,
                e
            );
        }
    }

    count
}

/// 接続終了時にメンバーをオフラインへ更新する（失敗はログのみ）
async fn mark_offline(store: &dyn RoomStore, room_id: RoomId, user_id: UserId) {
    if let Err(e) = store.set_member_online(room_id, user_id, false).await {
        tracing::warn!(
            "Failed to mark user {} offline in room {}: {}",
            user_id,
            room_id,
            e
        );
    }
}

/// 識別子バインド時にメンバーをオンラインへ更新する（失敗はログのみ）
async fn mark_online(store: &dyn RoomStore, room_id: RoomId, user_id: UserId) {
    if let Err(e) = store.set_member_online(room_id, user_id, true).await {
        tracing::warn!(
            "Failed to mark user {} online in room {}: {}",
            user_id,
            room_id,
            e
        );
    }
}
