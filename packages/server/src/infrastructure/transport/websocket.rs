//! WebSocket を使った SyncAdapter 実装
//!
//! ## 責務
//!
//! - アップグレード済みの WebSocket 接続ごとに読み取りループと書き込みループを回す
//! - `auth` 制御フレームで (room, user) をバインドし、レジストリへ登録
//! - ルーム単位の配信（broadcast, send_to_users）
//!
//! ## 設計ノート
//!
//! WebSocket のアップグレードは UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装はアップグレード後のソケットを受け取り、接続の寿命を管理します。
//!
//! `auth` フレームを受け取るまで接続はどこにも登録されず、何も受信できない。
//! バインドは一度だけで、署名の検証は行わない（識別子を発行した層を信頼する）。

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use std::collections::BTreeSet;
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, Identity, RoomId, RoomStore, SyncAdapter, SyncMessage, SyncProtocol,
        TransportError, UserId,
    },
    infrastructure::{
        dto::websocket::{AUTH_FRAME, AuthPayload},
        registry::{ConnectionHandle, ConnectionRegistry, Outbound},
    },
};

use super::{deliver, mark_offline, mark_online, release_all};

const PROTOCOL: SyncProtocol = SyncProtocol::WebSocket;

/// WebSocket を使った SyncAdapter 実装
pub struct WebSocketAdapter {
    registry: ConnectionRegistry,
    store: Arc<dyn RoomStore>,
    running: AtomicBool,
}

impl WebSocketAdapter {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            store,
            running: AtomicBool::new(false),
        }
    }

    /// このアダプタの接続レジストリ
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// アップグレード済みのソケットを接続が閉じるまで処理する
    pub async fn serve(self: Arc<Self>, socket: WebSocket) {
        let (handle, rx) = ConnectionHandle::channel();
        let connection_id = handle.id();
        let (sender, mut receiver) = socket.split();
        tracing::info!(
            "WebSocket connection {} opened, awaiting auth",
            connection_id
        );

        let adapter = self.clone();
        let mut recv_task = tokio::spawn(async move {
            let mut binding = None;
            while let Some(msg) = receiver.next().await {
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::debug!("WebSocket error on {}: {}", handle.id(), e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => {
                        adapter
                            .handle_text(text.as_str(), &handle, &mut binding)
                            .await;
                    }
                    Message::Close(_) => {
                        tracing::debug!("Connection {} requested close", handle.id());
                        break;
                    }
                    // Ping/pong is handled automatically by the WebSocket protocol
                    _ => {}
                }
            }
        });

        let mut send_task = pusher_loop(rx, sender);

        // If any one of the tasks completes, abort the other
        tokio::select! {
            _ = &mut recv_task => send_task.abort(),
            _ = &mut send_task => recv_task.abort(),
        };

        self.release(connection_id).await;
    }

    /// 受信したテキストフレームを処理する
    ///
    /// - 未バインドの `auth` フレーム: 識別子をバインドする
    /// - バインド済みのそれ以外のフレーム: ルームの他メンバーへ中継する
    /// - 不正なフレーム: 黙って捨てる（接続は開いたまま）
    pub(crate) async fn handle_text(
        &self,
        text: &str,
        handle: &ConnectionHandle,
        binding: &mut Option<Identity>,
    ) {
        let frame = match serde_json::from_str::<SyncMessage>(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("Dropping malformed frame on {}: {}", handle.id(), e);
                return;
            }
        };

        if frame.kind == AUTH_FRAME {
            if binding.is_some() {
                tracing::debug!("Ignoring repeated auth frame on {}", handle.id());
                return;
            }
            let identity = frame
                .payload
                .and_then(|payload| serde_json::from_value::<AuthPayload>(payload).ok())
                .and_then(|payload| Identity::try_from(payload).ok());
            match identity {
                Some(identity) => {
                    self.bind(identity, handle.clone()).await;
                    *binding = Some(identity);
                }
                None => tracing::debug!("Dropping auth frame with invalid payload on {}", handle.id()),
            }
            return;
        }

        match binding {
            Some(identity) => {
                tracing::debug!(
                    "Relaying '{}' from user {} to room {}",
                    frame.kind,
                    identity.user_id,
                    identity.room_id
                );
                self.broadcast(identity.room_id, &frame, &[identity.user_id])
                    .await;
            }
            None => tracing::debug!(
                "Dropping '{}' frame from unbound connection {}",
                frame.kind,
                handle.id()
            ),
        }
    }

    async fn bind(&self, identity: Identity, handle: ConnectionHandle) {
        let Identity { user_id, room_id } = identity;
        self.registry.register(room_id, user_id, handle.clone()).await;
        mark_online(self.store.as_ref(), room_id, user_id).await;
        tracing::info!(
            "User {} connected to room {} over WebSocket ({})",
            user_id,
            room_id,
            handle.id()
        );

        if let Some(frame) = encode(&SyncMessage::connected()) {
            if let Err(e) = handle.push(frame) {
                tracing::warn!("Failed to acknowledge auth on {}: {}", handle.id(), e);
            }
        }
    }

    /// 接続終了時の後始末
    ///
    /// 置き換え済み・未バインドの接続なら何もしない。
    async fn release(&self, connection_id: ConnectionId) {
        let Some((room_id, user_id)) = self.registry.find_owner(connection_id).await else {
            tracing::debug!("Connection {} closed without a live binding", connection_id);
            return;
        };

        if self
            .registry
            .unregister_connection(room_id, user_id, connection_id)
            .await
        {
            mark_offline(self.store.as_ref(), room_id, user_id).await;
            tracing::info!("User {} disconnected from room {}", user_id, room_id);
        }
    }
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// The task ends when a close is requested, the channel is closed, or a write fails.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            match outbound {
                Outbound::Frame(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    })
}

/// サーバー → クライアントのフレームは同期メッセージの JSON そのもの
fn encode(message: &SyncMessage) -> Option<String> {
    serde_json::to_string(message)
        .inspect_err(|e| tracing::error!("Failed to encode '{}' message: {}", message.kind, e))
        .ok()
}

#[async_trait]
impl SyncAdapter for WebSocketAdapter {
    async fn broadcast(&self, room_id: RoomId, message: &SyncMessage, excluded: &[UserId]) {
        let Some(frame) = encode(message) else {
            return;
        };
        let targets = self
            .registry
            .targets(room_id, |user_id| !excluded.contains(&user_id))
            .await;
        let delivered = deliver(PROTOCOL, room_id, targets, &frame);
        tracing::debug!(
            "Broadcasted '{}' to {} connection(s) in room {}",
            message.kind,
            delivered,
            room_id
        );
    }

    async fn send_to_users(&self, room_id: RoomId, user_ids: &[UserId], message: &SyncMessage) {
        let Some(frame) = encode(message) else {
            return;
        };
        let targets = self
            .registry
            .targets(room_id, |user_id| user_ids.contains(&user_id))
            .await;
        deliver(PROTOCOL, room_id, targets, &frame);
    }

    async fn list_members(&self, room_id: RoomId) -> BTreeSet<UserId> {
        self.registry.members_of(room_id).await
    }

    async fn start(&self) -> Result<(), TransportError> {
        if !self.running.swap(true, Ordering::SeqCst) {
            tracing::info!("WebSocket adapter started");
        }
        Ok(())
    }

    async fn stop(&self) {
        let released = release_all(PROTOCOL, &self.registry, self.store.as_ref()).await;
        if self.running.swap(false, Ordering::SeqCst) || released > 0 {
            tracing::info!(
                "WebSocket adapter stopped, closed {} connection(s)",
                released
            );
        }
    }

    fn protocol(&self) -> SyncProtocol {
        PROTOCOL
    }
}
