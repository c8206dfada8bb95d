//! Server-Sent Events を使った SyncAdapter 実装
//!
//! ## 責務
//!
//! - 接続時のクエリで受け取った (room, user) を即座に登録する
//! - 接続ごとの配信タスクで、次の 3 つのうち先に起きたものを待つ
//!   - ハートビートのタイマー（コメント行だけのイベントでアイドル切断を防ぐ）
//!   - クライアントの切断（レスポンスボディのストリームが破棄される）
//!   - サーバー側からのクローズ要求、または再接続による置き換え
//! - どの経路で終わっても、登録解除とオフライン更新は 1 回だけ
//!
//! ## ワイヤ形式
//!
//! `data: {"type": <tag>, "data": <同期メッセージ全体>}\n\n`

use std::{
    collections::BTreeSet,
    convert::Infallible,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    task::{Context, Poll},
    time::Duration,
};

use async_trait::async_trait;
use axum::response::sse::Event;
use futures_util::{Stream, StreamExt, stream};
use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    domain::{
        ConnectionId, Identity, RoomId, RoomStore, SyncAdapter, SyncMessage, SyncProtocol,
        TransportError, UserId,
    },
    infrastructure::{
        dto::sse::SseEnvelope,
        registry::{ConnectionHandle, ConnectionRegistry, Outbound},
    },
};

use super::{deliver, mark_offline, mark_online, release_all};

const PROTOCOL: SyncProtocol = SyncProtocol::Sse;

/// レスポンスボディへ流す 1 イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// `data:` 行のイベント（エンコード済み JSON）
    Data(String),
    /// コメント行だけのハートビート
    Heartbeat,
}

impl SseFrame {
    pub fn into_event(self) -> Event {
        match self {
            Self::Data(data) => Event::default().data(data),
            Self::Heartbeat => Event::default().comment(""),
        }
    }
}

/// 1 接続分のイベントストリーム
///
/// 破棄されると配信タスクがクライアント切断として後始末する。
#[derive(Debug)]
pub struct SseStream {
    frames: mpsc::UnboundedReceiver<SseFrame>,
}

impl Stream for SseStream {
    type Item = SseFrame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.frames.poll_recv(cx)
    }
}

/// axum の `Sse` にそのまま渡せるストリーム
pub type SseEventStream = stream::Map<SseStream, fn(SseFrame) -> Result<Event, Infallible>>;

fn into_event(frame: SseFrame) -> Result<Event, Infallible> {
    Ok(frame.into_event())
}

/// Server-Sent Events を使った SyncAdapter 実装
pub struct SseAdapter {
    registry: ConnectionRegistry,
    store: Arc<dyn RoomStore>,
    running: AtomicBool,
    heartbeat_interval: Duration,
}

impl SseAdapter {
    pub fn new(store: Arc<dyn RoomStore>, heartbeat_interval: Duration) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            store,
            running: AtomicBool::new(false),
            heartbeat_interval,
        }
    }

    /// このアダプタの接続レジストリ
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// 接続を開き、axum の `Sse` に渡すイベントストリームを返す
    pub async fn connect(self: &Arc<Self>, identity: Identity) -> SseEventStream {
        self.open(identity)
            .await
            .map(into_event as fn(SseFrame) -> Result<Event, Infallible>)
    }

    /// 接続を開いて登録し、配信タスクを起動する
    ///
    /// 返されたストリームが破棄されるとクライアント切断として扱われる。
    pub async fn open(self: &Arc<Self>, identity: Identity) -> SseStream {
        let Identity { user_id, room_id } = identity;
        let (handle, outbound) = ConnectionHandle::channel();
        let connection_id = handle.id();

        mark_online(self.store.as_ref(), room_id, user_id).await;
        self.registry.register(room_id, user_id, handle.clone()).await;
        tracing::info!(
            "User {} connected to room {} using SSE ({})",
            user_id,
            room_id,
            connection_id
        );

        if let Some(frame) = encode(&SyncMessage::connected()) {
            if let Err(e) = handle.push(frame) {
                tracing::warn!("Failed to send connected event on {}: {}", connection_id, e);
            }
        }
        // 以降はレジストリだけが送信側を持つ。置き換えや drain で受信側が閉じる。
        drop(handle);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let adapter = self.clone();
        tokio::spawn(async move {
            adapter
                .serve_connection(identity, connection_id, outbound, events_tx)
                .await;
        });

        SseStream { frames: events_rx }
    }

    async fn serve_connection(
        &self,
        identity: Identity,
        connection_id: ConnectionId,
        mut outbound: mpsc::UnboundedReceiver<Outbound>,
        events: mpsc::UnboundedSender<SseFrame>,
    ) {
        let mut heartbeat = tokio::time::interval_at(
            Instant::now() + self.heartbeat_interval,
            self.heartbeat_interval,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                _ = events.closed() => break "client disconnected",
                next = outbound.recv() => match next {
                    Some(Outbound::Frame(data)) => {
                        if events.send(SseFrame::Data(data)).is_err() {
                            break "client disconnected";
                        }
                    }
                    Some(Outbound::Close) => break "closed by server",
                    None => break "connection released",
                },
                _ = heartbeat.tick() => {
                    if events.send(SseFrame::Heartbeat).is_err() {
                        break "client disconnected";
                    }
                }
            }
        };
        tracing::debug!("SSE connection {} ended: {}", connection_id, reason);

        let Identity { user_id, room_id } = identity;
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

fn encode(message: &SyncMessage) -> Option<String> {
    serde_json::to_string(&SseEnvelope::from(message))
        .inspect_err(|e| tracing::error!("Failed to encode '{}' event: {}", message.kind, e))
        .ok()
}

#[async_trait]
impl SyncAdapter for SseAdapter {
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
            "Broadcasted '{}' to {} SSE connection(s) in room {}",
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
            tracing::info!("SSE adapter started");
        }
        Ok(())
    }

    async fn stop(&self) {
        let released = release_all(PROTOCOL, &self.registry, self.store.as_ref()).await;
        if self.running.swap(false, Ordering::SeqCst) || released > 0 {
            tracing::info!("SSE adapter stopped, closed {} connection(s)", released);
        }
    }

    fn protocol(&self) -> SyncProtocol {
        PROTOCOL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::domain::{PlaybackSnapshot, PlaybackUpdate, RepositoryError};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 接続時の登録・オンライン化・connected イベント
    // - ハートビート、配信、切断時の後始末
    //
    // 【なぜこのテストが必要か】
    // - 切断・タイムアウト・サーバー側のクローズが重なっても
    //   オフライン更新が 1 回だけであることを保証する必要がある
    // ========================================

    /// オンライン / オフライン更新の回数を数えるストア
    #[derive(Default)]
    struct CountingStore {
        online: AtomicUsize,
        offline: AtomicUsize,
    }

    #[async_trait]
    impl RoomStore for CountingStore {
        async fn set_member_online(
            &self,
            _room_id: RoomId,
            _user_id: UserId,
            online: bool,
        ) -> Result<(), RepositoryError> {
            let counter = if online { &self.online } else { &self.offline };
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn get_playback_snapshot(
            &self,
            _room_id: RoomId,
        ) -> Result<Option<PlaybackSnapshot>, RepositoryError> {
            Ok(None)
        }

        async fn upsert_playback_snapshot(
            &self,
            _room_id: RoomId,
            update: PlaybackUpdate,
        ) -> Result<PlaybackSnapshot, RepositoryError> {
            Ok(update.apply(None))
        }
    }

    fn identity(user_id: u64, room_id: u64) -> Identity {
        Identity {
            user_id: UserId::new(user_id).unwrap(),
            room_id: RoomId::new(room_id).unwrap(),
        }
    }

    fn envelope(frame: SseFrame) -> SseEnvelope {
        match frame {
            SseFrame::Data(data) => serde_json::from_str(&data).unwrap(),
            SseFrame::Heartbeat => panic!("expected a data frame, got a heartbeat"),
        }
    }

    /// 配信タスクが後始末を終えるまで待つ
    async fn wait_until_offline(store: &CountingStore, expected: usize) {
        for _ in 0..100 {
            if store.offline.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn adapter_with(store: Arc<CountingStore>, heartbeat: Duration) -> Arc<SseAdapter> {
        Arc::new(SseAdapter::new(store, heartbeat))
    }

    #[tokio::test]
    async fn test_open_registers_and_sends_connected() {
        // テスト項目: 接続するとオンライン化・登録され、最初に connected イベントが届く
        // given (前提条件):
        let store = Arc::new(CountingStore::default());
        let adapter = adapter_with(store.clone(), Duration::from_secs(30));

        // when (操作):
        let mut frames = adapter.open(identity(1, 7)).await;
        let first = frames.next().await.unwrap();

        // then (期待する結果):
        let first = envelope(first);
        assert_eq!(first.kind, "connected");
        assert_eq!(first.data, SyncMessage::connected());
        assert_eq!(store.online.load(Ordering::SeqCst), 1);
        assert_eq!(
            adapter.list_members(RoomId::new(7).unwrap()).await,
            BTreeSet::from([UserId::new(1).unwrap()])
        );
    }

    #[tokio::test]
    async fn test_broadcast_wraps_message_in_envelope() {
        // テスト項目: 配信されるイベント本文は {type, data} で data は同期メッセージ全体
        // given (前提条件):
        let adapter = adapter_with(Arc::new(CountingStore::default()), Duration::from_secs(30));
        let mut a = adapter.open(identity(1, 7)).await;
        let mut b = adapter.open(identity(2, 7)).await;
        a.next().await.unwrap();
        b.next().await.unwrap();
        let message = SyncMessage::new("updatePause", Some(serde_json::json!({"paused": true})));

        // when (操作):
        adapter
            .broadcast(RoomId::new(7).unwrap(), &message, &[UserId::new(1).unwrap()])
            .await;
        adapter
            .send_to_users(
                RoomId::new(7).unwrap(),
                &[UserId::new(1).unwrap()],
                &SyncMessage::update_playlist(),
            )
            .await;

        // then (期待する結果):
        let received_b = envelope(b.next().await.unwrap());
        assert_eq!(received_b.kind, "updatePause");
        assert_eq!(received_b.data, message);
        // A には除外されたブロードキャストは届かず、個別送信だけが届く
        let received_a = envelope(a.next().await.unwrap());
        assert_eq!(received_a.kind, "updatePlaylist");
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_is_emitted_on_interval() {
        // テスト項目: 無通信のときハートビート（コメント行）が間隔ごとに流れる
        // given (前提条件):
        let adapter = adapter_with(Arc::new(CountingStore::default()), Duration::from_secs(30));
        let mut frames = adapter.open(identity(1, 7)).await;
        frames.next().await.unwrap();

        // when (操作):
        let next = frames.next().await;

        // then (期待する結果):
        assert_eq!(next, Some(SseFrame::Heartbeat));
    }

    #[tokio::test]
    async fn test_client_disconnect_unregisters_once() {
        // テスト項目: クライアントが切断すると登録解除・オフライン更新が 1 回だけ行われる
        // given (前提条件):
        let store = Arc::new(CountingStore::default());
        let adapter = adapter_with(store.clone(), Duration::from_millis(10));
        let frames = adapter.open(identity(1, 7)).await;

        // when (操作):
        drop(frames);
        wait_until_offline(&store, 1).await;
        // ハートビートのタイマーが何度発火しても後始末は繰り返されない
        tokio::time::sleep(Duration::from_millis(50)).await;

        // then (期待する結果):
        assert_eq!(store.offline.load(Ordering::SeqCst), 1);
        assert!(adapter.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_stop_ends_streams_and_marks_offline_once() {
        // テスト項目: stop で全ストリームが終わり、オフライン更新は接続ごとに 1 回だけ
        // given (前提条件):
        let store = Arc::new(CountingStore::default());
        let adapter = adapter_with(store.clone(), Duration::from_secs(30));
        adapter.start().await.unwrap();
        let mut a = adapter.open(identity(1, 7)).await;
        let mut b = adapter.open(identity(2, 8)).await;
        a.next().await.unwrap();
        b.next().await.unwrap();

        // when (操作):
        adapter.stop().await;

        // then (期待する結果):
        assert_eq!(a.next().await, None);
        assert_eq!(b.next().await, None);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.offline.load(Ordering::SeqCst), 2);
        assert!(adapter.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_reconnect_supersedes_old_stream_without_going_offline() {
        // テスト項目: 同じユーザーの再接続で古いストリームは終わるが、オフラインにはならない
        // given (前提条件):
        let store = Arc::new(CountingStore::default());
        let adapter = adapter_with(store.clone(), Duration::from_secs(30));
        let mut old = adapter.open(identity(1, 7)).await;
        old.next().await.unwrap();

        // when (操作):
        let mut new = adapter.open(identity(1, 7)).await;
        new.next().await.unwrap();

        // then (期待する結果):
        assert_eq!(old.next().await, None);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.offline.load(Ordering::SeqCst), 0);
        assert_eq!(
            adapter.list_members(RoomId::new(7).unwrap()).await,
            BTreeSet::from([UserId::new(1).unwrap()])
        );
    }
}
