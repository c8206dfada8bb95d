//! UseCase: 同期メッセージのファンアウト
//!
//! ハンドラとユースケースが使う唯一の配信口。起動時に選ばれたアダプタへ委譲し、
//! アダプタが未設定なら何もしない（`list_members` は空集合を返す）。

use std::{collections::BTreeSet, sync::Arc};

use tokio::sync::RwLock;

use crate::domain::{RoomId, SyncAdapter, SyncMessage, SyncProtocol, UserId};

/// 有効なアダプタへ配信を委譲するファサード
#[derive(Default)]
pub struct SyncFanout {
    adapter: RwLock<Option<Arc<dyn SyncAdapter>>>,
}

impl SyncFanout {
    /// アダプタ未設定の SyncFanout を作成
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adapter(adapter: Arc<dyn SyncAdapter>) -> Self {
        Self {
            adapter: RwLock::new(Some(adapter)),
        }
    }

    /// アダプタを差し替え、以前のアダプタを返す
    ///
    /// 以前のアダプタの接続は移行しない。必要なら呼び出し側で `stop` すること。
    pub async fn set_adapter(&self, adapter: Arc<dyn SyncAdapter>) -> Option<Arc<dyn SyncAdapter>> {
        let previous = self.adapter.write().await.replace(adapter.clone());
        tracing::info!("Sync adapter set to {}", adapter.protocol());
        previous
    }

    /// 現在のアダプタ
    pub async fn active(&self) -> Option<Arc<dyn SyncAdapter>> {
        self.adapter.read().await.clone()
    }

    pub async fn protocol(&self) -> Option<SyncProtocol> {
        self.active().await.map(|adapter| adapter.protocol())
    }

    pub async fn broadcast(&self, room_id: RoomId, message: &SyncMessage, excluded: &[UserId]) {
        match self.active().await {
            Some(adapter) => adapter.broadcast(room_id, message, excluded).await,
            None => tracing::debug!("No sync adapter, dropping '{}' broadcast", message.kind),
        }
    }

    pub async fn send_to_users(&self, room_id: RoomId, user_ids: &[UserId], message: &SyncMessage) {
        match self.active().await {
            Some(adapter) => adapter.send_to_users(room_id, user_ids, message).await,
            None => tracing::debug!("No sync adapter, dropping '{}' message", message.kind),
        }
    }

    pub async fn list_members(&self, room_id: RoomId) -> BTreeSet<UserId> {
        match self.active().await {
            Some(adapter) => adapter.list_members(room_id).await,
            None => BTreeSet::new(),
        }
    }

    /// 有効なアダプタを停止し、全接続を閉じる
    pub async fn stop(&self) {
        if let Some(adapter) = self.active().await {
            adapter.stop().await;
        }
    }
}
