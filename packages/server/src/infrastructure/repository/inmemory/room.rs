//! InMemory RoomStore 実装
//!
//! ドメイン層が定義する RoomStore trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! 本番ではリレーショナル DB のメンバーテーブルと再生状態テーブルが同じ役割を持つ。
//! プロセスを再起動するとすべての状態は失われる。

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    PlaybackSnapshot, PlaybackUpdate, RepositoryError, RoomId, RoomStore, UserId,
};

/// インメモリ RoomStore 実装
#[derive(Debug, Default)]
pub struct InMemoryRoomStore {
    /// ルームごとのオンラインメンバー
    online: RwLock<HashMap<RoomId, BTreeSet<UserId>>>,
    /// ルームごとの再生スナップショット
    snapshots: RwLock<HashMap<RoomId, PlaybackSnapshot>>,
}

impl InMemoryRoomStore {
    /// 新しい InMemoryRoomStore を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// メンバーがオンラインか
    pub async fn is_member_online(&self, room_id: RoomId, user_id: UserId) -> bool {
        self.online
            .read()
            .await
            .get(&room_id)
            .is_some_and(|members| members.contains(&user_id))
    }

    /// ルームのオンラインメンバー
    pub async fn online_members(&self, room_id: RoomId) -> BTreeSet<UserId> {
        self.online
            .read()
            .await
            .get(&room_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn set_member_online(
        &self,
        room_id: RoomId,
        user_id: UserId,
        online: bool,
    ) -> Result<(), RepositoryError> {
        let mut rooms = self.online.write().await;
        if online {
            rooms.entry(room_id).or_default().insert(user_id);
        } else if let Some(members) = rooms.get_mut(&room_id) {
            members.remove(&user_id);
            if members.is_empty() {
                rooms.remove(&room_id);
            }
        }
        Ok(())
    }

    async fn get_playback_snapshot(
        &self,
        room_id: RoomId,
    ) -> Result<Option<PlaybackSnapshot>, RepositoryError> {
        Ok(self.snapshots.read().await.get(&room_id).copied())
    }

    async fn upsert_playback_snapshot(
        &self,
        room_id: RoomId,
        update: PlaybackUpdate,
    ) -> Result<PlaybackSnapshot, RepositoryError> {
        let mut snapshots = self.snapshots.write().await;
        let snapshot = update.apply(snapshots.get(&room_id));
        snapshots.insert(room_id, snapshot);
        Ok(snapshot)
    }
}
