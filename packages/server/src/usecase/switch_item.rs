//! UseCase: プレイリストアイテムの切り替え
//!
//! 切り替えの時刻はクライアントではなくサーバーの時計で打刻する。

use std::sync::Arc;

use syncplay_shared::time::Clock;

use crate::domain::{
    Identity, PlaybackSnapshot, PlaybackUpdate, RoomStore, SyncMessage, Timestamp,
    ValueObjectError,
};

use super::{SyncFanout, error::SyncError};

/// 再生中のアイテムを切り替え、ルームにプレイリストの再取得を促すユースケース
pub struct SwitchItemUseCase {
    store: Arc<dyn RoomStore>,
    fanout: Arc<SyncFanout>,
    clock: Arc<dyn Clock>,
}

impl SwitchItemUseCase {
    pub fn new(store: Arc<dyn RoomStore>, fanout: Arc<SyncFanout>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            fanout,
            clock,
        }
    }

    /// アイテムを切り替えて先頭から再生中にし、送信者以外に `updatePlaylist` を送る
    pub async fn execute(
        &self,
        identity: Identity,
        item_id: u64,
    ) -> Result<PlaybackSnapshot, SyncError> {
        if item_id == 0 {
            return Err(ValueObjectError::NonPositiveId("playlistItemId").into());
        }

        let Identity { user_id, room_id } = identity;
        let update = PlaybackUpdate::SwitchItem {
            item_id,
            timestamp: Timestamp::new(self.clock.now_millis()),
        };
        let snapshot = self.store.upsert_playback_snapshot(room_id, update).await?;
        tracing::info!(
            "User {} switched room {} to playlist item {}",
            user_id,
            room_id,
            item_id
        );

        self.fanout
            .broadcast(room_id, &SyncMessage::update_playlist(), &[user_id])
            .await;

        Ok(snapshot)
    }
}
