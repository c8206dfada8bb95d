//! UseCase: 一時停止状態の変更

use std::sync::Arc;

use crate::domain::{Identity, PlaybackSnapshot, PlaybackUpdate, RoomStore, SyncMessage, Timestamp};

use super::{SyncFanout, error::SyncError};

/// ルームの一時停止 / 再開を記録して通知するユースケース
pub struct UpdatePauseUseCase {
    store: Arc<dyn RoomStore>,
    fanout: Arc<SyncFanout>,
}

impl UpdatePauseUseCase {
    pub fn new(store: Arc<dyn RoomStore>, fanout: Arc<SyncFanout>) -> Self {
        Self { store, fanout }
    }

    /// 位置とアイテムは保持したまま一時停止状態を更新し、送信者以外に通知する
    pub async fn execute(
        &self,
        identity: Identity,
        paused: bool,
        timestamp: i64,
    ) -> Result<PlaybackSnapshot, SyncError> {
        let Identity { user_id, room_id } = identity;
        let update = PlaybackUpdate::pause(paused, Timestamp::new(timestamp))?;
        let snapshot = self.store.upsert_playback_snapshot(room_id, update).await?;

        self.fanout
            .broadcast(
                room_id,
                &SyncMessage::update_pause(room_id, user_id, &snapshot),
                &[user_id],
            )
            .await;

        Ok(snapshot)
    }
}
