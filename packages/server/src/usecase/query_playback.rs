//! UseCase: 現在の再生状態の問い合わせ

use std::sync::Arc;

use syncplay_shared::time::Clock;

use crate::domain::{PlaybackSnapshot, RoomId, RoomStore, Timestamp};

use super::error::SyncError;

/// 保存されたスナップショットを現在時刻まで外挿して返すユースケース
pub struct QueryPlaybackUseCase {
    store: Arc<dyn RoomStore>,
    clock: Arc<dyn Clock>,
}

impl QueryPlaybackUseCase {
    pub fn new(store: Arc<dyn RoomStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// # Errors
    ///
    /// スナップショットがまだないルームは `SyncError::SnapshotNotFound`
    pub async fn execute(&self, room_id: RoomId) -> Result<PlaybackSnapshot, SyncError> {
        let snapshot = self
            .store
            .get_playback_snapshot(room_id)
            .await?
            .ok_or(SyncError::SnapshotNotFound(room_id))?;

        Ok(snapshot.reconcile(Timestamp::new(self.clock.now_millis())))
    }
}
