//! UseCase: 再生位置の再同期
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - UpdateTimeUseCase::execute() メソッド
//! - スナップショットの upsert と、送信者以外への `updateTime` ブロードキャスト
//!
//! ### どのような状況を想定しているか
//! - 正常系：一時停止中のルームでも報告された位置で再生中に戻る
//! - 異常系：負の位置、ストレージ障害（ブロードキャストしない）

use std::sync::Arc;

use crate::domain::{Identity, PlaybackSnapshot, PlaybackUpdate, RoomStore, SyncMessage, Timestamp};

use super::{SyncFanout, error::SyncError};

/// クライアントが報告した再生位置でルームを再同期するユースケース
pub struct UpdateTimeUseCase {
    store: Arc<dyn RoomStore>,
    fanout: Arc<SyncFanout>,
}

impl UpdateTimeUseCase {
    pub fn new(store: Arc<dyn RoomStore>, fanout: Arc<SyncFanout>) -> Self {
        Self { store, fanout }
    }

    /// 再同期を実行
    ///
    /// # Arguments
    ///
    /// * `identity` - 報告したクライアント（ブロードキャストから除外される）
    /// * `position` - 再生位置（秒）
    /// * `timestamp` - クライアントが位置を観測した時刻（Unix ミリ秒）
    /// * `item_id` - 再生中のプレイリストアイテム ID
    pub async fn execute(
        &self,
        identity: Identity,
        position: f64,
        timestamp: i64,
        item_id: u64,
    ) -> Result<PlaybackSnapshot, SyncError> {
        let Identity { user_id, room_id } = identity;
        let update = PlaybackUpdate::time(position, Timestamp::new(timestamp), item_id)?;
        let snapshot = self.store.upsert_playback_snapshot(room_id, update).await?;

        self.fanout
            .broadcast(
                room_id,
                &SyncMessage::update_time(room_id, user_id, &snapshot),
                &[user_id],
            )
            .await;

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockRoomStore, RepositoryError, RoomId, UserId, ValueObjectError, tag},
        infrastructure::repository::InMemoryRoomStore,
        usecase::testing::RecordingAdapter,
    };
    use mockall::predicate;

    fn identity() -> Identity {
        Identity {
            user_id: UserId::new(1).unwrap(),
            room_id: RoomId::new(7).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_update_time_resumes_and_broadcasts() {
        // テスト項目: 一時停止中でも再同期で再生中になり、送信者以外にブロードキャストされる
        // given (前提条件):
        let store = Arc::new(InMemoryRoomStore::new());
        store
            .upsert_playback_snapshot(
                identity().room_id,
                PlaybackUpdate::Pause {
                    paused: true,
                    timestamp: Timestamp::new(500),
                },
            )
            .await
            .unwrap();
        let adapter = Arc::new(RecordingAdapter::default());
        let usecase = UpdateTimeUseCase::new(store.clone(), Arc::new(SyncFanout::with_adapter(adapter.clone())));

        // when (操作):
        let snapshot = usecase.execute(identity(), 42.5, 1_000, 3).await.unwrap();

        // then (期待する結果):
        assert!(!snapshot.paused);
        assert_eq!(snapshot.position, 42.5);
        assert_eq!(snapshot.current_item_id, 3);

        let broadcasts = adapter.broadcasts().await;
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].room_id, identity().room_id);
        assert_eq!(broadcasts[0].excluded, vec![identity().user_id]);
        assert_eq!(broadcasts[0].message.kind, tag::UPDATE_TIME);
        assert_eq!(
            broadcasts[0].message.payload,
            Some(serde_json::json!({
                "roomId": 7,
                "userId": 1,
                "paused": false,
                "time": 42.5,
                "timestamp": 1_000,
                "videoId": 3,
            }))
        );
    }

    #[tokio::test]
    async fn test_negative_position_is_rejected_without_side_effects() {
        // テスト項目: 負の位置は InvalidInput になり、保存もブロードキャストもされない
        // given (前提条件):
        let store = Arc::new(InMemoryRoomStore::new());
        let adapter = Arc::new(RecordingAdapter::default());
        let usecase = UpdateTimeUseCase::new(store.clone(), Arc::new(SyncFanout::with_adapter(adapter.clone())));

        // when (操作):
        let result = usecase.execute(identity(), -1.0, 1_000, 3).await;

        // then (期待する結果):
        assert_eq!(result, Err(SyncError::InvalidInput(ValueObjectError::InvalidPosition)));
        assert_eq!(store.get_playback_snapshot(identity().room_id).await.unwrap(), None);
        assert!(adapter.broadcasts().await.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_is_returned_and_nothing_is_broadcast() {
        // テスト項目: ストレージ障害はエラーとして返り、ブロードキャストしない
        // given (前提条件):
        let mut store = MockRoomStore::new();
        store
            .expect_upsert_playback_snapshot()
            .with(predicate::eq(identity().room_id), predicate::always())
            .times(1)
            .returning(|_, _| Err(RepositoryError::Unavailable("db down".to_string())));
        let adapter = Arc::new(RecordingAdapter::default());
        let usecase = UpdateTimeUseCase::new(Arc::new(store), Arc::new(SyncFanout::with_adapter(adapter.clone())));

        // when (操作):
        let result = usecase.execute(identity(), 1.0, 1_000, 3).await;

        // then (期待する結果):
        assert!(matches!(result, Err(SyncError::Repository(_))));
        assert!(adapter.broadcasts().await.is_empty());
    }
}
