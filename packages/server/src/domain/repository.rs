//! RoomStore trait 定義
//!
//! 同期コアが必要とするストレージへのインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{PlaybackSnapshot, PlaybackUpdate, RepositoryError, RoomId, UserId};

/// ルームのメンバー状態と再生スナップショットを保持するストレージ
///
/// コアはスナップショットをキャッシュせず、常にこの trait 経由で読み書きする。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// メンバーのオンライン状態を更新
    async fn set_member_online(
        &self,
        room_id: RoomId,
        user_id: UserId,
        online: bool,
    ) -> Result<(), RepositoryError>;

    /// ルームの再生スナップショットを取得（未作成なら `None`）
    async fn get_playback_snapshot(
        &self,
        room_id: RoomId,
    ) -> Result<Option<PlaybackSnapshot>, RepositoryError>;

    /// ルームの再生スナップショットを upsert し、更新後の値を返す
    async fn upsert_playback_snapshot(
        &self,
        room_id: RoomId,
        update: PlaybackUpdate,
    ) -> Result<PlaybackSnapshot, RepositoryError>;
}
