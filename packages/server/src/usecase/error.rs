//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{RepositoryError, RoomId, ValueObjectError};

/// 同期ユースケースのエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// ルームの再生スナップショットがまだない
    #[error("no playback state for room {0}")]
    SnapshotNotFound(RoomId),

    /// 入力値が不正
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValueObjectError),

    /// ストレージへのアクセスに失敗
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
