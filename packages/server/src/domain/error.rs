//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクトの生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// ID が 0（正の整数でない）
    #[error("{0} must be a positive integer")]
    NonPositiveId(&'static str),

    /// 再生位置が負数または有限でない
    #[error("playback position must be a finite, non-negative number of seconds")]
    InvalidPosition,

    /// タイムスタンプが負数
    #[error("timestamp must be a non-negative number of milliseconds since the Unix epoch")]
    InvalidTimestamp,
}

/// ストレージ（RoomStore）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// ストレージへのアクセスに失敗
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
