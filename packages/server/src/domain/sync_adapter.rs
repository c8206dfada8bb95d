//! SyncAdapter trait 定義
//!
//! 永続ソケット（WebSocket）と単方向ストリーム（SSE）の 2 つのトランスポートが
//! 同じ能力セットを提供するためのインターフェース。

use std::{collections::BTreeSet, fmt, str::FromStr};

use async_trait::async_trait;
use thiserror::Error;

use super::{RoomId, SyncMessage, UserId};

/// 同期に使うトランスポート
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncProtocol {
    WebSocket,
    Sse,
}

impl SyncProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebSocket => "websocket",
            Self::Sse => "sse",
        }
    }
}

impl fmt::Display for SyncProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知のプロトコル名
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported sync protocol: '{0}' (expected 'websocket' or 'sse')")]
pub struct UnknownProtocol(pub String);

impl FromStr for SyncProtocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(Self::WebSocket),
            "sse" => Ok(Self::Sse),
            _ => Err(UnknownProtocol(s.to_string())),
        }
    }
}

/// アダプタのライフサイクルエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// アダプタを起動できない
    #[error("failed to start {protocol} adapter: {reason}")]
    StartFailed {
        protocol: SyncProtocol,
        reason: String,
    },
}

/// トランスポートアダプタ
///
/// 配信はベストエフォートかつ fire-and-forget。1 接続への送信失敗は他の接続への
/// 配信を止めず、呼び出し元にも返さない（アダプタがログに残すだけ）。
#[async_trait]
pub trait SyncAdapter: Send + Sync {
    /// ルーム内の `excluded` 以外の全接続に配信
    async fn broadcast(&self, room_id: RoomId, message: &SyncMessage, excluded: &[UserId]);

    /// ルーム内の指定ユーザーにだけ配信（未接続のユーザーは無視）
    async fn send_to_users(&self, room_id: RoomId, user_ids: &[UserId], message: &SyncMessage);

    /// ルームに現在接続しているユーザー
    async fn list_members(&self, room_id: RoomId) -> BTreeSet<UserId>;

    /// アダプタを起動（冪等）
    async fn start(&self) -> Result<(), TransportError>;

    /// 全接続を閉じ、オフラインに更新してレジストリを空にする（冪等）
    async fn stop(&self);

    fn protocol(&self) -> SyncProtocol;
}
