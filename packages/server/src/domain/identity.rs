//! 認証コラボレータのインターフェース
//!
//! コアは資格情報を検証しない。解決済みの `(userId, roomId)` だけを受け取る。

use super::{RoomId, UserId};

/// リクエスト（または接続）に紐づく解決済みの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub room_id: RoomId,
}

/// Bearer 資格情報を `Identity` に解決する
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, bearer: &str) -> Option<Identity>;
}
