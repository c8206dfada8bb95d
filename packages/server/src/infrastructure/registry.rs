//! 接続レジストリ
//!
//! ## 責務
//!
//! - `room → (user → ConnectionHandle)` のマップを 1 つの RwLock の下で管理
//! - 登録・解除・ルーム単位の参照・接続 ID からの逆引き
//!
//! ## 設計ノート
//!
//! レジストリはアダプタごとに 1 つで、ロックを共有しない。
//! 配信対象はロック中にスナップショット（ハンドルの clone）として取り出し、
//! 実際の送信はロックを手放してから行う。
//!
//! `find_owner` はルーム × ユーザーの線形走査。1 ルーム数十人を想定した規模なら十分だが、
//! 接続数が増えるなら逆引きインデックスを同じロックの下で持つ必要がある。

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;
use tokio::sync::{RwLock, mpsc};

use crate::domain::{ConnectionId, RoomId, UserId};

/// 接続の書き込みタスクへ渡すフレーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// エンコード済みのテキストフレーム
    Frame(String),
    /// トランスポートを閉じる
    Close,
}

/// ハンドル経由の送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// 接続の受信側がすでに閉じている
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
}

/// 1 つのライブクライアントへメッセージを push する能力
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    /// 新しい接続 ID でハンドルとその受信側を作成
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = Self {
            id: ConnectionId::generate(),
            sender,
        };
        (handle, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// テキストフレームを送信
    pub fn push(&self, frame: String) -> Result<(), PushError> {
        self.sender
            .send(Outbound::Frame(frame))
            .map_err(|_| PushError::Closed(self.id))
    }

    /// トランスポートを閉じるよう要求
    pub fn close(&self) -> Result<(), PushError> {
        self.sender
            .send(Outbound::Close)
            .map_err(|_| PushError::Closed(self.id))
    }
}

/// レジストリから取り出した 1 エントリ
#[derive(Debug, Clone)]
pub struct RegisteredConnection {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub handle: ConnectionHandle,
}

/// アダプタ 1 つ分の接続レジストリ
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    rooms: RwLock<HashMap<RoomId, HashMap<UserId, ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録（同じ (room, user) があれば置き換え、置き換えられたハンドルを返す）
    pub async fn register(
        &self,
        room_id: RoomId,
        user_id: UserId,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        let mut rooms = self.rooms.write().await;
        let replaced = rooms.entry(room_id).or_default().insert(user_id, handle);
        if let Some(old) = &replaced {
            tracing::debug!(
                "Connection {} of user {} in room {} superseded",
                old.id(),
                user_id,
                room_id
            );
        }
        replaced
    }

    /// 登録解除（未登録なら何もしない）
    pub async fn unregister(&self, room_id: RoomId, user_id: UserId) -> Option<ConnectionHandle> {
        let mut rooms = self.rooms.write().await;
        let members = rooms.get_mut(&room_id)?;
        let removed = members.remove(&user_id);
        if members.is_empty() {
            rooms.remove(&room_id);
        }
        removed
    }

    /// 登録中のハンドルが `connection_id` のときだけ解除する
    ///
    /// 置き換えられた古い接続の後始末が、新しい接続を消してしまわないようにするため。
    pub async fn unregister_connection(
        &self,
        room_id: RoomId,
        user_id: UserId,
        connection_id: ConnectionId,
    ) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(&room_id) else {
            return false;
        };
        if members.get(&user_id).map(ConnectionHandle::id) != Some(connection_id) {
            return false;
        }
        members.remove(&user_id);
        if members.is_empty() {
            rooms.remove(&room_id);
        }
        true
    }

    /// 接続 ID から (room, user) を逆引き
    pub async fn find_owner(&self, connection_id: ConnectionId) -> Option<(RoomId, UserId)> {
        let rooms = self.rooms.read().await;
        rooms.iter().find_map(|(room_id, members)| {
            members
                .iter()
                .find(|(_, handle)| handle.id() == connection_id)
                .map(|(user_id, _)| (*room_id, *user_id))
        })
    }

    /// ルームに登録中のユーザー（スナップショット）
    pub async fn members_of(&self, room_id: RoomId) -> BTreeSet<UserId> {
        let rooms = self.rooms.read().await;
        rooms
            .get(&room_id)
            .map(|members| members.keys().copied().collect())
            .unwrap_or_default()
    }

    /// ルーム内で `include` を満たすユーザーのハンドル（スナップショット）
    pub async fn targets<F>(&self, room_id: RoomId, include: F) -> Vec<(UserId, ConnectionHandle)>
    where
        F: Fn(UserId) -> bool,
    {
        let rooms = self.rooms.read().await;
        rooms
            .get(&room_id)
            .map(|members| {
                members
                    .iter()
                    .filter(|(user_id, _)| include(**user_id))
                    .map(|(user_id, handle)| (*user_id, handle.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 全エントリを取り出して空にする
    pub async fn drain(&self) -> Vec<RegisteredConnection> {
        let mut rooms = self.rooms.write().await;
        rooms
            .drain()
            .flat_map(|(room_id, members)| {
                members
                    .into_iter()
                    .map(move |(user_id, handle)| RegisteredConnection {
                        room_id,
                        user_id,
                        handle,
                    })
            })
            .collect()
    }

    /// 登録中の接続数
    pub async fn len(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.values().map(HashMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
