//! ルーム内のクライアントへ配信する同期メッセージ
//!
//! ワイヤ形式は `{"type": <tag>, "payload": <任意の JSON>}`（`payload` は省略可）。
//! バージョニングは行わず、未知のタグもそのまま運ぶ。

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{PlaybackSnapshot, RoomId, UserId};

/// 観測されているメッセージタグ
pub mod tag {
    pub const UPDATE_TIME: &str = "updateTime";
    pub const UPDATE_PAUSE: &str = "updatePause";
    pub const UPDATE_PLAYLIST: &str = "updatePlaylist";
    pub const CONNECTED: &str = "connected";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl SyncMessage {
    pub fn new(kind: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// 再生位置の再同期（クライアント報告）
    pub fn update_time(room_id: RoomId, user_id: UserId, snapshot: &PlaybackSnapshot) -> Self {
        Self::new(
            tag::UPDATE_TIME,
            Some(json!({
                "roomId": room_id.value(),
                "userId": user_id.value(),
                "paused": snapshot.paused,
                "time": snapshot.position,
                "timestamp": snapshot.timestamp.value(),
                "videoId": snapshot.current_item_id,
            })),
        )
    }

    /// 一時停止状態の変更
    pub fn update_pause(room_id: RoomId, user_id: UserId, snapshot: &PlaybackSnapshot) -> Self {
        Self::new(
            tag::UPDATE_PAUSE,
            Some(json!({
                "roomId": room_id.value(),
                "userId": user_id.value(),
                "paused": snapshot.paused,
                "timestamp": snapshot.timestamp.value(),
            })),
        )
    }

    /// プレイリストが変わったので再取得を促す（payload なし）
    pub fn update_playlist() -> Self {
        Self::new(tag::UPDATE_PLAYLIST, None)
    }

    /// 接続（識別子のバインド）完了の通知
    pub fn connected() -> Self {
        Self::new(tag::CONNECTED, None)
    }
}
