//! HTTP API のリクエスト / レスポンス

use serde::{Deserialize, Serialize};

/// `POST /api/sync/updateTime`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimeRequest {
    pub time: f64,
    pub timestamp: i64,
    pub video_id: u64,
}

/// `POST /api/sync/updatePause`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePauseRequest {
    pub paused: bool,
    pub timestamp: i64,
}

/// `POST /api/playlist/switch`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchItemRequest {
    pub playlist_item_id: u64,
}

/// `GET /sse/connect` のクエリ
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SseConnectQuery {
    pub user_id: u64,
    pub room_id: u64,
}

/// `GET /api/sync/query` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatusDto {
    pub room_id: u64,
    pub paused: bool,
    pub time: f64,
    pub timestamp: i64,
    pub video_id: u64,
}

/// `GET /api/room/members` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMembersDto {
    pub room_id: u64,
    pub user_ids: Vec<u64>,
}

/// `GET /api/sync/protocol` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolDto {
    pub protocol: String,
}

/// 更新系エンドポイントの共通レスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    pub message: String,
}

impl MessageDto {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}
