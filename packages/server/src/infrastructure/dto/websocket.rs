//! WebSocket の受信フレーム

use serde::Deserialize;

use crate::domain::{Identity, RoomId, UserId, ValueObjectError};

/// 識別子バインド用の制御フレームのタグ
pub const AUTH_FRAME: &str = "auth";

/// `auth` フレームの payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    #[serde(alias = "userID")]
    pub user_id: u64,
    #[serde(alias = "roomID")]
    pub room_id: u64,
}

impl TryFrom<AuthPayload> for Identity {
    type Error = ValueObjectError;

    fn try_from(payload: AuthPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::new(payload.user_id)?,
            room_id: RoomId::new(payload.room_id)?,
        })
    }
}
