//! SSE のイベント本文

use serde::{Deserialize, Serialize};

use crate::domain::SyncMessage;

/// `data: <json>` 行に載せる本文 `{"type": ..., "data": ...}`
///
/// `data` には同期メッセージ全体が入る。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SseEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: SyncMessage,
}

impl From<&SyncMessage> for SseEnvelope {
    fn from(message: &SyncMessage) -> Self {
        Self {
            kind: message.kind.clone(),
            data: message.clone(),
        }
    }
}
