//! ドメイン層
//!
//! 値オブジェクト、同期メッセージ、再生クロック、そしてコアが依存する
//! コラボレータの trait（ストレージ・認証・トランスポート）を定義します。

mod error;
mod identity;
mod playback;
mod repository;
mod sync_adapter;
mod sync_message;
mod value_object;

pub use error::{RepositoryError, ValueObjectError};
pub use identity::{Identity, IdentityResolver};
pub use playback::{PlaybackSnapshot, PlaybackUpdate};
#[cfg(test)]
pub use repository::MockRoomStore;
pub use repository::RoomStore;
pub use sync_adapter::{SyncAdapter, SyncProtocol, TransportError, UnknownProtocol};
pub use sync_message::{SyncMessage, tag};
pub use value_object::{ConnectionId, RoomId, Timestamp, UserId};
