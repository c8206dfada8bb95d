//! UseCase 層
//!
//! 再生状態の更新・問い合わせと、ルームへのファンアウトを組み合わせる。
//! すべてのユースケースは `RoomStore` と `SyncFanout` を `Arc` で受け取る。

mod error;
mod fanout;
mod list_members;
mod query_playback;
mod switch_item;
mod update_pause;
mod update_time;

#[cfg(test)]
pub(crate) mod testing;

pub use error::SyncError;
pub use fanout::SyncFanout;
pub use list_members::ListMembersUseCase;
pub use query_playback::QueryPlaybackUseCase;
pub use switch_item::SwitchItemUseCase;
pub use update_pause::UpdatePauseUseCase;
pub use update_time::UpdateTimeUseCase;
