//! 開発用の IdentityResolver 実装
//!
//! `Authorization: Bearer <userId>:<roomId>` をそのまま識別子として受け入れる。
//! 署名の検証は一切しないため、本番では信頼できる認証基盤の実装に差し替えること。

use crate::domain::{Identity, IdentityResolver, RoomId, UserId};

/// 検証なしで `<userId>:<roomId>` トークンを解決する
#[derive(Debug, Clone, Copy, Default)]
pub struct UnverifiedTokenResolver;

impl UnverifiedTokenResolver {
    pub fn new() -> Self {
        Self
    }
}

impl IdentityResolver for UnverifiedTokenResolver {
    fn resolve(&self, bearer: &str) -> Option<Identity> {
        let (user, room) = bearer.trim().split_once(':')?;
        let user_id = user.trim().parse::<u64>().ok().and_then(|id| UserId::new(id).ok())?;
        let room_id = room.trim().parse::<u64>().ok().and_then(|id| RoomId::new(id).ok())?;
        Some(Identity { user_id, room_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_user_and_room() {
        // テスト項目: "<userId>:<roomId>" が識別子に解決される
        // given (前提条件):
        let resolver = UnverifiedTokenResolver::new();

        // when (操作):
        let identity = resolver.resolve("1:7");

        // then (期待する結果):
        assert_eq!(
            identity,
            Some(Identity {
                user_id: UserId::new(1).unwrap(),
                room_id: RoomId::new(7).unwrap(),
            })
        );
    }

    #[test]
    fn test_reject_malformed_tokens() {
        // テスト項目: 形式が不正なトークンや 0 の ID は解決されない
        // given (前提条件):
        let resolver = UnverifiedTokenResolver::new();

        // when (操作) / then (期待する結果):
        for token in ["", "1", "1:", ":7", "a:7", "1:b", "0:7", "1:0", "-1:7"] {
            assert_eq!(resolver.resolve(token), None, "token {token:?}");
        }
    }
}
