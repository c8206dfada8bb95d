//! 値オブジェクト
//!
//! ルーム・ユーザー・接続を識別する ID と、エポックミリ秒のタイムスタンプ。

use std::fmt;

use uuid::Uuid;

use super::ValueObjectError;

/// ルーム ID（正の整数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(u64);

impl RoomId {
    /// 新しい RoomId を作成
    ///
    /// # Errors
    ///
    /// `0` は無効な ID として `ValueObjectError::NonPositiveId` を返す
    pub fn new(value: u64) -> Result<Self, ValueObjectError> {
        if value == 0 {
            return Err(ValueObjectError::NonPositiveId("roomId"));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザー ID（正の整数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(u64);

impl UserId {
    /// 新しい UserId を作成
    ///
    /// # Errors
    ///
    /// `0` は無効な ID として `ValueObjectError::NonPositiveId` を返す
    pub fn new(value: u64) -> Result<Self, ValueObjectError> {
        if value == 0 {
            return Err(ValueObjectError::NonPositiveId("userId"));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ライブ接続 1 本の識別子
///
/// 切断イベントはトランスポートのハンドルしか持たないため、
/// レジストリの逆引き（`find_owner`）にこの ID を使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unix エポックからのミリ秒
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_accepts_positive_value() {
        // テスト項目: 正の整数から RoomId を作成できる
        // given (前提条件):
        let raw = 7;

        // when (操作):
        let result = RoomId::new(raw);

        // then (期待する結果):
        assert_eq!(result.unwrap().value(), 7);
    }

    #[test]
    fn test_room_id_rejects_zero() {
        // テスト項目: 0 の RoomId は作成できない
        // given (前提条件):
        let raw = 0;

        // when (操作):
        let result = RoomId::try_from(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::NonPositiveId("roomId")));
    }

    #[test]
    fn test_user_id_rejects_zero() {
        // テスト項目: 0 の UserId は作成できない
        // given (前提条件):
        let raw = 0;

        // when (操作):
        let result = UserId::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::NonPositiveId("userId")));
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: 生成される ConnectionId は毎回異なる
        // given (前提条件):

        // when (操作):
        let first = ConnectionId::generate();
        let second = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(first, second);
    }
}
