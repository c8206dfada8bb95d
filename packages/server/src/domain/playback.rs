//! ルームの再生クロック
//!
//! ルームの正準な再生位置は、状態が変わったときだけ更新される疎なスナップショット
//! `(paused, position, timestamp)` として保存される。読み出し時に経過時間ぶん外挿すれば、
//! 古いスナップショットからでも現在位置を求められる。

use super::{Timestamp, ValueObjectError};

/// ルームの再生スナップショット
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    /// 一時停止中か
    pub paused: bool,
    /// 再生位置（秒）
    pub position: f64,
    /// スナップショットを記録した時刻
    pub timestamp: Timestamp,
    /// 再生中のプレイリストアイテム ID（未選択は 0）
    pub current_item_id: u64,
}

impl PlaybackSnapshot {
    /// `now` 時点での実効スナップショットを計算する
    ///
    /// 一時停止中ならそのまま返す。再生中なら
    /// `position + (now - timestamp) / 1000` に進め、タイムスタンプを `now` にする。
    pub fn reconcile(&self, now: Timestamp) -> Self {
        if self.paused {
            return *self;
        }

        let elapsed_secs = now.value().saturating_sub(self.timestamp.value()) as f64 / 1000.0;
        Self {
            position: self.position + elapsed_secs,
            timestamp: now,
            ..*self
        }
    }
}

/// スナップショットへの部分更新（upsert 用）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackUpdate {
    /// クライアントが報告した位置で再同期する（再生中扱い）
    Time {
        position: f64,
        timestamp: Timestamp,
        item_id: u64,
    },
    /// 一時停止状態を変える（位置は保持）
    Pause { paused: bool, timestamp: Timestamp },
    /// 新しいアイテムに切り替える（先頭から再生）
    SwitchItem { item_id: u64, timestamp: Timestamp },
}

impl PlaybackUpdate {
    /// 再同期の更新を作成
    ///
    /// # Errors
    ///
    /// - 位置が負数・NaN・無限大なら `ValueObjectError::InvalidPosition`
    /// - タイムスタンプが負数なら `ValueObjectError::InvalidTimestamp`
    pub fn time(position: f64, timestamp: Timestamp, item_id: u64) -> Result<Self, ValueObjectError> {
        if !position.is_finite() || position < 0.0 {
            return Err(ValueObjectError::InvalidPosition);
        }
        validate_timestamp(timestamp)?;
        Ok(Self::Time {
            position,
            timestamp,
            item_id,
        })
    }

    /// 一時停止状態の更新を作成
    ///
    /// # Errors
    ///
    /// タイムスタンプが負数なら `ValueObjectError::InvalidTimestamp`
    pub fn pause(paused: bool, timestamp: Timestamp) -> Result<Self, ValueObjectError> {
        validate_timestamp(timestamp)?;
        Ok(Self::Pause { paused, timestamp })
    }

    /// 既存のスナップショット（なければ新規作成）に更新を適用する
    pub fn apply(&self, existing: Option<&PlaybackSnapshot>) -> PlaybackSnapshot {
        match (*self, existing) {
            (
                Self::Time {
                    position,
                    timestamp,
                    item_id,
                },
                _,
            ) => PlaybackSnapshot {
                paused: false,
                position,
                timestamp,
                current_item_id: item_id,
            },
            (Self::Pause { paused, timestamp }, Some(current)) => PlaybackSnapshot {
                paused,
                timestamp,
                ..*current
            },
            (Self::Pause { paused, timestamp }, None) => PlaybackSnapshot {
                paused,
                position: 0.0,
                timestamp,
                current_item_id: 0,
            },
            (Self::SwitchItem { item_id, timestamp }, _) => PlaybackSnapshot {
                paused: false,
                position: 0.0,
                timestamp,
                current_item_id: item_id,
            },
        }
    }
}

/// クライアントが報告するタイムスタンプは Unix エポック以降のミリ秒
fn validate_timestamp(timestamp: Timestamp) -> Result<(), ValueObjectError> {
    if timestamp.value() < 0 {
        return Err(ValueObjectError::InvalidTimestamp);
    }
    Ok(())
}
