use std::ops::Range;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::{Deref, Display, Error, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{DataAccessError, Entity, Id};

use super::RoomId;

/// 予約ストアのリポジトリトレイト
///
/// 競合チェックと保存は1回の作成処理の中でこの順に呼ばれるが、
/// この2つを原子的に実行する保証はストア側の責務
/// (部屋+区間の一意性制約など) とする。
#[async_trait]
pub trait ReservationRepository {
    /// IDで予約を検索する
    async fn find_by_id(
        &self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, DataAccessError>;
    /// 指定の部屋で候補区間と重なり得る確定済み予約を開始時刻昇順で取得する
    async fn find_confirmed_overlapping(
        &self,
        room_id: &RoomId,
        time: &Range<DateTime<Utc>>,
    ) -> Result<Vec<Reservation>, DataAccessError>;
    /// 開始時刻が [from, to] に含まれる確定済み予約を取得する
    async fn find_confirmed_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, DataAccessError>;
    /// 予約を保存する
    async fn insert(&mut self, entity: &Reservation) -> Result<Reservation, DataAccessError>;
    /// 予約のステータスを更新する
    async fn update_status(
        &mut self,
        id: &ReservationId,
        status: ReservationStatus,
    ) -> Result<Option<Reservation>, DataAccessError>;
    /// すべての予約を開始時刻の新しい順で取得する
    async fn list_all(&self) -> Result<Vec<Reservation>, DataAccessError>;
}

/// 予約ID
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Deref, Default,
)]
pub struct ReservationId(String);

impl ReservationId {
    /// 新しい予約IDを生成する
    ///
    /// 作成の呼び出しごとに生成すること。プロセス全体で使い回すと
    /// すべての予約が同じIDになる。
    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);
        Self(id)
    }
}

impl Id for ReservationId {
    type Inner = String;
}

impl From<&str> for ReservationId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// 予約ステータス
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// 確定
    Confirmed,
    /// キャンセル
    Cancelled,
}

impl Default for ReservationStatus {
    fn default() -> Self {
        ReservationStatus::Confirmed
    }
}

/// 予約エンティティ
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    room_id: RoomId,
    user_name: String,
    time: Range<DateTime<Utc>>,
    total_price: i64,
    status: ReservationStatus,
}

impl Reservation {
    /// 確定済みの予約を作成する
    ///
    /// 料金は料金計算エンジンの出力をそのまま渡すこと。
    pub fn create(
        id: ReservationId,
        room_id: RoomId,
        user_name: String,
        time: Range<DateTime<Utc>>,
        total_price: i64,
    ) -> Result<Self, ReservationError> {
        Self::validate_user_name(&user_name)?;
        Self::validate_time(&time)?;
        Self::validate_price(total_price)?;
        Ok(Self {
            id,
            room_id,
            user_name,
            time,
            total_price,
            status: ReservationStatus::Confirmed,
        })
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn time(&self) -> &Range<DateTime<Utc>> {
        &self.time
    }

    pub fn total_price(&self) -> i64 {
        self.total_price
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    /// 予約をキャンセルする
    ///
    /// 確定済みからの一方向遷移のみ。物理削除は行わない。
    pub fn cancel(&mut self) -> Result<(), ReservationError> {
        self.validate_status(ReservationStatus::Cancelled)?;
        self.status = ReservationStatus::Cancelled;
        Ok(())
    }

    fn validate_status(&self, status: ReservationStatus) -> Result<(), ReservationError> {
        match (self.status, status) {
            (ReservationStatus::Confirmed, ReservationStatus::Cancelled) => Ok(()),
            _ => Err(ReservationError::InvalidStatusTransition),
        }
    }

    fn validate_user_name(user_name: &str) -> Result<(), ReservationError> {
        if user_name.is_empty() {
            return Err(ReservationError::UserNameRequired);
        }
        Ok(())
    }

    fn validate_time(time: &Range<DateTime<Utc>>) -> Result<(), ReservationError> {
        if time.start >= time.end {
            return Err(ReservationError::InvalidTime);
        }
        Ok(())
    }

    fn validate_price(total_price: i64) -> Result<(), ReservationError> {
        if total_price < 0 {
            return Err(ReservationError::InvalidPrice);
        }
        Ok(())
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }
}

/// 候補区間と重なる最初の予約を返す
///
/// 半開区間 [start, end) の重なり判定。終了と開始が一致する
/// 背中合わせの予約は競合にならない。呼び出し側が渡した並び順の
/// 先頭から探すため、並び順が安定ならエラーメッセージも安定する。
pub fn find_conflict<'a, I>(
    time: &Range<DateTime<Utc>>,
    existing: I,
) -> Option<&'a Reservation>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    existing
        .into_iter()
        .find(|reservation| time.start < reservation.time.end && reservation.time.start < time.end)
}

/// 予約エラー
#[derive(Error, Display, Debug)]
pub enum ReservationError {
    #[display(fmt = "User name is not specified")]
    UserNameRequired,
    #[display(fmt = "Start time must be before end time")]
    InvalidTime,
    #[display(fmt = "Total price must not be negative")]
    InvalidPrice,
    #[display(fmt = "Invalid status transition")]
    InvalidStatusTransition,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, 0, 0).unwrap()
    }

    fn reservation(id: &str, start: u32, end: u32) -> Reservation {
        Reservation::create(
            ReservationId::from(id),
            RoomId::from("101"),
            "山田太郎".to_owned(),
            hour(start)..hour(end),
            1000,
        )
        .unwrap()
    }

    #[test]
    fn test_create_is_confirmed() {
        let entity = reservation("r1", 10, 12);
        assert_eq!(entity.status(), ReservationStatus::Confirmed);
        assert_eq!(entity.total_price(), 1000);
        assert_eq!(entity.room_id(), &RoomId::from("101"));
    }

    #[test]
    fn test_create_rejects_blank_user_name() {
        let result = Reservation::create(
            ReservationId::from("r1"),
            RoomId::from("101"),
            String::new(),
            hour(10)..hour(12),
            1000,
        );
        assert!(matches!(result, Err(ReservationError::UserNameRequired)));
    }

    #[test]
    fn test_create_rejects_inverted_time() {
        let result = Reservation::create(
            ReservationId::from("r1"),
            RoomId::from("101"),
            "山田太郎".to_owned(),
            hour(12)..hour(10),
            1000,
        );
        assert!(matches!(result, Err(ReservationError::InvalidTime)));
    }

    #[test]
    fn test_cancel_is_one_way() {
        let mut entity = reservation("r1", 10, 12);
        entity.cancel().unwrap();
        assert_eq!(entity.status(), ReservationStatus::Cancelled);
        assert!(matches!(
            entity.cancel(),
            Err(ReservationError::InvalidStatusTransition),
        ));
    }

    #[test]
    fn test_find_conflict_detects_overlap() {
        let existing = vec![reservation("r1", 10, 12)];
        assert!(find_conflict(&(hour(11)..hour(13)), &existing).is_some());
        assert!(find_conflict(&(hour(9)..hour(11)), &existing).is_some());
        assert!(find_conflict(&(hour(10)..hour(12)), &existing).is_some());
        // 完全に包含する場合
        assert!(find_conflict(&(hour(9)..hour(13)), &existing).is_some());
    }

    #[test]
    fn test_find_conflict_allows_back_to_back() {
        let existing = vec![reservation("r1", 10, 12)];
        assert!(find_conflict(&(hour(12)..hour(13)), &existing).is_none());
        assert!(find_conflict(&(hour(8)..hour(10)), &existing).is_none());
    }

    #[test]
    fn test_find_conflict_returns_first_in_given_order() {
        let existing = vec![reservation("r1", 10, 12), reservation("r2", 11, 13)];
        let found = find_conflict(&(hour(11)..hour(12)), &existing).unwrap();
        assert_eq!(found.id(), ReservationId::from("r1"));
    }

    #[test]
    fn test_generate_is_fresh_per_call() {
        let a = ReservationId::generate();
        let b = ReservationId::generate();
        assert_ne!(a, b);
        assert_eq!(a.len(), 8);
    }
}
