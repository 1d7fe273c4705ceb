use std::ops::Range;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::domain::core::{
    find_conflict, hours_between, PricingEngine, Reservation, ReservationError, ReservationId,
    ReservationRepository, RoomId, RoomRepository, TimeNormalizer,
};
use crate::domain::{Clock, DataAccessError, Entity};

/// 予約の業務ポリシー
#[derive(Copy, Clone, Debug)]
pub struct BookingPolicy {
    /// 予約の最大時間数
    pub max_booking_hours: i64,
    /// キャンセルに必要な最小リードタイム (時間)
    pub min_cancellation_hours: i64,
}

/// 予約サービスエラー
///
/// いずれも呼び出し側で回復可能な業務エラー。コラボレータの障害は
/// `DataAccess` としてそのまま伝播し、リトライしない。
#[derive(Error, Debug)]
pub enum ReserveError {
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),
    #[error("Room {0} not found")]
    RoomNotFound(RoomId),
    #[error("Room already booked from {start} to {end}")]
    ScheduleConflict { start: String, end: String },
    #[error("Booking not found")]
    NotFound,
    #[error("Booking already cancelled")]
    AlreadyCancelled,
    #[error("Cancellation not allowed. Must cancel at least {0} hours before start time")]
    CancellationWindowViolation(i64),
    #[error("{0}")]
    Validation(#[from] ReservationError),
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}

/// 予約のライフサイクルを編成するサービス
///
/// 作成は 検証 → 部屋解決 → 競合検出 → 料金計算 → 保存 の順に進み、
/// 途中で失敗した場合は何も永続化しない。
pub struct ReservationService<R, S, C> {
    rooms: R,
    store: S,
    clock: C,
    normalizer: TimeNormalizer,
    pricing: PricingEngine,
    policy: BookingPolicy,
}

impl<R, S, C> ReservationService<R, S, C>
where
    R: RoomRepository,
    S: ReservationRepository,
    C: Clock,
{
    pub fn new(rooms: R, store: S, clock: C, pricing: PricingEngine, policy: BookingPolicy) -> Self {
        let normalizer = pricing.normalizer().clone();
        Self {
            rooms,
            store,
            clock,
            normalizer,
            pricing,
            policy,
        }
    }

    /// 予約を作成する
    pub async fn create(
        &mut self,
        room_id: RoomId,
        user_name: String,
        start_text: &str,
        end_text: &str,
    ) -> Result<Reservation, ReserveError> {
        let time = self.parse_interval(start_text, end_text)?;
        self.validate_interval(&time)?;

        let room = self
            .rooms
            .find_by_room_id(&room_id)
            .await?
            .ok_or_else(|| ReserveError::RoomNotFound(room_id.clone()))?;

        let existing = self
            .store
            .find_confirmed_overlapping(&room_id, &time)
            .await?;
        if let Some(conflicting) = find_conflict(&time, &existing) {
            let window = conflicting.time();
            return Err(ReserveError::ScheduleConflict {
                start: self.format_local_time(window.start),
                end: self.format_local_time(window.end),
            });
        }

        let total_price = self.pricing.price(&time, room.base_hourly_rate());
        let reservation = Reservation::create(
            ReservationId::generate(),
            room_id,
            user_name,
            time,
            total_price,
        )?;
        let persisted = self.store.insert(&reservation).await?;
        info!(
            "予約を作成しました: {} (部屋 {}, 料金 {})",
            persisted.id(),
            persisted.room_id(),
            persisted.total_price(),
        );
        Ok(persisted)
    }

    /// 予約をキャンセルする
    pub async fn cancel(&mut self, id: &ReservationId) -> Result<Reservation, ReserveError> {
        let mut reservation = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ReserveError::NotFound)?;
        reservation
            .cancel()
            .map_err(|_| ReserveError::AlreadyCancelled)?;

        let hours_until_start = hours_between(self.clock.now(), reservation.time().start);
        if hours_until_start < self.policy.min_cancellation_hours as f64 {
            return Err(ReserveError::CancellationWindowViolation(
                self.policy.min_cancellation_hours,
            ));
        }

        let updated = self
            .store
            .update_status(id, reservation.status())
            .await?
            .ok_or(ReserveError::NotFound)?;
        info!("予約をキャンセルしました: {}", updated.id());
        Ok(updated)
    }

    /// すべての予約を開始時刻の新しい順で取得する
    pub async fn list_all(&self) -> Result<Vec<Reservation>, ReserveError> {
        Ok(self.store.list_all().await?)
    }

    fn parse_interval(
        &self,
        start_text: &str,
        end_text: &str,
    ) -> Result<Range<DateTime<Utc>>, ReserveError> {
        let start = self
            .normalizer
            .parse_local(start_text)
            .map_err(|e| ReserveError::InvalidInterval(e.to_string()))?;
        let end = self
            .normalizer
            .parse_local(end_text)
            .map_err(|e| ReserveError::InvalidInterval(e.to_string()))?;
        Ok(start..end)
    }

    fn validate_interval(&self, time: &Range<DateTime<Utc>>) -> Result<(), ReserveError> {
        if time.start >= time.end {
            return Err(ReserveError::InvalidInterval(
                "Start time must be before end time".to_owned(),
            ));
        }
        if time.start < self.clock.now() {
            return Err(ReserveError::InvalidInterval(
                "Cannot book in the past".to_owned(),
            ));
        }
        if hours_between(time.start, time.end) > self.policy.max_booking_hours as f64 {
            return Err(ReserveError::InvalidInterval(format!(
                "Booking duration cannot exceed {} hours",
                self.policy.max_booking_hours,
            )));
        }
        Ok(())
    }

    fn format_local_time(&self, instant: DateTime<Utc>) -> String {
        self.normalizer.to_local(instant).format("%H:%M").to_string()
    }
}
