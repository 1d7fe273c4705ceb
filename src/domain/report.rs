use std::collections::HashMap;

use chrono::Duration;
use serde::Serialize;
use thiserror::Error;

use crate::domain::core::{
    hours_between, ReservationRepository, RoomId, RoomRepository, TimeError, TimeNormalizer,
};
use crate::domain::DataAccessError;

/// 部屋ごとの利用状況レポート行
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UsageReport {
    pub room_id: RoomId,
    pub room_name: String,
    pub total_hours: f64,
    pub total_revenue: i64,
}

/// レポートエラー
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid date range: {0}")]
    InvalidRange(#[from] TimeError),
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}

/// 確定済み予約を日付範囲で集計するサービス
pub struct UsageReportService<R, S> {
    rooms: R,
    store: S,
    normalizer: TimeNormalizer,
}

impl<R, S> UsageReportService<R, S>
where
    R: RoomRepository,
    S: ReservationRepository,
{
    pub fn new(rooms: R, store: S, normalizer: TimeNormalizer) -> Self {
        Self {
            rooms,
            store,
            normalizer,
        }
    }

    /// 開始時刻が日付範囲に入る確定済み予約を部屋ごとに集計する
    ///
    /// 範囲は現地日付で両端を含み、終了日はその日の最後の瞬間まで延長する。
    /// 時間数の丸め (小数第1位) は出力時のみ行い、積算中は丸めない。
    /// カタログにない部屋は "Unknown" として報告する。
    /// 該当予約のない部屋は出力しない。
    pub async fn summarize(
        &self,
        from_text: &str,
        to_text: &str,
    ) -> Result<Vec<UsageReport>, ReportError> {
        let from = self.normalizer.parse_local(from_text)?;
        let to =
            self.normalizer.parse_local(to_text)? + Duration::days(1) - Duration::milliseconds(1);

        let reservations = self.store.find_confirmed_in_range(from, to).await?;

        let mut totals: HashMap<RoomId, (f64, i64)> = HashMap::new();
        for reservation in &reservations {
            let hours = hours_between(reservation.time().start, reservation.time().end);
            let entry = totals
                .entry(reservation.room_id().clone())
                .or_insert((0.0, 0));
            entry.0 += hours;
            entry.1 += reservation.total_price();
        }

        let mut report = Vec::with_capacity(totals.len());
        for (room_id, (total_hours, total_revenue)) in totals {
            let room_name = match self.rooms.find_by_room_id(&room_id).await? {
                Some(room) => room.name().to_owned(),
                None => "Unknown".to_owned(),
            };
            report.push(UsageReport {
                room_id,
                room_name,
                total_hours: (total_hours * 10.0).round() / 10.0,
                total_revenue,
            });
        }
        report.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        Ok(report)
    }
}
