use std::ops::Range;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::core::{
    Reservation, ReservationError, ReservationId, ReservationRepository, ReservationStatus,
    RoomId,
};
use crate::domain::{DataAccessError, Entity};

/// インメモリの予約ストア
///
/// 単一呼び出し内の read-your-writes は満たすが、並行する作成同士の
/// 二重予約防止は本来のストアの一意性制約に委ねる。
#[derive(Clone, Debug, Default)]
pub struct InMemoryReservationRepository {
    reservations: Vec<Reservation>,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn find_by_id(
        &self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, DataAccessError> {
        Ok(self
            .reservations
            .iter()
            .find(|reservation| reservation.id() == *id)
            .cloned())
    }

    async fn find_confirmed_overlapping(
        &self,
        room_id: &RoomId,
        time: &Range<DateTime<Utc>>,
    ) -> Result<Vec<Reservation>, DataAccessError> {
        let mut found: Vec<_> = self
            .reservations
            .iter()
            .filter(|reservation| {
                reservation.room_id() == room_id
                    && reservation.status() == ReservationStatus::Confirmed
                    && reservation.time().end > time.start
                    && reservation.time().start < time.end
            })
            .cloned()
            .collect();
        found.sort_by_key(|reservation| reservation.time().start);
        Ok(found)
    }

    async fn find_confirmed_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, DataAccessError> {
        Ok(self
            .reservations
            .iter()
            .filter(|reservation| {
                reservation.status() == ReservationStatus::Confirmed
                    && reservation.time().start >= from
                    && reservation.time().start <= to
            })
            .cloned()
            .collect())
    }

    async fn insert(&mut self, entity: &Reservation) -> Result<Reservation, DataAccessError> {
        if self
            .reservations
            .iter()
            .any(|reservation| reservation.id() == entity.id())
        {
            return Err(DataAccessError::WriteError(
                format!("duplicate reservation id: {}", entity.id()).into(),
            ));
        }
        self.reservations.push(entity.clone());
        Ok(entity.clone())
    }

    async fn update_status(
        &mut self,
        id: &ReservationId,
        status: ReservationStatus,
    ) -> Result<Option<Reservation>, DataAccessError> {
        let stored = match self
            .reservations
            .iter_mut()
            .find(|reservation| reservation.id() == *id)
        {
            Some(stored) => stored,
            None => return Ok(None),
        };
        match status {
            ReservationStatus::Cancelled => stored
                .cancel()
                .map_err(|e| DataAccessError::WriteError(Box::new(e)))?,
            // 確定への遷移は存在しない
            ReservationStatus::Confirmed => {
                return Err(DataAccessError::WriteError(
                    Box::new(ReservationError::InvalidStatusTransition),
                ));
            }
        }
        Ok(Some(stored.clone()))
    }

    async fn list_all(&self) -> Result<Vec<Reservation>, DataAccessError> {
        let mut all = self.reservations.clone();
        all.sort_by(|a, b| b.time().start.cmp(&a.time().start));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hour(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, h, 0, 0).unwrap()
    }

    fn reservation(id: &str, room_id: &str, day: u32, start: u32, end: u32) -> Reservation {
        Reservation::create(
            ReservationId::from(id),
            RoomId::from(room_id),
            "山田太郎".to_owned(),
            hour(day, start)..hour(day, end),
            1000,
        )
        .unwrap()
    }

    async fn store() -> InMemoryReservationRepository {
        let mut store = InMemoryReservationRepository::new();
        store
            .insert(&reservation("r1", "101", 15, 10, 12))
            .await
            .unwrap();
        store
            .insert(&reservation("r2", "101", 15, 14, 16))
            .await
            .unwrap();
        store
            .insert(&reservation("r3", "102", 15, 10, 12))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let mut store = store().await;
        let result = store.insert(&reservation("r1", "103", 16, 10, 12)).await;
        assert!(matches!(result, Err(DataAccessError::WriteError(_))));
    }

    #[tokio::test]
    async fn test_find_confirmed_overlapping_filters_room_and_time() {
        let store = store().await;
        let found = store
            .find_confirmed_overlapping(&RoomId::from("101"), &(hour(15, 11)..hour(15, 15)))
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|r| r.id().to_string()).collect();
        // 開始時刻昇順
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[tokio::test]
    async fn test_find_confirmed_overlapping_excludes_back_to_back() {
        let store = store().await;
        let found = store
            .find_confirmed_overlapping(&RoomId::from("101"), &(hour(15, 12)..hour(15, 14)))
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_find_confirmed_overlapping_excludes_cancelled() {
        let mut store = store().await;
        store
            .update_status(&ReservationId::from("r1"), ReservationStatus::Cancelled)
            .await
            .unwrap();
        let found = store
            .find_confirmed_overlapping(&RoomId::from("101"), &(hour(15, 10)..hour(15, 12)))
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_find_confirmed_in_range_is_inclusive_on_start() {
        let store = store().await;
        let found = store
            .find_confirmed_in_range(hour(15, 10), hour(15, 14))
            .await
            .unwrap();
        let mut ids: Vec<_> = found.iter().map(|r| r.id().to_string()).collect();
        ids.sort();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
    }

    #[tokio::test]
    async fn test_update_status_on_missing_id() {
        let mut store = store().await;
        let updated = store
            .update_status(&ReservationId::from("missing"), ReservationStatus::Cancelled)
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_update_status_to_confirmed_is_rejected() {
        let mut store = store().await;
        let result = store
            .update_status(&ReservationId::from("r1"), ReservationStatus::Confirmed)
            .await;
        assert!(matches!(result, Err(DataAccessError::WriteError(_))));
    }

    #[tokio::test]
    async fn test_list_all_orders_by_start_desc() {
        let mut store = store().await;
        store
            .insert(&reservation("r4", "103", 16, 9, 10))
            .await
            .unwrap();
        let all = store.list_all().await.unwrap();
        assert_eq!(all[0].id(), ReservationId::from("r4"));
        assert_eq!(all.last().unwrap().id(), ReservationId::from("r3"));
    }
}
