use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::core::{Room, RoomError, RoomId, RoomRepository};
use crate::domain::{DataAccessError, Entity};

/// インメモリの部屋カタログ
#[derive(Clone, Debug, Default)]
pub struct InMemoryRoomRepository {
    rooms: HashMap<RoomId, Room>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rooms<I>(rooms: I) -> Self
    where
        I: IntoIterator<Item = Room>,
    {
        Self {
            rooms: rooms.into_iter().map(|room| (room.id(), room)).collect(),
        }
    }

    /// 既定の部屋カタログ (テスト・デモ用)
    pub fn seeded() -> Result<Self, RoomError> {
        let rooms = vec![
            Room::create(RoomId::from("101"), "Cabin 1".to_owned(), 500.0, 4)?,
            Room::create(RoomId::from("102"), "Cabin 2".to_owned(), 600.0, 6)?,
            Room::create(RoomId::from("103"), "Conference Room A".to_owned(), 800.0, 10)?,
            Room::create(RoomId::from("104"), "Conference Room B".to_owned(), 1000.0, 15)?,
            Room::create(RoomId::from("105"), "Board Room".to_owned(), 1200.0, 20)?,
        ];
        Ok(Self::with_rooms(rooms))
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn find_by_room_id(&self, id: &RoomId) -> Result<Option<Room>, DataAccessError> {
        Ok(self.rooms.get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Room>, DataAccessError> {
        let mut rooms: Vec<_> = self.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.id().cmp(&b.id()));
        Ok(rooms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_by_room_id() {
        let repository = InMemoryRoomRepository::seeded().unwrap();
        let room = repository
            .find_by_room_id(&RoomId::from("103"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(room.name(), "Conference Room A");
        assert!(repository
            .find_by_room_id(&RoomId::from("999"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_all_sorted_by_room_id() {
        let repository = InMemoryRoomRepository::seeded().unwrap();
        let rooms = repository.list_all().await.unwrap();
        assert_eq!(rooms.len(), 5);
        let ids: Vec<_> = rooms.iter().map(|room| room.id().to_string()).collect();
        assert_eq!(ids, vec!["101", "102", "103", "104", "105"]);
    }
}
