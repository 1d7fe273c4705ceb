use async_trait::async_trait;
use derive_more::{Deref, Display, Error, From};
use serde::{Deserialize, Serialize};

use crate::domain::{DataAccessError, Entity, Id};

/// 部屋カタログのリポジトリトレイト
///
/// 部屋はカタログ側で管理され、このクレートからは変更しない。
#[async_trait]
pub trait RoomRepository {
    /// 部屋IDで部屋を検索する
    async fn find_by_room_id(&self, id: &RoomId) -> Result<Option<Room>, DataAccessError>;
    /// すべての部屋を部屋ID昇順で取得する
    async fn list_all(&self) -> Result<Vec<Room>, DataAccessError>;
}

/// 部屋ID
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Deref,
    Default,
)]
pub struct RoomId(String);

impl Id for RoomId {
    type Inner = String;
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// 部屋エンティティ
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
    room_id: RoomId,
    name: String,
    base_hourly_rate: f64,
    capacity: u32,
}

impl Room {
    pub fn create(
        room_id: RoomId,
        name: String,
        base_hourly_rate: f64,
        capacity: u32,
    ) -> Result<Self, RoomError> {
        Self::validate_name(&name)?;
        Self::validate_rate(base_hourly_rate)?;
        Self::validate_capacity(capacity)?;
        Ok(Self {
            room_id,
            name,
            base_hourly_rate,
            capacity,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_hourly_rate(&self) -> f64 {
        self.base_hourly_rate
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    fn validate_name(name: &str) -> Result<(), RoomError> {
        if name.is_empty() {
            return Err(RoomError::NameIsBlank);
        }
        Ok(())
    }

    fn validate_rate(base_hourly_rate: f64) -> Result<(), RoomError> {
        if !base_hourly_rate.is_finite() || base_hourly_rate <= 0.0 {
            return Err(RoomError::InvalidRate);
        }
        Ok(())
    }

    fn validate_capacity(capacity: u32) -> Result<(), RoomError> {
        if capacity < 1 {
            return Err(RoomError::InvalidCapacity);
        }
        Ok(())
    }
}

impl Entity for Room {
    type Id = RoomId;

    fn id(&self) -> Self::Id {
        self.room_id.clone()
    }
}

/// 部屋エラー
#[derive(Error, Display, Debug)]
pub enum RoomError {
    #[display(fmt = "Name cannot be blank")]
    NameIsBlank,
    #[display(fmt = "Base hourly rate must be positive")]
    InvalidRate,
    #[display(fmt = "Capacity must be at least 1")]
    InvalidCapacity,
}
