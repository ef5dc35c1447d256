//! Room-type inventory entity.

use common::{HotelId, RoomTypeId};
use serde::{Deserialize, Serialize};

/// A category of rooms within a hotel sharing pricing and an inventory pool.
///
/// `total_inventory` is the fixed capacity; `available_inventory` is the
/// running counter mutated by reservation, cancellation, and the sweepers.
/// The store keeps `0 <= available_inventory <= total_inventory` by only
/// adjusting it through conditional updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomType {
    pub id: RoomTypeId,
    pub hotel_id: HotelId,
    /// Display name, e.g. "Deluxe King".
    pub name: String,
    pub max_occupancy: u32,
    pub total_inventory: u32,
    pub available_inventory: u32,
    pub bed_count: u32,
    pub size_sqm: u32,
}

impl RoomType {
    /// Creates a room type with its full inventory available.
    pub fn new(
        hotel_id: HotelId,
        name: impl Into<String>,
        max_occupancy: u32,
        total_inventory: u32,
        bed_count: u32,
        size_sqm: u32,
    ) -> Self {
        Self {
            id: RoomTypeId::new(),
            hotel_id,
            name: name.into(),
            max_occupancy,
            total_inventory,
            available_inventory: total_inventory,
            bed_count,
            size_sqm,
        }
    }
}
