//! Inventory reservation over the room-type counter.

use common::RoomTypeId;
use store::BookingStore;

use crate::error::Result;

/// Adjusts a room type's available-inventory counter.
///
/// `decrease` and `increase` each issue one conditional statement; `false`
/// means no row qualified (room type missing, or not enough rooms left for
/// a decrease) and callers must treat it as a reservation failure.
///
/// There is no idempotency key at this layer: callers guard against
/// releasing the same booking's rooms twice with the booking's
/// `inventory_released_at` marker.
#[derive(Clone)]
pub struct InventoryService<S> {
    store: S,
}

impl<S: BookingStore> InventoryService<S> {
    /// Creates a new inventory service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reserves `count` rooms, failing when fewer are available.
    #[tracing::instrument(skip(self))]
    pub async fn decrease(&self, room_type_id: RoomTypeId, count: u32) -> Result<bool> {
        let reserved = self
            .store
            .decrease_available_inventory(room_type_id, count)
            .await?;

        if reserved {
            metrics::counter!("inventory_rooms_reserved_total").increment(u64::from(count));
        } else {
            tracing::debug!(%room_type_id, count, "inventory decrement rejected");
        }
        Ok(reserved)
    }

    /// Hands `count` rooms back, clamped at the room type's total capacity.
    #[tracing::instrument(skip(self))]
    pub async fn increase(&self, room_type_id: RoomTypeId, count: u32) -> Result<bool> {
        let released = self
            .store
            .increase_available_inventory(room_type_id, count)
            .await?;

        if released {
            metrics::counter!("inventory_rooms_released_total").increment(u64::from(count));
        } else {
            tracing::warn!(%room_type_id, count, "inventory increment found no room type");
        }
        Ok(released)
    }
}
