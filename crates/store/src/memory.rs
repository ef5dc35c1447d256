use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{BookingId, RoomTypeId, UserId};
use domain::{Booking, BookingRoomType, PaymentStatus, RoomType, StayRange};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::BookingStore;

#[derive(Debug, Default)]
struct InMemoryState {
    room_types: HashMap<RoomTypeId, RoomType>,
    bookings: HashMap<BookingId, Booking>,
    line_items: Vec<BookingRoomType>,
    // Fault-injection switches for saga tests.
    line_item_inserts_until_failure: Option<u32>,
    fail_decrease_for: Option<RoomTypeId>,
}

/// In-memory booking store for testing and single-process use.
///
/// Provides the same interface as the PostgreSQL implementation, plus
/// fault-injection switches so saga tests can force a failure at a chosen
/// step.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryBookingStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes line-item inserts fail after `n` more successful inserts.
    pub async fn fail_line_item_inserts_after(&self, n: u32) {
        self.state.write().await.line_item_inserts_until_failure = Some(n);
    }

    /// Makes inventory decrements fail for the given room type.
    pub async fn fail_decrease_for(&self, id: RoomTypeId) {
        self.state.write().await.fail_decrease_for = Some(id);
    }

    /// Clears all fault-injection switches.
    pub async fn clear_failures(&self) {
        let mut state = self.state.write().await;
        state.line_item_inserts_until_failure = None;
        state.fail_decrease_for = None;
    }

    /// Returns the number of stored bookings.
    pub async fn booking_count(&self) -> usize {
        self.state.read().await.bookings.len()
    }

    /// Returns the number of stored line items.
    pub async fn line_item_count(&self) -> usize {
        self.state.read().await.line_items.len()
    }

    /// Returns the available-inventory counter of a room type.
    pub async fn available_inventory(&self, id: RoomTypeId) -> Option<u32> {
        self.state
            .read()
            .await
            .room_types
            .get(&id)
            .map(|rt| rt.available_inventory)
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert_room_type(&self, room_type: &RoomType) -> Result<()> {
        let mut state = self.state.write().await;
        state.room_types.insert(room_type.id, room_type.clone());
        Ok(())
    }

    async fn find_room_type(&self, id: RoomTypeId) -> Result<Option<RoomType>> {
        Ok(self.state.read().await.room_types.get(&id).cloned())
    }

    async fn decrease_available_inventory(&self, id: RoomTypeId, count: u32) -> Result<bool> {
        let mut state = self.state.write().await;

        if state.fail_decrease_for == Some(id) {
            return Err(StoreError::Backend(format!(
                "injected decrement failure for room type {id}"
            )));
        }

        match state.room_types.get_mut(&id) {
            Some(rt) if rt.available_inventory >= count => {
                rt.available_inventory -= count;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increase_available_inventory(&self, id: RoomTypeId, count: u32) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.room_types.get_mut(&id) {
            Some(rt) => {
                rt.available_inventory = (rt.available_inventory + count).min(rt.total_inventory);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        let mut state = self.state.write().await;
        state.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn delete_booking(&self, id: BookingId) -> Result<bool> {
        Ok(self.state.write().await.bookings.remove(&id).is_some())
    }

    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn find_booking_by_tx_ref(&self, tx_ref: &str) -> Result<Option<Booking>> {
        Ok(self
            .state
            .read()
            .await
            .bookings
            .values()
            .find(|b| b.tx_ref == tx_ref)
            .cloned())
    }

    async fn find_bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<_> = state
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn update_payment_status(
        &self,
        id: BookingId,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.bookings.get_mut(&id) {
            Some(b) => {
                b.payment_status = status;
                b.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_stay(
        &self,
        id: BookingId,
        stay: StayRange,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.bookings.get_mut(&id) {
            Some(b) => {
                b.stay = stay;
                b.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn claim_cancellation(
        &self,
        id: BookingId,
        reason: &str,
        new_payment_status: Option<PaymentStatus>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.bookings.get_mut(&id) {
            Some(b) if !b.cancelled => {
                b.cancelled = true;
                b.cancelled_at = Some(now);
                b.cancellation_reason = Some(reason.to_string());
                if let Some(status) = new_payment_status {
                    b.payment_status = status;
                }
                b.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn claim_inventory_release(&self, id: BookingId, now: DateTime<Utc>) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.bookings.get_mut(&id) {
            Some(b) if b.inventory_released_at.is_none() => {
                b.inventory_released_at = Some(now);
                b.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn sum_overlapping_rooms(
        &self,
        room_type_id: RoomTypeId,
        stay: &StayRange,
        exclude_booking: Option<BookingId>,
    ) -> Result<i64> {
        let state = self.state.read().await;
        let total = state
            .line_items
            .iter()
            .filter(|item| item.room_type_id == room_type_id)
            .filter(|item| Some(item.booking_id) != exclude_booking)
            .filter_map(|item| state.bookings.get(&item.booking_id).map(|b| (b, item)))
            .filter(|(b, _)| !b.cancelled && b.stay.overlaps(stay))
            .map(|(_, item)| i64::from(item.num_rooms))
            .sum();
        Ok(total)
    }

    async fn find_expired_checkouts(&self, today: NaiveDate) -> Result<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(state
            .bookings
            .values()
            .filter(|b| {
                !b.cancelled && b.inventory_released_at.is_none() && b.stay.check_out() <= today
            })
            .cloned()
            .collect())
    }

    async fn find_expired_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(state
            .bookings
            .values()
            .filter(|b| {
                b.payment_status == PaymentStatus::Pending
                    && !b.cancelled
                    && b.created_at <= cutoff
            })
            .cloned()
            .collect())
    }

    async fn insert_line_item(&self, item: &BookingRoomType) -> Result<()> {
        let mut state = self.state.write().await;

        if let Some(remaining) = state.line_item_inserts_until_failure {
            if remaining == 0 {
                return Err(StoreError::Backend(
                    "injected line-item insert failure".to_string(),
                ));
            }
            state.line_item_inserts_until_failure = Some(remaining - 1);
        }

        state.line_items.push(item.clone());
        Ok(())
    }

    async fn delete_line_items(&self, booking_id: BookingId) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.line_items.len();
        state.line_items.retain(|item| item.booking_id != booking_id);
        Ok((before - state.line_items.len()) as u64)
    }

    async fn find_line_items(&self, booking_id: BookingId) -> Result<Vec<BookingRoomType>> {
        Ok(self
            .state
            .read()
            .await
            .line_items
            .iter()
            .filter(|item| item.booking_id == booking_id)
            .cloned()
            .collect())
    }
}
