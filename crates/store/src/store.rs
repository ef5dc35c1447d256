//! The booking store trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{BookingId, RoomTypeId, UserId};
use domain::{Booking, BookingRoomType, PaymentStatus, RoomType, StayRange};

use crate::error::Result;

/// Persistence operations for bookings, line items, and room-type inventory.
///
/// Each method issues one independently committed statement (or query); the
/// saga layer sequences and compensates across them. Mutations that must be
/// race-safe are expressed as conditional updates returning whether a row
/// was affected:
///
/// - [`decrease_available_inventory`](Self::decrease_available_inventory)
///   only succeeds while the counter holds enough rooms;
/// - [`claim_cancellation`](Self::claim_cancellation) only succeeds on a
///   not-yet-cancelled booking;
/// - [`claim_inventory_release`](Self::claim_inventory_release) only
///   succeeds once per booking.
#[async_trait]
pub trait BookingStore: Send + Sync {
    // -- Room types --

    /// Inserts a room type (hotel-management hook and test seeding).
    async fn insert_room_type(&self, room_type: &RoomType) -> Result<()>;

    /// Loads a room type by ID.
    async fn find_room_type(&self, id: RoomTypeId) -> Result<Option<RoomType>>;

    /// Decrements `available_inventory` by `count`, only if at least `count`
    /// rooms are available. Returns false when the room type is missing or
    /// the balance is insufficient.
    async fn decrease_available_inventory(&self, id: RoomTypeId, count: u32) -> Result<bool>;

    /// Increments `available_inventory` by `count`, clamped at
    /// `total_inventory`. Returns false when the room type is missing.
    async fn increase_available_inventory(&self, id: RoomTypeId, count: u32) -> Result<bool>;

    // -- Bookings --

    /// Inserts a new booking row.
    async fn insert_booking(&self, booking: &Booking) -> Result<()>;

    /// Deletes a booking row (saga compensation only). Returns whether a
    /// row was deleted.
    async fn delete_booking(&self, id: BookingId) -> Result<bool>;

    /// Loads a booking by ID.
    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Loads a booking by its payment transaction reference.
    async fn find_booking_by_tx_ref(&self, tx_ref: &str) -> Result<Option<Booking>>;

    /// Lists a user's bookings, newest first.
    async fn find_bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>>;

    /// Sets the payment status and touches `updated_at`.
    async fn update_payment_status(
        &self,
        id: BookingId,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Replaces the stay dates and touches `updated_at`.
    async fn update_stay(&self, id: BookingId, stay: StayRange, now: DateTime<Utc>)
    -> Result<bool>;

    /// Marks the booking cancelled with reason and timestamp, optionally
    /// also moving the payment status. Conditional on `cancelled = false`;
    /// returns false when the booking was already cancelled (or missing).
    async fn claim_cancellation(
        &self,
        id: BookingId,
        reason: &str,
        new_payment_status: Option<PaymentStatus>,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Stamps `inventory_released_at`, conditional on it being unset.
    /// Returns false when inventory for the booking was already released.
    async fn claim_inventory_release(&self, id: BookingId, now: DateTime<Utc>) -> Result<bool>;

    /// Sums `num_rooms` across non-cancelled bookings of the given room
    /// type whose stay overlaps `stay` (inclusive comparison on both ends).
    ///
    /// `exclude_booking` leaves one booking's own line items out of the
    /// count; the saga's mid-flight re-check passes the booking it has just
    /// persisted so it does not collide with itself.
    async fn sum_overlapping_rooms(
        &self,
        room_type_id: RoomTypeId,
        stay: &StayRange,
        exclude_booking: Option<BookingId>,
    ) -> Result<i64>;

    /// Non-cancelled bookings whose checkout has passed and whose inventory
    /// has not been released yet.
    async fn find_expired_checkouts(&self, today: NaiveDate) -> Result<Vec<Booking>>;

    /// Pending, non-cancelled bookings created at or before `cutoff`.
    async fn find_expired_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>>;

    // -- Line items --

    /// Inserts one booking line item.
    async fn insert_line_item(&self, item: &BookingRoomType) -> Result<()>;

    /// Deletes all line items of a booking, returning how many went away.
    async fn delete_line_items(&self, booking_id: BookingId) -> Result<u64>;

    /// Lists the line items of a booking.
    async fn find_line_items(&self, booking_id: BookingId) -> Result<Vec<BookingRoomType>>;
}
