//! Booking error types.

use common::{BookingId, RoomTypeId};
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during booking operations.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Request failed domain validation; nothing was persisted.
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),

    /// A requested room type cannot be fulfilled for the stay.
    #[error("Room type {room_type_id} unavailable: {reason}")]
    RoomTypeUnavailable {
        room_type_id: RoomTypeId,
        reason: String,
    },

    /// The payment gateway rejected or failed the request.
    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    /// A line item could not be persisted; the saga rolled back.
    #[error("Failed to persist line item for room type {room_type_id}: {reason}")]
    LineItemPersistence {
        room_type_id: RoomTypeId,
        reason: String,
    },

    /// Inventory could not be reserved for a room type; the saga rolled back.
    #[error("Failed to reserve inventory for room type {room_type_id}")]
    ReservationFailed { room_type_id: RoomTypeId },

    /// Booking not found.
    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    /// The booking is already cancelled.
    #[error("Booking {0} is already cancelled")]
    AlreadyCancelled(BookingId),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for booking results.
pub type Result<T> = std::result::Result<T, BookingError>;
