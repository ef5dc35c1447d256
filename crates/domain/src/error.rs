//! Domain validation errors.

use chrono::NaiveDate;
use common::RoomTypeId;
use thiserror::Error;

/// Errors raised by domain-level validation.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Check-in must be strictly before check-out.
    #[error("Invalid stay range: check-in {check_in} must be before check-out {check_out}")]
    InvalidStayRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    /// A booking request must carry at least one room-type line item.
    #[error("Booking request contains no room types")]
    EmptyRoomSelection,

    /// Requested room count must be positive.
    #[error("Requested room count for room type {0} must be greater than zero")]
    ZeroRoomCount(RoomTypeId),

    /// Requested guest count must be positive.
    #[error("Requested guest count for room type {0} must be greater than zero")]
    ZeroGuestCount(RoomTypeId),

    /// The booking total must be a positive amount.
    #[error("Booking total price must be positive")]
    NonPositiveTotal,
}
