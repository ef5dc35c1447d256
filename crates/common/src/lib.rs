//! Shared identifier types used across the booking platform crates.

mod types;

pub use types::{BookingId, HotelId, LineItemId, RoomTypeId, UserId};
