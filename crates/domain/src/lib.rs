//! Domain layer for the hotel booking platform.
//!
//! Plain entities and value objects shared by the store, booking, and API
//! crates: bookings with their room-type line items, room-type inventory,
//! money, and the validated stay range that owns the date-overlap rule.

pub mod booking;
pub mod error;
pub mod money;
pub mod room_type;
pub mod stay;

pub use booking::{Booking, BookingRoomType, Guest, PaymentStatus};
pub use error::DomainError;
pub use money::{Currency, Money};
pub use room_type::RoomType;
pub use stay::StayRange;
