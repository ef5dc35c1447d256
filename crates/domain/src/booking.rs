//! Booking entity, line items, and the caller identity.

use chrono::{DateTime, Utc};
use common::{BookingId, HotelId, LineItemId, RoomTypeId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::{Currency, Money};
use crate::stay::StayRange;

/// Payment lifecycle of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Checkout initiated, payment not yet confirmed.
    #[default]
    Pending,

    /// The gateway confirmed the charge.
    Completed,

    /// The charge failed or the payment window expired.
    Failed,
}

impl PaymentStatus {
    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// One reservation transaction.
///
/// Created in `pending` state by the booking saga; hard-deleted only as a
/// compensating action while the saga that created it is still unwinding.
/// After the caller has been told the booking exists, lifecycle changes are
/// status mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub hotel_id: HotelId,
    #[serde(flatten)]
    pub stay: StayRange,
    pub total_price: Money,
    pub currency: Currency,
    pub payment_status: PaymentStatus,
    /// The payment gateway's transaction reference for this booking.
    pub tx_ref: String,
    pub cancelled: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    /// Set when reserved inventory has been handed back, by cancellation or
    /// by a sweep. Guards against releasing the same booking's rooms twice.
    pub inventory_released_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a pending booking carrying the gateway's transaction reference.
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        user_id: UserId,
        hotel_id: HotelId,
        stay: StayRange,
        total_price: Money,
        currency: Currency,
        tx_ref: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BookingId::new(),
            user_id,
            hotel_id,
            stay,
            total_price,
            currency,
            payment_status: PaymentStatus::Pending,
            tx_ref: tx_ref.into(),
            cancelled: false,
            cancelled_at: None,
            cancellation_reason: None,
            inventory_released_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true when inventory for this booking has already been freed.
    pub fn inventory_released(&self) -> bool {
        self.inventory_released_at.is_some()
    }
}

/// One (room type, room count, guest count) line item of a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRoomType {
    pub id: LineItemId,
    pub booking_id: BookingId,
    pub room_type_id: RoomTypeId,
    pub num_rooms: u32,
    pub num_guests: u32,
}

impl BookingRoomType {
    /// Creates a line item for a booking.
    pub fn new(booking_id: BookingId, room_type_id: RoomTypeId, num_rooms: u32, num_guests: u32) -> Self {
        Self {
            id: LineItemId::new(),
            booking_id,
            room_type_id,
            num_rooms,
            num_guests,
        }
    }
}

/// The authenticated caller placing or inspecting bookings.
///
/// Session issuance is an external concern; this is only the identity the
/// auth layer hands down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub user_id: UserId,
    pub email: String,
    pub phone_number: Option<String>,
    pub full_name: Option<String>,
    pub currency: Currency,
}
