//! Booking endpoints: creation, payment verification, reads, update, and
//! cancellation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use booking::{BookingConfirmation, BookingCoordinator, BookingRequest, PaymentGateway, RoomSelection};
use chrono::NaiveDate;
use common::{BookingId, HotelId, RoomTypeId, UserId};
use domain::{Booking, BookingRoomType, Money};
use serde::{Deserialize, Serialize};
use store::BookingStore;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::AuthenticatedGuest;

/// Shared application state accessible from all handlers.
pub struct AppState<S, P>
where
    S: BookingStore + Clone,
    P: PaymentGateway,
{
    pub coordinator: BookingCoordinator<S, P>,
    pub store: S,
    pub webhook_secret: String,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateBookingBody {
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[serde(rename = "roomTypes")]
    pub room_types: Vec<RoomSelectionBody>,
    /// Total in minor currency units.
    pub total_price: i64,
}

#[derive(Deserialize)]
pub struct RoomSelectionBody {
    #[serde(rename = "roomtypeId")]
    pub room_type_id: Uuid,
    pub num_rooms: u32,
    pub num_guests: u32,
}

#[derive(Deserialize)]
pub struct UpdateBookingBody {
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct CancelBookingBody {
    pub cancellation_reason: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct BookingDetailResponse {
    pub booking: Booking,
    pub booking_room_types: Vec<BookingRoomType>,
}

// -- Handlers --

/// POST /bookings/create/{hotel_id} — run the booking-creation saga.
#[tracing::instrument(skip(state, guest, body))]
pub async fn create<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(hotel_id): Path<Uuid>,
    AuthenticatedGuest(guest): AuthenticatedGuest,
    Json(body): Json<CreateBookingBody>,
) -> Result<(axum::http::StatusCode, Json<BookingConfirmation>), ApiError>
where
    S: BookingStore + Clone + Send + Sync + 'static,
    P: PaymentGateway + 'static,
{
    let request = BookingRequest {
        hotel_id: HotelId::from_uuid(hotel_id),
        check_in_date: body.check_in_date,
        check_out_date: body.check_out_date,
        rooms: body
            .room_types
            .iter()
            .map(|rt| RoomSelection {
                room_type_id: RoomTypeId::from_uuid(rt.room_type_id),
                num_rooms: rt.num_rooms,
                num_guests: rt.num_guests,
            })
            .collect(),
        total_price: Money::from_minor(body.total_price),
    };

    let confirmation = state.coordinator.create_booking(&guest, request).await?;
    Ok((axum::http::StatusCode::CREATED, Json(confirmation)))
}

/// GET /bookings/{booking_id}/verify-payment — confirm the charge with the
/// gateway and return the updated booking.
#[tracing::instrument(skip(state))]
pub async fn verify_payment<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, ApiError>
where
    S: BookingStore + Clone + Send + Sync + 'static,
    P: PaymentGateway + 'static,
{
    let booking = state
        .coordinator
        .verify_payment(BookingId::from_uuid(booking_id))
        .await?;
    Ok(Json(booking))
}

/// GET /bookings/user/{user_id} — list a user's bookings; the
/// expired-checkout sweep runs first.
#[tracing::instrument(skip(state))]
pub async fn for_user<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Booking>>, ApiError>
where
    S: BookingStore + Clone + Send + Sync + 'static,
    P: PaymentGateway + 'static,
{
    let bookings = state
        .coordinator
        .get_user_bookings(UserId::from_uuid(user_id))
        .await?;
    Ok(Json(bookings))
}

/// GET /bookings/{booking_id} — load one booking with its line items; both
/// sweeps run first.
#[tracing::instrument(skip(state))]
pub async fn get<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetailResponse>, ApiError>
where
    S: BookingStore + Clone + Send + Sync + 'static,
    P: PaymentGateway + 'static,
{
    let (booking, booking_room_types) = state
        .coordinator
        .get_booking(BookingId::from_uuid(booking_id))
        .await?;
    Ok(Json(BookingDetailResponse {
        booking,
        booking_room_types,
    }))
}

/// PATCH /bookings/{booking_id} — move the stay dates.
#[tracing::instrument(skip(state, body))]
pub async fn update<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<UpdateBookingBody>,
) -> Result<Json<Booking>, ApiError>
where
    S: BookingStore + Clone + Send + Sync + 'static,
    P: PaymentGateway + 'static,
{
    let booking = state
        .coordinator
        .update_booking(
            BookingId::from_uuid(booking_id),
            body.check_in_date,
            body.check_out_date,
        )
        .await?;
    Ok(Json(booking))
}

/// PATCH /bookings/cancel/{booking_id} — cancel and release inventory.
#[tracing::instrument(skip(state, body))]
pub async fn cancel<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<CancelBookingBody>,
) -> Result<Json<Booking>, ApiError>
where
    S: BookingStore + Clone + Send + Sync + 'static,
    P: PaymentGateway + 'static,
{
    let booking = state
        .coordinator
        .cancel_booking(BookingId::from_uuid(booking_id), &body.cancellation_reason)
        .await?;
    Ok(Json(booking))
}
