//! Booking coordinator: the creation saga and the booking lifecycle
//! operations built on it.

use chrono::{NaiveDate, Utc};
use common::{BookingId, HotelId, RoomTypeId, UserId};
use domain::{Booking, BookingRoomType, DomainError, Guest, Money, PaymentStatus, StayRange};
use serde::{Deserialize, Serialize};
use store::BookingStore;

use crate::availability::AvailabilityChecker;
use crate::error::BookingError;
use crate::inventory::InventoryService;
use crate::payment::{ChargeStatus, CheckoutRequest, PaymentGateway};
use crate::state::BookingSagaState;
use crate::sweep::Sweeper;

/// One requested (room type, room count, guest count) entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSelection {
    pub room_type_id: RoomTypeId,
    pub num_rooms: u32,
    pub num_guests: u32,
}

/// A booking-creation request as the caller supplies it.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub hotel_id: HotelId,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    /// Processed strictly in the order given; no reordering.
    pub rooms: Vec<RoomSelection>,
    pub total_price: Money,
}

/// Per-room-type slice of a confirmed booking.
#[derive(Debug, Clone, Serialize)]
pub struct RoomTypeBreakdown {
    pub room_type_id: RoomTypeId,
    pub num_rooms: u32,
    pub num_guests: u32,
}

/// Aggregate view of what was booked.
#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    pub total_rooms: u32,
    pub total_guests: u32,
    pub nights: i64,
    pub rooms: Vec<RoomTypeBreakdown>,
}

/// Everything the caller receives after a successful saga.
#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub checkout_url: String,
    pub booking: Booking,
    pub booking_room_types: Vec<BookingRoomType>,
    pub summary: BookingSummary,
}

/// Undo action recorded for a completed saga step, executed in reverse
/// order on rollback.
#[derive(Debug)]
enum Undo {
    DeleteBooking(BookingId),
    DeleteLineItems(BookingId),
    ReleaseInventory { room_type_id: RoomTypeId, count: u32 },
}

/// Orchestrates booking creation and lifecycle operations.
///
/// Creation is a saga over independently committed statements: availability
/// checks, one checkout initiation, the booking row, its line items, and
/// one inventory decrement per line item. Steps past the rollback boundary
/// push an [`Undo`] action; any later failure unwinds the stack in
/// reverse-dependency order with best-effort compensation.
pub struct BookingCoordinator<S, P>
where
    S: BookingStore + Clone,
    P: PaymentGateway,
{
    store: S,
    availability: AvailabilityChecker<S>,
    inventory: InventoryService<S>,
    sweeper: Sweeper<S>,
    payment: P,
}

impl<S, P> BookingCoordinator<S, P>
where
    S: BookingStore + Clone,
    P: PaymentGateway,
{
    /// Creates a new coordinator over the given store and gateway.
    pub fn new(store: S, payment: P) -> Self {
        let availability = AvailabilityChecker::new(store.clone());
        let inventory = InventoryService::new(store.clone());
        let sweeper = Sweeper::new(store.clone());
        Self {
            store,
            availability,
            inventory,
            sweeper,
            payment,
        }
    }

    /// Returns the sweeper driving this coordinator's reconciliation.
    pub fn sweeper(&self) -> &Sweeper<S> {
        &self.sweeper
    }

    /// Runs the booking-creation saga.
    ///
    /// The caller either receives a full confirmation or an error with no
    /// booking left behind: failures after the booking row exists trigger
    /// compensation before the error is returned.
    #[tracing::instrument(skip(self, guest, request), fields(hotel_id = %request.hotel_id))]
    pub async fn create_booking(
        &self,
        guest: &Guest,
        request: BookingRequest,
    ) -> Result<BookingConfirmation, BookingError> {
        metrics::counter!("booking_saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();
        let mut state = BookingSagaState::CheckingAvailability;

        // Validation: no side effects on failure.
        let stay = StayRange::new(request.check_in_date, request.check_out_date)?;
        if request.rooms.is_empty() {
            return Err(DomainError::EmptyRoomSelection.into());
        }
        for selection in &request.rooms {
            if selection.num_rooms == 0 {
                return Err(DomainError::ZeroRoomCount(selection.room_type_id).into());
            }
            if selection.num_guests == 0 {
                return Err(DomainError::ZeroGuestCount(selection.room_type_id).into());
            }
        }
        if !request.total_price.is_positive() {
            return Err(DomainError::NonPositiveTotal.into());
        }
        tracing::debug!(%state, line_items = request.rooms.len(), "booking saga started");

        // Step 1: availability per line item, short-circuiting on the first
        // denial. Nothing has been written yet.
        for selection in &request.rooms {
            let result = self
                .availability
                .check(
                    selection.room_type_id,
                    stay.check_in(),
                    stay.check_out(),
                    selection.num_guests,
                    selection.num_rooms,
                )
                .await;
            if !result.available {
                tracing::info!(
                    room_type_id = %selection.room_type_id,
                    reason = result.reason.as_deref().unwrap_or("unknown"),
                    "booking denied at availability check"
                );
                return Err(BookingError::RoomTypeUnavailable {
                    room_type_id: selection.room_type_id,
                    reason: result
                        .reason
                        .unwrap_or_else(|| "Room type unavailable".to_string()),
                });
            }
        }

        // Step 2: one checkout session for the whole order. Failure still
        // aborts with no side effects.
        let total_rooms: u32 = request.rooms.iter().map(|s| s.num_rooms).sum();
        let total_guests: u32 = request.rooms.iter().map(|s| s.num_guests).sum();
        let description = format!(
            "Hotel booking: {} room(s), {} guest(s), {} night(s)",
            total_rooms,
            total_guests,
            stay.nights()
        );
        let session = self
            .payment
            .initiate_checkout(CheckoutRequest {
                amount: request.total_price,
                currency: guest.currency.clone(),
                customer_email: guest.email.clone(),
                customer_phone: guest.phone_number.clone(),
                customer_name: guest.full_name.clone(),
                description,
                subaccount: None,
            })
            .await?;
        state = BookingSagaState::PaymentInitiated;
        tracing::debug!(%state, tx_ref = %session.tx_ref, "checkout session created");

        // Step 3: the booking row. This is the rollback boundary; from here
        // on every completed step records its undo action. A failed
        // checkout session is left dangling on abort; it expires on the
        // gateway side.
        let now = Utc::now();
        let booking = Booking::pending(
            guest.user_id,
            request.hotel_id,
            stay,
            request.total_price,
            guest.currency.clone(),
            session.tx_ref.clone(),
            now,
        );
        self.store.insert_booking(&booking).await?;
        state = BookingSagaState::BookingPersisted;
        let mut undo = vec![Undo::DeleteBooking(booking.id), Undo::DeleteLineItems(booking.id)];

        // Step 4: line items, one insert at a time, in caller order.
        let mut line_items = Vec::with_capacity(request.rooms.len());
        for selection in &request.rooms {
            let item = BookingRoomType::new(
                booking.id,
                selection.room_type_id,
                selection.num_rooms,
                selection.num_guests,
            );
            if let Err(e) = self.store.insert_line_item(&item).await {
                self.roll_back(&mut state, &undo, saga_start).await;
                return Err(BookingError::LineItemPersistence {
                    room_type_id: selection.room_type_id,
                    reason: e.to_string(),
                });
            }
            line_items.push(item);
        }
        state = BookingSagaState::LineItemsPersisted;

        // Step 5: re-check (state may have moved since step 1, and our own
        // line items are excluded from the count) then reserve, per line
        // item.
        for selection in &request.rooms {
            let recheck = self
                .availability
                .check_excluding(
                    selection.room_type_id,
                    stay.check_in(),
                    stay.check_out(),
                    selection.num_guests,
                    selection.num_rooms,
                    Some(booking.id),
                )
                .await;
            if !recheck.available {
                self.roll_back(&mut state, &undo, saga_start).await;
                return Err(BookingError::RoomTypeUnavailable {
                    room_type_id: selection.room_type_id,
                    reason: recheck
                        .reason
                        .unwrap_or_else(|| "Room type unavailable".to_string()),
                });
            }

            match self
                .inventory
                .decrease(selection.room_type_id, selection.num_rooms)
                .await
            {
                Ok(true) => undo.push(Undo::ReleaseInventory {
                    room_type_id: selection.room_type_id,
                    count: selection.num_rooms,
                }),
                Ok(false) => {
                    self.roll_back(&mut state, &undo, saga_start).await;
                    return Err(BookingError::ReservationFailed {
                        room_type_id: selection.room_type_id,
                    });
                }
                Err(e) => {
                    tracing::error!(
                        room_type_id = %selection.room_type_id,
                        error = %e,
                        "inventory decrement errored"
                    );
                    self.roll_back(&mut state, &undo, saga_start).await;
                    return Err(BookingError::ReservationFailed {
                        room_type_id: selection.room_type_id,
                    });
                }
            }
        }
        state = BookingSagaState::InventoryReserved;

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("booking_saga_duration_seconds").record(duration);
        metrics::counter!("booking_saga_completed").increment(1);
        tracing::info!(booking_id = %booking.id, %state, duration, "booking saga completed");

        let summary = BookingSummary {
            total_rooms,
            total_guests,
            nights: stay.nights(),
            rooms: request
                .rooms
                .iter()
                .map(|s| RoomTypeBreakdown {
                    room_type_id: s.room_type_id,
                    num_rooms: s.num_rooms,
                    num_guests: s.num_guests,
                })
                .collect(),
        };

        Ok(BookingConfirmation {
            checkout_url: session.checkout_url,
            booking,
            booking_room_types: line_items,
            summary,
        })
    }

    /// Unwinds the undo stack in reverse order. Every compensation is
    /// best-effort: a failure is logged and the remaining steps still run,
    /// so a partial rollback can leave state for manual reconciliation.
    async fn roll_back(
        &self,
        state: &mut BookingSagaState,
        undo: &[Undo],
        saga_start: std::time::Instant,
    ) {
        *state = BookingSagaState::RollingBack;
        metrics::counter!("booking_saga_compensations_total").increment(1);

        for action in undo.iter().rev() {
            match action {
                Undo::ReleaseInventory {
                    room_type_id,
                    count,
                } => match self.inventory.increase(*room_type_id, *count).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::warn!(%room_type_id, count, "compensating inventory release found no room type");
                    }
                    Err(e) => {
                        tracing::warn!(%room_type_id, count, error = %e, "compensating inventory release failed");
                    }
                },
                Undo::DeleteLineItems(booking_id) => {
                    if let Err(e) = self.store.delete_line_items(*booking_id).await {
                        tracing::warn!(%booking_id, error = %e, "compensating line-item delete failed");
                    }
                }
                Undo::DeleteBooking(booking_id) => {
                    if let Err(e) = self.store.delete_booking(*booking_id).await {
                        tracing::warn!(%booking_id, error = %e, "compensating booking delete failed");
                    }
                }
            }
        }

        *state = BookingSagaState::Aborted;
        metrics::histogram!("booking_saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        metrics::counter!("booking_saga_failed").increment(1);
        tracing::warn!(%state, "booking saga rolled back");
    }

    /// Verifies the payment behind a booking with the gateway and moves the
    /// payment status accordingly.
    ///
    /// Idempotent: a booking already `completed` is returned unchanged
    /// without another gateway call.
    #[tracing::instrument(skip(self))]
    pub async fn verify_payment(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        let mut booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        if booking.payment_status == PaymentStatus::Completed {
            return Ok(booking);
        }

        let verification = self.payment.verify(&booking.tx_ref).await?;
        let now = Utc::now();
        match verification.status {
            ChargeStatus::Successful => {
                self.store
                    .update_payment_status(booking_id, PaymentStatus::Completed, now)
                    .await?;
                booking.payment_status = PaymentStatus::Completed;
                booking.updated_at = now;
                metrics::counter!("payments_verified_total").increment(1);
                tracing::info!(%booking_id, "payment verified");
            }
            ChargeStatus::Failed => {
                self.store
                    .update_payment_status(booking_id, PaymentStatus::Failed, now)
                    .await?;
                booking.payment_status = PaymentStatus::Failed;
                booking.updated_at = now;
                tracing::info!(%booking_id, "payment reported failed by gateway");
            }
            ChargeStatus::Pending => {}
        }

        Ok(booking)
    }

    /// Cancels a booking and hands its inventory back.
    ///
    /// Rejects an already-cancelled booking without touching inventory.
    /// Individual inventory releases that fail are logged, not fatal.
    #[tracing::instrument(skip(self, reason))]
    pub async fn cancel_booking(
        &self,
        booking_id: BookingId,
        reason: &str,
    ) -> Result<Booking, BookingError> {
        self.run_sweeps().await;

        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;
        if booking.cancelled {
            return Err(BookingError::AlreadyCancelled(booking_id));
        }

        let now = Utc::now();
        // Conditional claim: a concurrent cancel or sweep may have won since
        // the read above.
        if !self
            .store
            .claim_cancellation(booking_id, reason, None, now)
            .await?
        {
            return Err(BookingError::AlreadyCancelled(booking_id));
        }

        // Release inventory once; skipped when a sweep already freed it.
        if self.store.claim_inventory_release(booking_id, now).await? {
            let items = self.store.find_line_items(booking_id).await?;
            for item in items {
                match self.inventory.increase(item.room_type_id, item.num_rooms).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::warn!(
                            %booking_id,
                            room_type_id = %item.room_type_id,
                            "cancellation release found no room type"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            %booking_id,
                            room_type_id = %item.room_type_id,
                            error = %e,
                            "cancellation release failed"
                        );
                    }
                }
            }
        }

        metrics::counter!("bookings_cancelled_total").increment(1);
        tracing::info!(%booking_id, "booking cancelled");

        self.store
            .find_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))
    }

    /// Loads one booking and its line items, sweeping first.
    #[tracing::instrument(skip(self))]
    pub async fn get_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<(Booking, Vec<BookingRoomType>), BookingError> {
        self.run_sweeps().await;

        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;
        let items = self.store.find_line_items(booking_id).await?;
        Ok((booking, items))
    }

    /// Lists a user's bookings, running the expired-checkout sweep first.
    #[tracing::instrument(skip(self))]
    pub async fn get_user_bookings(&self, user_id: UserId) -> Result<Vec<Booking>, BookingError> {
        self.sweeper.release_expired_checkouts().await;
        Ok(self.store.find_bookings_for_user(user_id).await?)
    }

    /// Moves a booking to new stay dates, sweeping first.
    ///
    /// Dates are validated; inventory is not re-balanced (the update is a
    /// plain row update, matching the surrounding platform's behavior).
    #[tracing::instrument(skip(self))]
    pub async fn update_booking(
        &self,
        booking_id: BookingId,
        check_in_date: NaiveDate,
        check_out_date: NaiveDate,
    ) -> Result<Booking, BookingError> {
        self.run_sweeps().await;

        let stay = StayRange::new(check_in_date, check_out_date)?;
        let updated = self
            .store
            .update_stay(booking_id, stay, Utc::now())
            .await?;
        if !updated {
            return Err(BookingError::BookingNotFound(booking_id));
        }

        self.store
            .find_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))
    }

    /// Runs both sweeps; read and update paths pay this cost.
    async fn run_sweeps(&self) {
        self.sweeper.release_expired_checkouts().await;
        self.sweeper.cancel_expired_pending().await;
    }
}
